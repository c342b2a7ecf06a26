use pedigree_layout::{LayoutConfig, layout_pedigree_json};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PedigreeLayoutOptions {
    seed_buckets: Option<usize>,
    iterations: Option<usize>,
    person_width: Option<f64>,
    person_separation: Option<f64>,
}

fn build_layout_config(options: PedigreeLayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(buckets) = options.seed_buckets {
        config.ordering.seed_buckets = buckets;
    }
    if let Some(iterations) = options.iterations {
        config.ordering.iterations = iterations;
    }
    if let Some(width) = options.person_width {
        config.person_width = width;
    }
    if let Some(separation) = options.person_separation {
        config.person_separation = separation;
    }
    config
}

#[wasm_bindgen]
pub fn layout_pedigree(nodes_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<PedigreeLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        PedigreeLayoutOptions::default()
    };

    let config = build_layout_config(options);
    layout_pedigree_json(nodes_json, &config).map_err(|error| JsValue::from_str(&format!("{error:#}")))
}
