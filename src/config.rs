use crate::layout::error::{ConfigError, LayoutResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed buckets are permuted exhaustively, so the count is capped hard.
pub const MAX_SEED_BUCKETS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    pub seed_buckets: usize,
    pub seed_transpose_sweeps: usize,
    pub iterations: usize,
    pub stall_limit: usize,
    pub long_edge_max_chain: usize,
    pub long_edge_window: i64,
    pub long_edge_pieces: usize,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            seed_buckets: 5,
            seed_transpose_sweeps: 4,
            iterations: 24,
            stall_limit: 6,
            long_edge_max_chain: 10,
            long_edge_window: 4,
            long_edge_pieces: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XCoordConfig {
    pub iterations: usize,
    pub base_importance: f64,
    pub relationship_importance: f64,
    pub child_hub_importance: f64,
    pub virtual_importance: f64,
}

impl Default for XCoordConfig {
    fn default() -> Self {
        Self {
            iterations: 12,
            base_importance: 1.0,
            relationship_importance: 4.0,
            child_hub_importance: 12.0,
            virtual_importance: 16.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub person_width: f64,
    pub relationship_width: f64,
    pub child_hub_width: f64,
    pub virtual_width: f64,
    pub person_separation: f64,
    pub relationship_separation: f64,
    pub virtual_separation: f64,
    pub vertical_level_step: f64,
    pub domino_iteration_cap: usize,
    pub ordering: OrderingConfig,
    pub xcoord: XCoordConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            person_width: 80.0,
            relationship_width: 20.0,
            child_hub_width: 20.0,
            virtual_width: 2.0,
            person_separation: 40.0,
            relationship_separation: 20.0,
            virtual_separation: 10.0,
            vertical_level_step: 10.0,
            domino_iteration_cap: 10_000,
            ordering: OrderingConfig::default(),
            xcoord: XCoordConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Rejects settings that would make the layout intractable or meaningless.
    pub fn validate(&self) -> LayoutResult<()> {
        let buckets = self.ordering.seed_buckets;
        if buckets == 0 {
            return Err(ConfigError::NoSeedBuckets.into());
        }
        if buckets > MAX_SEED_BUCKETS {
            return Err(ConfigError::TooManySeedBuckets {
                requested: buckets,
                max: MAX_SEED_BUCKETS,
            }
            .into());
        }
        for (field, value) in [
            ("personWidth", self.person_width),
            ("relationshipWidth", self.relationship_width),
            ("childHubWidth", self.child_hub_width),
            ("virtualWidth", self.virtual_width),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value }.into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderingConfigFile {
    seed_buckets: Option<usize>,
    seed_transpose_sweeps: Option<usize>,
    iterations: Option<usize>,
    stall_limit: Option<usize>,
    long_edge_max_chain: Option<usize>,
    long_edge_window: Option<i64>,
    long_edge_pieces: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct XCoordConfigFile {
    iterations: Option<usize>,
    base_importance: Option<f64>,
    relationship_importance: Option<f64>,
    child_hub_importance: Option<f64>,
    virtual_importance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    person_width: Option<f64>,
    relationship_width: Option<f64>,
    child_hub_width: Option<f64>,
    virtual_width: Option<f64>,
    person_separation: Option<f64>,
    relationship_separation: Option<f64>,
    virtual_separation: Option<f64>,
    vertical_level_step: Option<f64>,
    domino_iteration_cap: Option<usize>,
    ordering: Option<OrderingConfigFile>,
    #[serde(alias = "xCoordinates")]
    xcoord: Option<XCoordConfigFile>,
}

fn apply<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Parses a JSON config document on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<LayoutConfig> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let mut config = LayoutConfig::default();

    apply(&mut config.person_width, parsed.person_width);
    apply(&mut config.relationship_width, parsed.relationship_width);
    apply(&mut config.child_hub_width, parsed.child_hub_width);
    apply(&mut config.virtual_width, parsed.virtual_width);
    apply(&mut config.person_separation, parsed.person_separation);
    apply(&mut config.relationship_separation, parsed.relationship_separation);
    apply(&mut config.virtual_separation, parsed.virtual_separation);
    apply(&mut config.vertical_level_step, parsed.vertical_level_step);
    apply(&mut config.domino_iteration_cap, parsed.domino_iteration_cap);

    if let Some(ordering) = parsed.ordering {
        let target = &mut config.ordering;
        apply(&mut target.seed_buckets, ordering.seed_buckets);
        apply(&mut target.seed_transpose_sweeps, ordering.seed_transpose_sweeps);
        apply(&mut target.iterations, ordering.iterations);
        apply(&mut target.stall_limit, ordering.stall_limit);
        apply(&mut target.long_edge_max_chain, ordering.long_edge_max_chain);
        apply(&mut target.long_edge_window, ordering.long_edge_window);
        apply(&mut target.long_edge_pieces, ordering.long_edge_pieces);
    }

    if let Some(xcoord) = parsed.xcoord {
        let target = &mut config.xcoord;
        apply(&mut target.iterations, xcoord.iterations);
        apply(&mut target.base_importance, xcoord.base_importance);
        apply(&mut target.relationship_importance, xcoord.relationship_importance);
        apply(&mut target.child_hub_importance, xcoord.child_hub_importance);
        apply(&mut target.virtual_importance, xcoord.virtual_importance);
    }

    config.validate()?;
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
