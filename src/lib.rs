#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod editor;
pub mod input;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod snapshot;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::LayoutConfig;
pub use editor::{EditOutcome, PedigreeEditor};
pub use layout::{LayoutError, LayoutResult, LayoutState, PedigreeLayout, compute_layout};

/// Parses node descriptors, lays them out and returns the layout dump as JSON.
pub fn layout_pedigree_json(input: &str, config: &LayoutConfig) -> anyhow::Result<String> {
    let descriptors = input::parse_descriptors(input)?;
    let graph = input::build_graph(&descriptors, config)?;
    let state = compute_layout(&graph, config)?;
    let dump = layout_dump::LayoutDump::from_state(&state, config);
    Ok(serde_json::to_string(&dump)?)
}
