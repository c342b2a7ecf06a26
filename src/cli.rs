use crate::config::load_config;
use crate::editor::PedigreeEditor;
use crate::input::{build_graph, parse_descriptors};
use crate::layout_dump::{print_layout_dump, write_layout_dump};
use crate::snapshot::{read_snapshot, write_snapshot};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "pedlay", version, about = "Layered layout for pedigree graphs")]
pub struct Args {
    /// Input file with node descriptors (JSON) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Override the number of ordering seed buckets
    #[arg(long = "seed-buckets")]
    pub seed_buckets: Option<usize>,

    /// Override the number of ordering refinement iterations
    #[arg(long = "iterations")]
    pub iterations: Option<usize>,

    /// Also write a snapshot of the layout state here
    #[arg(long = "snapshot")]
    pub snapshot: Option<PathBuf>,

    /// Start from a snapshot instead of node descriptors
    #[arg(long = "restore", conflicts_with = "input")]
    pub restore: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(buckets) = args.seed_buckets {
        config.ordering.seed_buckets = buckets;
    }
    if let Some(iterations) = args.iterations {
        config.ordering.iterations = iterations;
    }
    config.validate()?;

    let editor = match args.restore.as_deref() {
        Some(path) => {
            let snapshot = read_snapshot(path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            info!(path = %path.display(), "restoring snapshot");
            PedigreeEditor::from_snapshot(snapshot, config)?
        }
        None => {
            let input = read_input(args.input.as_deref())?;
            let descriptors = parse_descriptors(&input).context("Failed to parse node descriptors")?;
            let graph = build_graph(&descriptors, &config)?;
            PedigreeEditor::new(&graph, config)?
        }
    };

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, editor.state(), editor.config())?,
        None => print_layout_dump(editor.state(), editor.config())?,
    }
    if let Some(path) = args.snapshot.as_deref() {
        write_snapshot(path, &editor.snapshot())?;
    }
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(env_filter)
        .init();
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let mut buf = String::new();
    match path {
        None => {
            io::stdin().read_to_string(&mut buf)?;
        }
        Some(path) if path == Path::new("-") => {
            io::stdin().read_to_string(&mut buf)?;
        }
        Some(path) => {
            buf = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
    }
    Ok(buf)
}
