use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use inspector_bridge::{Bridge, BridgeConfig, PageSnapshot};
use tracing::info;
use tracing::level_filters::LevelFilter;

/// Serve the remote debugging protocol over stdio for a page snapshot.
#[derive(Debug, Parser)]
#[command(name = "inspector-bridge", version)]
struct Cli {
    /// Page snapshot (JSON) standing in for a live engine.
    #[arg(long)]
    snapshot: PathBuf,
    /// Bridge configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log at debug level.
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("inspector-bridge error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        config.log_level
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting inspector-bridge");
    let text = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("reading {}", cli.snapshot.display()))?;
    let snapshot: PageSnapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", cli.snapshot.display()))?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let (page, script) = snapshot.into_hosts(Some(tx.clone()));
    let mut bridge = Bridge::new(page, script, config);
    bridge.run_stdio(rx, tx)?;
    Ok(())
}
