use anyhow::Context;
use clap::{ArgAction, Parser};
use rss_aggregator::{AggregatorConfig, RssAggregator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};

/// Merge the configured feeds into rss.xml, atom.xml and feed.json
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file; the built-in source list is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the three output documents are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("rss-aggregator v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Outputs are only written at the very end, so the previous run's files are intact.
            error!("Aggregation failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => AggregatorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AggregatorConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.set_output_dir(dir);
    }

    let aggregator = RssAggregator::new(config).context("building HTTP client")?;
    let written = aggregator.run().await?;

    for path in written {
        info!("Wrote {}", path.display());
    }
    info!("RSS aggregated.");
    Ok(())
}
