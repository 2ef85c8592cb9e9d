//! Trustline — entry point.
//!
//! Replays the getting-started walkthrough against an in-process ledger,
//! with configuration from a TOML file or defaults.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use trustline_cli::{scenario, ScenarioConfig};

/// Trustline walkthrough runner
#[derive(Parser, Debug)]
#[command(name = "trustline", version, about = "Trustline getting-started walkthrough")]
struct Args {
    /// Path to the scenario file (TOML).
    #[arg(short, long, default_value = "trustline.toml")]
    config: PathBuf,

    /// Override the pool name.
    #[arg(long)]
    pool: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Override the log format (text, json).
    #[arg(long)]
    log_format: Option<String>,

    /// Generate a default scenario file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration and apply CLI overrides
    let mut config = ScenarioConfig::load(&args.config)?;
    if let Some(pool) = args.pool {
        config.pool.name = pool;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    init_tracing(&config.logging.level, &config.logging.format);

    if args.init {
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote scenario config");
        return Ok(());
    }

    tracing::info!("Trustline v{}", env!("CARGO_PKG_VERSION"));

    let report = scenario::run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
