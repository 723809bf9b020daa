//! # catmon CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - configuration loading and validation
//! - the monitor loop with graceful shutdown
//! - routing previews

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_monitor, run_route, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let metrics_port = match &cli.command {
        Commands::Run(args) if args.metrics_port != 0 => Some(args.metrics_port),
        _ => None,
    };
    let _guard = observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: cli.default_log_level().to_string(),
        log_dir: cli.log_dir.clone(),
        ..ObservabilityConfig::default()
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "catmon starting");

    let result = match &cli.command {
        Commands::Run(args) => run_monitor(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Route(args) => run_route(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
