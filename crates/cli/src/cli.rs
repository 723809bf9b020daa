//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// catmon - cat flap monitor
#[derive(Parser, Debug)]
#[command(
    name = "catmon",
    author,
    version,
    about = "Cat flap monitor: reed switch -> camera -> classifier -> upload + notification",
    long_about = "Watches the reed switch on the cat flap and, for each admitted event,\n\
                  captures an image, classifies the cat, uploads the image to the\n\
                  cat's folder and posts a notification about it."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CATMON_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CATMON_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Also write a daily rolling log file into this directory
    #[arg(long, global = true, env = "CATMON_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level used when `RUST_LOG` is unset
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Preview the routing decision for a classification
    Route(RouteArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "catmon.toml", env = "CATMON_CONFIG")]
    pub config: PathBuf,

    /// Skip the sensor wait: run the pipeline once, then exit
    #[arg(long, env = "CATMON_NO_SENSOR")]
    pub no_sensor: bool,

    /// Use a substitute image instead of the camera
    #[arg(long, env = "CATMON_SIMULATE_CAPTURE")]
    pub simulate_capture: bool,

    /// Override the substitute image pattern
    #[arg(long, env = "CATMON_SUBSTITUTE_PATTERN")]
    pub substitute_pattern: Option<String>,

    /// Stop after this many admitted events (0 = unlimited)
    #[arg(long, default_value = "0", env = "CATMON_MAX_EVENTS")]
    pub max_events: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CATMON_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running the monitor
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "catmon.toml", env = "CATMON_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "catmon.toml", env = "CATMON_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show backend parameters
    #[arg(long)]
    pub params: bool,
}

/// Arguments for the `route` command
#[derive(Parser, Debug)]
pub struct RouteArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "catmon.toml", env = "CATMON_CONFIG")]
    pub config: PathBuf,

    /// Classifier label (omit to preview an unclassified run)
    #[arg(long)]
    pub label: Option<String>,

    /// Classifier confidence, 0.0 - 1.0
    #[arg(long, default_value = "1.0")]
    pub confidence: f64,

    /// Model identifier
    #[arg(long, default_value = "mock")]
    pub model: String,

    /// Event time, "YYYY-MM-DD HH:MM" local time (default: now)
    #[arg(long)]
    pub at: Option<String>,

    /// Image identifier used in the text
    #[arg(long, default_value = "preview.jpg")]
    pub image: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
