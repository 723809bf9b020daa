//! # Observability
//!
//! Tracing + Prometheus metrics for the catmon process.
//!
//! ## Features
//!
//! - Tracing initialisation (JSON / Pretty / Compact on stderr)
//! - Optional daily rolling log file
//! - Prometheus metrics exporter
//! - Per-stage and per-run metric helpers
//!
//! ## Example
//!
//! ```ignore
//! let _guard = observability::init_with_config(ObservabilityConfig {
//!     log_dir: Some("./logs".into()),
//!     ..Default::default()
//! })?;
//! observability::metrics::record_event_admitted();
//! ```

pub mod metrics;

use std::path::PathBuf;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{RunningStats, StatsSummary};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format of the stderr stream
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Default log level when `RUST_LOG` is unset
    pub default_log_level: String,
    /// Directory of the rolling log file (None = no file)
    pub log_dir: Option<PathBuf>,
    /// File name prefix of the rolling log file
    pub log_file_prefix: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: None,
            default_log_level: "info".to_string(),
            log_dir: None,
            log_file_prefix: "catmon.log".to_string(),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human readable, multi-line
    #[default]
    Pretty,
    /// Compact single line
    Compact,
}

/// Keeps the rolling file writer alive; drop it only at process exit
#[must_use = "dropping the guard stops the log file writer"]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Initialise with the default configuration
pub fn init() -> Result<ObservabilityGuard> {
    init_with_config(ObservabilityConfig::default())
}

/// Initialise with a custom configuration
pub fn init_with_config(config: ObservabilityConfig) -> Result<ObservabilityGuard> {
    // 1. Optional rolling file, always plain text
    let mut file_guard = None;
    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &config.log_file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    // 2. Tracing on stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty().with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer().compact().with_writer(std::io::stderr);

            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(fmt_layer)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    // 3. Prometheus exporter (if enabled)
    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        log_dir = ?config.log_dir,
        "Observability initialized"
    );

    Ok(ObservabilityGuard { _file: file_guard })
}

/// Install only the Prometheus recorder (tracing set up elsewhere)
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "info");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_init_creates_log_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let guard = init_with_config(ObservabilityConfig {
            log_format: LogFormat::Compact,
            log_dir: Some(log_dir.clone()),
            ..Default::default()
        });
        // A global subscriber may already be installed by another test
        if let Ok(guard) = guard {
            tracing::info!("written to file");
            drop(guard);
        }
        assert!(log_dir.is_dir());
    }
}
