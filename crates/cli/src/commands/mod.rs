//! Command implementations.

mod info;
mod route;
mod run;
mod validate;

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use std::path::Path;

use crate::error::CliError;

pub use info::run_info;
pub use route::run_route;
pub use run::run_monitor;
pub use validate::run_validate;

/// Load a configuration file, failing early if it does not exist
fn load_blueprint(path: &Path) -> Result<MonitorBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
