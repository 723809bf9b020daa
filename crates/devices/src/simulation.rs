//! SimulationOverride - substitute behaviour for hardware-free runs
//!
//! Consulted by the gate (skip the sensor wait) and by the capture stage
//! (supply a stand-in image picked uniformly at random from a pattern).

use std::path::{Path, PathBuf};

use contracts::{
    AcquisitionMetadata, CapturedImage, CatmonError, ImageId, SimulationConfig, SimulationSettings,
};
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

/// Substitute image provider plus the immutable simulation switches
#[derive(Debug, Clone)]
pub struct SimulationOverride {
    config: SimulationConfig,
    default_pattern: String,
    /// Directory substitutes are materialized into; `None` uses them in place
    copy_to: Option<PathBuf>,
    test_prefix: String,
}

impl SimulationOverride {
    pub fn new(
        config: SimulationConfig,
        settings: &SimulationSettings,
        local_dir: impl Into<PathBuf>,
    ) -> Self {
        let copy_to = settings.copy_to_local.then(|| local_dir.into());
        info!(
            no_sensor = config.no_sensor,
            simulate_capture = config.simulate_capture,
            is_testing = config.is_testing(),
            "simulation override initialised"
        );
        Self {
            config,
            default_pattern: settings.substitute_pattern.clone(),
            copy_to,
            test_prefix: settings.test_file_prefix.clone(),
        }
    }

    /// No simulation: every query answers "use the real thing"
    pub fn disabled() -> Self {
        Self::new(
            SimulationConfig::default(),
            &SimulationSettings::default(),
            ".",
        )
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    pub fn should_bypass_sensor(&self) -> bool {
        self.config.no_sensor
    }

    pub fn should_simulate_capture(&self) -> bool {
        self.config.simulate_capture
    }

    pub fn is_testing(&self) -> bool {
        self.config.is_testing()
    }

    /// Prefix for every file generated while testing
    pub fn test_prefix(&self) -> &str {
        &self.test_prefix
    }

    pub fn default_pattern(&self) -> &str {
        &self.default_pattern
    }

    /// Pick a substitute image matching `pattern` (default pattern if `None`)
    ///
    /// Returns `Ok(None)` when nothing matches; the caller decides whether
    /// that is fatal.
    ///
    /// # Errors
    /// - `ConfigValidation` for a malformed pattern
    /// - `Io` if the chosen image cannot be materialized
    pub fn get_substitute_image(
        &self,
        pattern: Option<&str>,
    ) -> Result<Option<CapturedImage>, CatmonError> {
        let pattern = pattern
            .filter(|p| !p.is_empty())
            .unwrap_or(self.default_pattern.as_str());

        let candidates = matching_files(pattern)?;
        let Some(choice) = candidates.choose(&mut rand::rng()) else {
            debug!(pattern, "no substitute image found");
            return Ok(None);
        };
        debug!(pattern, choice = %choice.display(), candidates = candidates.len(), "substitute chosen");

        let path = match &self.copy_to {
            Some(dir) => self.materialize(choice, dir)?,
            None => choice.clone(),
        };

        let id = path
            .file_name()
            .map(|n| ImageId::from(n.to_string_lossy().into_owned()))
            .unwrap_or_default();
        let metadata = AcquisitionMetadata {
            mean_luma: mean_luma(&path),
            ..AcquisitionMetadata::default()
        };
        Ok(Some(CapturedImage { id, path, metadata }))
    }

    /// Copy `source` into `dir` under the test prefix unless already there
    ///
    /// Calling this twice for the same source is a no-op the second time.
    pub fn materialize(&self, source: &Path, dir: &Path) -> Result<PathBuf, CatmonError> {
        let base = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = dir.join(format!("{}{base}", self.test_prefix));

        if target.exists() {
            debug!(target = %target.display(), "substitute already materialized");
            return Ok(target);
        }
        std::fs::create_dir_all(dir)?;
        std::fs::copy(source, &target)?;
        debug!(source = %source.display(), target = %target.display(), "substitute copied");
        Ok(target)
    }
}

fn matching_files(pattern: &str) -> Result<Vec<PathBuf>, CatmonError> {
    let paths = glob::glob(pattern).map_err(|e| {
        CatmonError::config_validation("simulation.substitute_pattern", e.to_string())
    })?;
    Ok(paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "unreadable substitute candidate skipped");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect())
}

/// Mean luma (0-255) of an image file, `None` if it cannot be decoded
pub fn mean_luma(path: &Path) -> Option<f64> {
    let img = image::open(path).ok()?.to_luma8();
    let count = u64::from(img.width()) * u64::from(img.height());
    if count == 0 {
        return None;
    }
    let total: u64 = img.pixels().map(|p| u64::from(p.0[0])).sum();
    Some(total as f64 / count as f64)
}
