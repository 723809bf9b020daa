//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CaptureBackend, MonitorBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    pin: u32,
    capture_backend: String,
    classify: bool,
    upload: bool,
    notify: bool,
    subjects: [String; 2],
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &MonitorBlueprint) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        pin: blueprint.sensor.pin,
        capture_backend: format!("{:?}", blueprint.capture.backend),
        classify: blueprint.classify.enabled,
        upload: blueprint.upload.enabled,
        notify: blueprint.notify.enabled,
        subjects: [
            blueprint.routing.subject_a.label.clone(),
            blueprint.routing.subject_b.label.clone(),
        ],
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MonitorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.upload.enabled && !blueprint.notify.enabled {
        warnings.push("Upload and notify are both disabled - nothing is published".to_string());
    }

    if !blueprint.classify.enabled {
        warnings.push(format!(
            "Classification disabled - every image goes to '{}'",
            blueprint.routing.default.name
        ));
    }

    if blueprint.capture.backend == CaptureBackend::Mock && !blueprint.simulation.simulate_capture {
        warnings.push("capture.backend is mock - images are synthetic".to_string());
    }

    if blueprint.simulation.no_sensor {
        warnings.push("simulation.no_sensor is set - the monitor runs once and exits".to_string());
    }

    if blueprint.sensor.bounce_ms == 0 {
        warnings.push("sensor.bounce_ms is 0 - switch bounce is not filtered".to_string());
    }

    if !blueprint.capture.output_dir.is_dir() {
        warnings.push(format!(
            "capture.output_dir '{}' does not exist yet",
            blueprint.capture.output_dir.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Reed switch pin: {}", summary.pin);
            println!("  Capture: {}", summary.capture_backend);
            println!("  Classify: {}", summary.classify);
            println!("  Upload: {}", summary.upload);
            println!("  Notify: {}", summary.notify);
            println!("  Subjects: {}, {}", summary.subjects[0], summary.subjects[1]);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const EXAMPLE: &str = include_str!("../../../../catmon.example.toml");

    #[test]
    fn test_missing_file_is_invalid() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/catmon.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catmon.toml");
        std::fs::write(&path, EXAMPLE).unwrap();

        let result = validate_config(&ValidateArgs {
            config: path,
            json: true,
        });
        assert!(result.valid, "{:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.pin, 23);
        assert_eq!(summary.subjects, ["boo".to_string(), "simba".to_string()]);
    }

    #[test]
    fn test_warnings_for_quiet_pipeline() {
        let mut bp =
            config_loader::ConfigLoader::load_from_str(EXAMPLE, config_loader::ConfigFormat::Toml)
                .unwrap();
        bp.upload.enabled = false;
        bp.notify.enabled = false;
        bp.classify.enabled = false;

        let warnings = collect_warnings(&bp);
        assert!(warnings.iter().any(|w| w.contains("nothing is published")));
        assert!(warnings.iter().any(|w| w.contains("'catmon'")));
    }
}
