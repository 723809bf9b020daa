//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{Destination, MonitorBlueprint, SubjectProfile};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sensor: SensorInfo,
    capture: CaptureInfo,
    classify: BackendInfo,
    upload: BackendInfo,
    notify: BackendInfo,
    routes: Vec<RouteInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    backend: String,
    pin: u32,
    bounce_ms: u64,
    event_gap_secs: u64,
}

#[derive(Serialize)]
struct CaptureInfo {
    backend: String,
    output_dir: String,
    pre_delay_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    command: Vec<String>,
}

#[derive(Serialize)]
struct BackendInfo {
    enabled: bool,
    backend: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct RouteInfo {
    key: String,
    folder: String,
    folder_id: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = super::load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

/// Route key -> destination, in routing order
fn routes<'a>(blueprint: &'a MonitorBlueprint) -> Vec<(String, &'a Destination)> {
    let routing = &blueprint.routing;
    let subject = |s: &'a SubjectProfile| (format!("{} ({})", s.label, s.display_name), &s.destination);
    vec![
        ("unclassified".to_string(), &routing.default),
        subject(&routing.subject_a),
        subject(&routing.subject_b),
        (contracts::Label::UNKNOWN.to_string(), &routing.unknown),
    ]
}

/// Sorted so the output is stable; empty unless `--params`
fn params(raw: &HashMap<String, String>, show: bool) -> BTreeMap<String, String> {
    if show {
        raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    } else {
        BTreeMap::new()
    }
}

fn build_config_info(blueprint: &MonitorBlueprint, args: &InfoArgs) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sensor: SensorInfo {
            backend: format!("{:?}", blueprint.sensor.backend),
            pin: blueprint.sensor.pin,
            bounce_ms: blueprint.sensor.bounce_ms,
            event_gap_secs: blueprint.sensor.event_gap_secs,
        },
        capture: CaptureInfo {
            backend: format!("{:?}", blueprint.capture.backend),
            output_dir: blueprint.capture.output_dir.display().to_string(),
            pre_delay_ms: blueprint.capture.pre_delay_ms,
            command: if args.params {
                blueprint.capture.command.clone()
            } else {
                Vec::new()
            },
        },
        classify: BackendInfo {
            enabled: blueprint.classify.enabled,
            backend: format!("{:?}", blueprint.classify.backend),
            params: params(&blueprint.classify.params, args.params),
        },
        upload: BackendInfo {
            enabled: blueprint.upload.enabled,
            backend: format!("{:?}", blueprint.upload.backend),
            params: params(&blueprint.upload.params, args.params),
        },
        notify: BackendInfo {
            enabled: blueprint.notify.enabled,
            backend: format!("{:?}", blueprint.notify.backend),
            params: params(&blueprint.notify.params, args.params),
        },
        routes: routes(blueprint)
            .into_iter()
            .map(|(key, dest)| RouteInfo {
                key,
                folder: dest.name.clone(),
                folder_id: dest.id.clone(),
            })
            .collect(),
    }
}

fn print_backend(title: &str, enabled: bool, backend: String, params: &BTreeMap<String, String>) {
    println!("\n{title}");
    if params.is_empty() {
        println!("   └─ {backend} ({})", if enabled { "enabled" } else { "disabled" });
        return;
    }
    println!("   ├─ {backend} ({})", if enabled { "enabled" } else { "disabled" });
    for (i, (key, value)) in params.iter().enumerate() {
        let prefix = if i == params.len() - 1 { "└─" } else { "├─" };
        println!("   {prefix} {key} = {value}");
    }
}

fn print_config_info(blueprint: &MonitorBlueprint, args: &InfoArgs) {
    let info = build_config_info(blueprint, args);

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Catmon Configuration                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Reed Switch");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Backend: {}", info.sensor.backend);
    println!("   ├─ Pin: {}", info.sensor.pin);
    println!("   ├─ Bounce: {}ms", info.sensor.bounce_ms);
    println!("   └─ Event gap: {}s", info.sensor.event_gap_secs);

    println!("\nCapture");
    println!("   ├─ Backend: {}", info.capture.backend);
    println!("   ├─ Output dir: {}", info.capture.output_dir);
    if info.capture.command.is_empty() {
        println!("   └─ Pre-delay: {}ms", info.capture.pre_delay_ms);
    } else {
        println!("   ├─ Pre-delay: {}ms", info.capture.pre_delay_ms);
        println!("   └─ Command: {}", info.capture.command.join(" "));
    }

    print_backend("Classify", info.classify.enabled, info.classify.backend, &info.classify.params);
    print_backend("Upload", info.upload.enabled, info.upload.backend, &info.upload.params);
    print_backend("Notify", info.notify.enabled, info.notify.backend, &info.notify.params);

    println!("\nRoutes ({})", info.routes.len());
    for (i, route) in info.routes.iter().enumerate() {
        let prefix = if i == info.routes.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} -> {} [{}]",
            prefix, route.key, route.folder, route.folder_id
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn blueprint() -> MonitorBlueprint {
        config_loader::ConfigLoader::load_from_str(
            include_str!("../../../../catmon.example.toml"),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    fn args(params: bool) -> InfoArgs {
        InfoArgs {
            config: PathBuf::from("catmon.toml"),
            json: true,
            params,
        }
    }

    #[test]
    fn test_routes_cover_every_key() {
        let info = build_config_info(&blueprint(), &args(false));
        let folders: Vec<_> = info.routes.iter().map(|r| r.folder.as_str()).collect();
        assert_eq!(
            folders,
            ["catmon", "catmon_boo", "catmon_simba", "catmon_unknown"]
        );
        assert_eq!(info.routes[3].key, "unknown");
    }

    #[test]
    fn test_params_hidden_by_default() {
        let hidden = build_config_info(&blueprint(), &args(false));
        assert!(hidden.upload.params.is_empty());
        assert!(hidden.capture.command.is_empty());

        let shown = build_config_info(&blueprint(), &args(true));
        assert_eq!(
            shown.upload.params.get("root").map(String::as_str),
            Some("./uploads")
        );
        assert_eq!(shown.capture.command[0], "rpicam-still");
    }
}
