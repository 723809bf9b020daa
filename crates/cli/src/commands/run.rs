//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use devices::{Camera, DisconnectedSensor, Model, Sensor, SimulationOverride};
use event_gate::EventGate;
use pipeline::{
    CaptureStage, ClassifyStage, Monitor, PipelineOrchestrator, PublishStage, RoutingPolicy,
};
use publisher::{Notifier, Uploader};
use tracing::{info, warn};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_monitor(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = super::load_blueprint(&args.config)?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        pin = blueprint.sensor.pin,
        capture = ?blueprint.capture.backend,
        classify = blueprint.classify.enabled,
        upload = blueprint.upload.enabled,
        notify = blueprint.notify.enabled,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let simulation = blueprint.to_simulation_config();

    let uploader = if blueprint.upload.enabled {
        Some(Uploader::from_settings(&blueprint.upload).context("Failed to create uploader")?)
    } else {
        None
    };
    let notifier = if blueprint.notify.enabled {
        Some(Notifier::from_settings(&blueprint.notify).context("Failed to create notifier")?)
    } else {
        None
    };
    let classifier = blueprint
        .classify
        .enabled
        .then(|| Model::from_settings(&blueprint.classify));

    let capture = CaptureStage::new(
        Camera::from_settings(&blueprint.capture),
        &blueprint.capture,
        SimulationOverride::new(simulation, &blueprint.simulation, &blueprint.capture.output_dir),
    );
    let orchestrator = PipelineOrchestrator::new(
        capture,
        ClassifyStage::new(classifier),
        RoutingPolicy::new(blueprint.routing.clone()),
        PublishStage::new(uploader, notifier),
    );

    // Opened last: everything above can fail without leaving the pin exported
    let sensor = if simulation.no_sensor {
        Sensor::Disconnected(DisconnectedSensor::new(blueprint.sensor.pin))
    } else {
        Sensor::from_settings(&blueprint.sensor)
            .await
            .context("Failed to open sensor")?
    };
    let gate = EventGate::new(sensor, blueprint.to_gate_config(), simulation);

    let max_events = (args.max_events != 0).then_some(args.max_events);

    info!("Starting monitor...");
    let stats = Monitor::new(gate, orchestrator)
        .with_max_events(max_events)
        .run(shutdown_signal())
        .await
        .context("Monitor stopped on sensor failure")?;

    info!(
        events = stats.events,
        runs_failed = stats.runs_failed,
        duration_secs = stats.duration.as_secs_f64(),
        "Monitor finished"
    );
    stats.print_summary();
    Ok(())
}

/// Fold command-line switches into the loaded configuration
fn apply_overrides(blueprint: &mut MonitorBlueprint, args: &RunArgs) {
    let simulation = &mut blueprint.simulation;
    if args.no_sensor {
        info!("Sensor wait disabled from CLI");
        simulation.no_sensor = true;
    }
    if args.simulate_capture {
        info!("Simulated capture enabled from CLI");
        simulation.simulate_capture = true;
    }
    if let Some(ref pattern) = args.substitute_pattern {
        info!(pattern = %pattern, "Overriding substitute pattern from CLI");
        simulation.substitute_pattern = pattern.clone();
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping monitor...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &MonitorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Sensor:");
    println!("  Backend: {:?}", blueprint.sensor.backend);
    println!("  Pin: {}", blueprint.sensor.pin);
    println!(
        "  Bounce: {}ms, event gap: {}s",
        blueprint.sensor.bounce_ms, blueprint.sensor.event_gap_secs
    );

    println!("\nCapture:");
    println!("  Backend: {:?}", blueprint.capture.backend);
    println!("  Output dir: {}", blueprint.capture.output_dir.display());
    println!("  Pre-delay: {}ms", blueprint.capture.pre_delay_ms);

    println!("\nStages:");
    println!("  Classify: {}", on_off(blueprint.classify.enabled));
    println!(
        "  Upload: {} ({:?})",
        on_off(blueprint.upload.enabled),
        blueprint.upload.backend
    );
    println!(
        "  Notify: {} ({:?})",
        on_off(blueprint.notify.enabled),
        blueprint.notify.backend
    );

    let simulation = &blueprint.simulation;
    if simulation.no_sensor || simulation.simulate_capture {
        println!("\nSimulation:");
        println!("  No sensor: {}", simulation.no_sensor);
        println!("  Simulate capture: {}", simulation.simulate_capture);
        println!("  Substitute pattern: {}", simulation.substitute_pattern);
    }

    println!();
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
