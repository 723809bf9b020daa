//! # Integration Tests
//!
//! End-to-end runs of the monitor against scripted sensors and mock
//! devices, configured through the same TOML path as the binary.
//!
//! Covers:
//! - configuration to backend wiring
//! - the event gate in front of the orchestrator
//! - routing and publishing per label
//! - simulation switches

#[cfg(test)]
mod config_tests {
    #[test]
    fn test_example_config_loads() {
        let bp = config_loader::ConfigLoader::load_from_str(
            include_str!("../../../catmon.example.toml"),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(bp.version, contracts::ConfigVersion::V1);
        assert_eq!(bp.routing.subject_a.label, "boo");
        assert_eq!(bp.routing.subject_b.label, "simba");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use chrono::{DateTime, Local, TimeZone};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ErrorKind, MonitorBlueprint, Stage};
    use devices::{Camera, DisconnectedSensor, Model, ScriptedSensor, SimulationOverride};
    use event_gate::EventGate;
    use pipeline::{
        CaptureStage, ClassifyStage, Monitor, MonitorStats, PipelineOrchestrator, PublishStage,
        RoutingPolicy,
    };
    use publisher::{NotificationRecord, RecordingNotifier, Uploader};
    use tempfile::TempDir;

    type Orchestrator = PipelineOrchestrator<Camera, Model, Uploader, RecordingNotifier>;

    /// Mock camera, folder uploads under `dir`, classifier section as given
    fn blueprint(dir: &Path, classify: &str, simulation: &str) -> MonitorBlueprint {
        let content = format!(
            r#"
[sensor]
backend = "disconnected"
bounce_ms = 1
event_gap_secs = 5

[capture]
backend = "mock"
output_dir = '{out}'
pre_delay_ms = 0

[classify]
{classify}

[routing]
notification_tag = "Auto-tweet from catmon2:"
classifier_name = "Catmonic"
unknown_salutation = "cat of mystery!"
default = {{ name = "catmon", id = "folder-default" }}
unknown = {{ name = "catmon_unknown", id = "folder-unknown" }}

[routing.subject_a]
label = "boo"
display_name = "Boo"
salutation = "Boo, aka Fluff Bag!"
destination = {{ name = "catmon_boo", id = "folder-boo" }}

[routing.subject_b]
label = "simba"
display_name = "Simba"
salutation = "Simba, aka Mr Handsome!"
destination = {{ name = "catmon_simba", id = "folder-simba" }}

[upload]
backend = "folder"
params = {{ root = '{uploads}' }}

[simulation]
{simulation}
"#,
            out = dir.join("captures").display(),
            uploads = dir.join("uploads").display(),
        );
        ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap()
    }

    /// Orchestrator assembled the way the binary does it, with a recording
    /// notifier so the texts can be inspected
    fn orchestrator(bp: &MonitorBlueprint) -> (Orchestrator, NotificationRecord) {
        std::fs::create_dir_all(&bp.capture.output_dir).unwrap();
        let notifier = RecordingNotifier::new(bp.notify.account_name.clone());
        let record = notifier.record();
        let orchestrator = PipelineOrchestrator::new(
            CaptureStage::new(
                Camera::from_settings(&bp.capture),
                &bp.capture,
                SimulationOverride::new(
                    bp.to_simulation_config(),
                    &bp.simulation,
                    &bp.capture.output_dir,
                ),
            ),
            ClassifyStage::new(bp.classify.enabled.then(|| Model::from_settings(&bp.classify))),
            RoutingPolicy::new(bp.routing.clone()),
            PublishStage::new(Some(Uploader::from_settings(&bp.upload).unwrap()), Some(notifier)),
        );
        (orchestrator, record)
    }

    async fn run_scripted(
        bp: &MonitorBlueprint,
        start: DateTime<Local>,
        offsets: &[i64],
    ) -> (MonitorStats, NotificationRecord) {
        let (orch, record) = orchestrator(bp);
        let sensor = ScriptedSensor::from_offsets(bp.sensor.pin, start, offsets);
        let gate = EventGate::new(sensor, bp.to_gate_config(), bp.to_simulation_config());
        let stats = Monitor::new(gate, orch)
            .run(std::future::pending())
            .await
            .unwrap();
        (stats, record)
    }

    fn uploaded(dir: &Path, folder_id: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.join("uploads").join(folder_id))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2023, 10, 14, hour, min, sec)
            .single()
            .unwrap()
    }

    /// Flap swings 0s, 3s and 6s apart with a 5s event gap: the middle one
    /// is dropped, the gap is measured from the last admitted event
    #[tokio::test]
    async fn test_event_gap_filters_close_swings() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(dir.path(), "enabled = false", "");

        let (stats, record) = run_scripted(&bp, at(18, 15, 0), &[0, 3, 6]).await;

        assert_eq!(stats.events, 2);
        assert_eq!(stats.runs_succeeded, 2);
        assert_eq!(stats.gate.transitions, 3);
        assert_eq!(stats.gate.gap_drops, 1);
        assert_eq!(stats.gate.admitted, 2);
        assert_eq!(
            uploaded(dir.path(), "folder-default"),
            ["2023-10-14_181500.jpg", "2023-10-14_181506.jpg"]
        );
        assert_eq!(record.notifications().len(), 2);
    }

    /// Without a classifier every image goes to the default folder with the
    /// bare tag text
    #[tokio::test]
    async fn test_unclassified_run_uses_default_route() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(dir.path(), "enabled = false", "");

        let (stats, record) = run_scripted(&bp, at(18, 15, 3), &[0]).await;

        assert_eq!(stats.runs_succeeded, 1);
        assert_eq!(
            uploaded(dir.path(), "folder-default"),
            ["2023-10-14_181503.jpg"]
        );
        let notifications = record.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].text,
            "Auto-tweet from catmon2: 2023-10-14_181503.jpg"
        );
        assert_eq!(notifications[0].account, "catmon");
    }

    #[tokio::test]
    async fn test_unknown_cat_in_the_afternoon() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(
            dir.path(),
            r#"backend = "mock"
params = { label = "unknown", confidence = "0.42", model = "m1" }"#,
            "",
        );

        let (stats, record) = run_scripted(&bp, at(14, 0, 0), &[0]).await;

        assert_eq!(stats.runs_succeeded, 1);
        assert_eq!(
            uploaded(dir.path(), "folder-unknown"),
            ["2023-10-14_140000.jpg"]
        );
        let text = &record.notifications()[0].text;
        assert_eq!(
            text,
            "Good afternoon cat of mystery!\n\n\
             Catmonic (using m1) says the likelihood is 42.0%\n\n\
             Auto-tweet from catmon2: 2023-10-14_140000.jpg"
        );
    }

    #[tokio::test]
    async fn test_known_cat_goes_to_its_folder() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(
            dir.path(),
            r#"backend = "mock"
params = { label = "boo", confidence = "0.9", model = "m1" }"#,
            "",
        );

        let (_, record) = run_scripted(&bp, at(9, 30, 0), &[0]).await;

        assert_eq!(uploaded(dir.path(), "folder-boo"), ["2023-10-14_093000.jpg"]);
        assert!(uploaded(dir.path(), "folder-default").is_empty());
        let text = &record.notifications()[0].text;
        assert!(text.starts_with("Good morning Boo, aka Fluff Bag!"));
        assert!(text.contains("says the likelihood of Boo is 90.0%"));
    }

    /// A label outside the table fails the route stage; nothing is published
    #[tokio::test]
    async fn test_foreign_label_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(
            dir.path(),
            r#"backend = "mock"
params = { label = "dog", confidence = "0.99", model = "m1" }"#,
            "",
        );

        let (stats, record) = run_scripted(&bp, at(12, 0, 0), &[0]).await;

        assert_eq!(stats.runs_failed, 1);
        assert_eq!(stats.failures_by_stage.get(&Stage::Route), Some(&1));
        assert_eq!(stats.last_error, Some(ErrorKind::InvalidClassification));
        assert!(record.notifications().is_empty());
        assert!(uploaded(dir.path(), "folder-default").is_empty());
    }

    /// No sensor and no substitute image: one failed capture, then exit
    #[tokio::test]
    async fn test_simulated_capture_without_images() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("images").join("unseen*");
        let simulation = format!(
            "no_sensor = true\nsimulate_capture = true\nsubstitute_pattern = '{}'",
            pattern.display()
        );
        let bp = blueprint(dir.path(), "enabled = false", &simulation);
        let (orch, record) = orchestrator(&bp);
        let gate = EventGate::new(
            DisconnectedSensor::new(bp.sensor.pin),
            bp.to_gate_config(),
            bp.to_simulation_config(),
        );

        let stats = Monitor::new(gate, orch)
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.events, 1);
        assert_eq!(stats.runs_failed, 1);
        assert_eq!(stats.failures_by_stage.get(&Stage::Capture), Some(&1));
        assert_eq!(stats.last_error, Some(ErrorKind::SimulationImageNotFound));
        assert!(record.notifications().is_empty());
    }

    /// With a live sensor a missing substitute fails each capture and the
    /// monitor keeps waiting for the next swing
    #[tokio::test]
    async fn test_missing_substitute_fails_each_run() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("images").join("unseen*");
        let simulation = format!(
            "simulate_capture = true\nsubstitute_pattern = '{}'",
            pattern.display()
        );
        let bp = blueprint(dir.path(), "enabled = false", &simulation);

        let (stats, record) = run_scripted(&bp, at(18, 0, 0), &[0, 10]).await;

        assert_eq!(stats.events, 2);
        assert_eq!(stats.runs_succeeded, 0);
        assert_eq!(stats.runs_failed, 2);
        assert_eq!(stats.failures_by_stage.get(&Stage::Capture), Some(&2));
        assert_eq!(stats.last_error, Some(ErrorKind::SimulationImageNotFound));
        assert!(record.notifications().is_empty());
        assert!(uploaded(dir.path(), "folder-default").is_empty());
    }

    /// A sensor that cannot be read stops the monitor with a fatal error
    #[tokio::test]
    async fn test_disconnected_sensor_is_fatal() {
        let dir = TempDir::new().unwrap();
        let bp = blueprint(dir.path(), "enabled = false", "");
        let (orch, record) = orchestrator(&bp);
        let gate = EventGate::new(
            DisconnectedSensor::new(bp.sensor.pin),
            bp.to_gate_config(),
            bp.to_simulation_config(),
        );

        let err = Monitor::new(gate, orch)
            .run(std::future::pending())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SensorRead);
        assert!(err.is_fatal());
        assert!(record.notifications().is_empty());
    }
}
