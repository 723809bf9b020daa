//! PipelineOrchestrator - runs Capture -> Classify -> Route -> Publish
//!
//! One run per admitted event, strictly sequential. The first failing stage
//! ends the run; stages already completed are not rolled back.

use std::time::Instant;

use contracts::{
    AdmittedEvent, CaptureDevice, CatmonError, Classifier, NotificationService, PipelineRunOutcome,
    Stage, StageFailure, UploadService,
};
use tracing::{error, field, info, info_span, Instrument, Span};

use crate::routing::RoutingPolicy;
use crate::stages::{CaptureStage, ClassifyStage, PublishStage};

/// Record stage metrics and wrap a stage error
fn finish<T>(
    stage: Stage,
    started: Instant,
    result: Result<T, CatmonError>,
) -> Result<T, StageFailure> {
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    observability::metrics::record_stage(stage, result.is_ok(), duration_ms);
    result.map_err(|error| StageFailure { stage, error })
}

/// Sequences the stages for one admitted event at a time
pub struct PipelineOrchestrator<C, K, U, N>
where
    C: CaptureDevice,
    K: Classifier,
    U: UploadService,
    N: NotificationService,
{
    capture: CaptureStage<C>,
    classify: ClassifyStage<K>,
    policy: RoutingPolicy,
    publish: PublishStage<U, N>,
}

impl<C, K, U, N> PipelineOrchestrator<C, K, U, N>
where
    C: CaptureDevice,
    K: Classifier,
    U: UploadService,
    N: NotificationService,
{
    pub fn new(
        capture: CaptureStage<C>,
        classify: ClassifyStage<K>,
        policy: RoutingPolicy,
        publish: PublishStage<U, N>,
    ) -> Self {
        info!(
            classify = classify.is_enabled(),
            upload = publish.upload_enabled(),
            notify = publish.notify_enabled(),
            "pipeline stages configured"
        );
        Self {
            capture,
            classify,
            policy,
            publish,
        }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    pub fn capture_stage(&self) -> &CaptureStage<C> {
        &self.capture
    }

    /// Run every stage for `event`
    ///
    /// Never fails as a whole: a stage error ends the run and is reported
    /// in the outcome.
    pub async fn run(&mut self, event: &AdmittedEvent) -> PipelineRunOutcome {
        let span = info_span!("event", event_time = %event.event_time, image = field::Empty);
        self.run_inner(event).instrument(span).await
    }

    async fn run_inner(&mut self, event: &AdmittedEvent) -> PipelineRunOutcome {
        let started = Instant::now();
        let mut outcome = PipelineRunOutcome::new(event.event_time);
        info!("pipeline run started");

        if let Err(failure) = self.execute(event, &mut outcome).await {
            error!(
                stage = %failure.stage,
                event_time = %event.event_time,
                image = outcome.image.as_ref().map(|id| id.as_str()).unwrap_or("-"),
                kind = failure.error.kind().as_str(),
                error = %failure.error,
                "pipeline run failed"
            );
            outcome.failure = Some(failure);
        }

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let status = if outcome.is_success() { "success" } else { "failure" };
        observability::metrics::record_run(status, outcome.stages_completed(), duration_ms);
        info!(
            status,
            stages_completed = outcome.stages_completed(),
            skipped = ?outcome.skipped,
            duration_ms = format!("{duration_ms:.1}"),
            "pipeline run complete"
        );
        outcome
    }

    async fn execute(
        &mut self,
        event: &AdmittedEvent,
        outcome: &mut PipelineRunOutcome,
    ) -> Result<(), StageFailure> {
        let started = Instant::now();
        let image = finish(Stage::Capture, started, self.capture.capture(event).await)?;
        Span::current().record("image", image.id.as_str());
        outcome.image = Some(image.id.clone());
        outcome.completed.push(Stage::Capture);

        let classification = if self.classify.is_enabled() {
            let started = Instant::now();
            let result = finish(
                Stage::Classify,
                started,
                self.classify.classify(&image).await,
            )?;
            outcome.completed.push(Stage::Classify);
            result
        } else {
            outcome.skipped.push(Stage::Classify);
            None
        };

        let started = Instant::now();
        let decision = finish(
            Stage::Route,
            started,
            self.policy
                .route(classification.as_ref(), &image.id, event.event_time),
        )?;
        info!(folder = %decision.destination.name, "route chosen");
        outcome.completed.push(Stage::Route);

        if self.publish.upload_enabled() {
            let started = Instant::now();
            finish(
                Stage::Upload,
                started,
                self.publish.upload(&image, &decision.destination).await,
            )?;
            outcome.completed.push(Stage::Upload);
        } else {
            outcome.skipped.push(Stage::Upload);
        }

        if self.publish.notify_enabled() {
            let started = Instant::now();
            finish(
                Stage::Notify,
                started,
                self.publish.notify(&decision.notification_text, &image).await,
            )?;
            outcome.completed.push(Stage::Notify);
        } else {
            outcome.skipped.push(Stage::Notify);
        }

        Ok(())
    }

    /// Stop the capture device
    pub async fn shutdown(&mut self) -> Result<(), CatmonError> {
        self.capture.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use contracts::{
        CaptureBackend, CaptureSettings, ClassificationResult, Destination, RoutingTable,
        SubjectProfile,
    };
    use devices::{MockCamera, MockClassifier, SimulationOverride};
    use publisher::{NotificationRecord, RecordingNotifier, RecordingUploader, UploadRecord};
    use tempfile::TempDir;

    type TestOrchestrator =
        PipelineOrchestrator<MockCamera, MockClassifier, RecordingUploader, RecordingNotifier>;

    fn table() -> RoutingTable {
        let subject = |label: &str, name: &str| SubjectProfile {
            label: label.to_string(),
            display_name: name.to_string(),
            salutation: format!("{name}!"),
            destination: Destination::new(format!("catmon_{label}"), format!("folder-{label}")),
        };
        RoutingTable {
            notification_tag: "Auto-tweet from catmon2:".to_string(),
            classifier_name: "Catmonic".to_string(),
            unknown_salutation: "cat of mystery!".to_string(),
            default: Destination::new("catmon", "folder-default"),
            unknown: Destination::new("catmon_unknown", "folder-unknown"),
            subject_a: subject("boo", "Boo"),
            subject_b: subject("simba", "Simba"),
        }
    }

    fn orchestrator(
        dir: &TempDir,
        camera: MockCamera,
        classifier: Option<MockClassifier>,
        uploader: RecordingUploader,
        notifier: RecordingNotifier,
    ) -> (TestOrchestrator, UploadRecord, NotificationRecord) {
        let settings = CaptureSettings {
            backend: CaptureBackend::Mock,
            output_dir: dir.path().to_path_buf(),
            pre_delay_ms: 0,
            ..CaptureSettings::default()
        };
        let uploads = uploader.record();
        let notifications = notifier.record();
        let orchestrator = PipelineOrchestrator::new(
            CaptureStage::new(camera, &settings, SimulationOverride::disabled()),
            ClassifyStage::new(classifier),
            RoutingPolicy::new(table()),
            PublishStage::new(Some(uploader), Some(notifier)),
        );
        (orchestrator, uploads, notifications)
    }

    fn event() -> AdmittedEvent {
        AdmittedEvent::new(
            Local
                .with_ymd_and_hms(2023, 10, 14, 9, 30, 0)
                .single()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_full_run_routes_by_label() {
        let dir = TempDir::new().unwrap();
        let classifier = MockClassifier::new(ClassificationResult::new("simba", 0.8, "m1"));
        let (mut orch, uploads, notifications) = orchestrator(
            &dir,
            MockCamera::new(),
            Some(classifier),
            RecordingUploader::new(),
            RecordingNotifier::new("catmon"),
        );

        let outcome = orch.run(&event()).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.completed, Stage::ALL.to_vec());
        assert!(outcome.skipped.is_empty());

        let uploads = uploads.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].destination.id, "folder-simba");
        assert_eq!(uploads[0].image.as_str(), "2023-10-14_093000.jpg");

        let sent = notifications.notifications();
        assert!(sent[0].text.starts_with("Good morning Simba!"));
        assert_eq!(sent[0].image.as_str(), "2023-10-14_093000.jpg");
    }

    #[tokio::test]
    async fn test_invalid_label_stops_before_publish() {
        let dir = TempDir::new().unwrap();
        let classifier = MockClassifier::new(ClassificationResult::new("dog", 0.99, "m1"));
        let (mut orch, uploads, notifications) = orchestrator(
            &dir,
            MockCamera::new(),
            Some(classifier),
            RecordingUploader::new(),
            RecordingNotifier::new("catmon"),
        );

        let outcome = orch.run(&event()).await;
        assert_eq!(outcome.failed_stage(), Some(Stage::Route));
        assert!(matches!(
            outcome.error(),
            Some(CatmonError::InvalidClassification { .. })
        ));
        assert_eq!(outcome.completed, vec![Stage::Capture, Stage::Classify]);
        assert!(uploads.uploads().is_empty());
        assert!(notifications.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_capture_failure_ends_run() {
        let dir = TempDir::new().unwrap();
        let (mut orch, uploads, _) = orchestrator(
            &dir,
            MockCamera::new().failing("camera busy"),
            None,
            RecordingUploader::new(),
            RecordingNotifier::new("catmon"),
        );

        let outcome = orch.run(&event()).await;
        assert_eq!(outcome.failed_stage(), Some(Stage::Capture));
        assert_eq!(outcome.stages_completed(), 0);
        assert!(outcome.image.is_none());
        assert!(uploads.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_kept_when_notify_fails() {
        let dir = TempDir::new().unwrap();
        let (mut orch, uploads, _) = orchestrator(
            &dir,
            MockCamera::new(),
            None,
            RecordingUploader::new(),
            RecordingNotifier::new("catmon").failing("rate limited"),
        );

        let outcome = orch.run(&event()).await;
        assert_eq!(outcome.failed_stage(), Some(Stage::Notify));
        assert_eq!(
            outcome.completed,
            vec![Stage::Capture, Stage::Route, Stage::Upload]
        );
        assert_eq!(outcome.skipped, vec![Stage::Classify]);
        assert_eq!(uploads.uploads().len(), 1);
        assert!(dir.path().join("2023-10-14_093000.jpg").is_file());
    }

    #[tokio::test]
    async fn test_upload_failure_skips_notify() {
        let dir = TempDir::new().unwrap();
        let (mut orch, _, notifications) = orchestrator(
            &dir,
            MockCamera::new(),
            None,
            RecordingUploader::new().failing("quota exceeded"),
            RecordingNotifier::new("catmon"),
        );

        let outcome = orch.run(&event()).await;
        assert_eq!(outcome.failed_stage(), Some(Stage::Upload));
        assert!(notifications.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_publishers_are_skipped() {
        let dir = TempDir::new().unwrap();
        let settings = CaptureSettings {
            backend: CaptureBackend::Mock,
            output_dir: dir.path().to_path_buf(),
            pre_delay_ms: 0,
            ..CaptureSettings::default()
        };
        let mut orch: TestOrchestrator = PipelineOrchestrator::new(
            CaptureStage::new(MockCamera::new(), &settings, SimulationOverride::disabled()),
            ClassifyStage::disabled(),
            RoutingPolicy::new(table()),
            PublishStage::new(None, None),
        );

        let outcome = orch.run(&event()).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.completed, vec![Stage::Capture, Stage::Route]);
        assert_eq!(
            outcome.skipped,
            vec![Stage::Classify, Stage::Upload, Stage::Notify]
        );

        orch.shutdown().await.unwrap();
        assert!(orch.capture_stage().device().is_stopped());
    }
}
