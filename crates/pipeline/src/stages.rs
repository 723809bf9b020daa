//! Stage adapters: capture, classify, publish
//!
//! Each adapter wraps one (or two) collaborators and turns their output into
//! the data handed to the next stage. Optional stages hold an `Option` of
//! their collaborator; `None` means the stage is disabled for the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use contracts::{
    AdmittedEvent, CaptureDevice, CaptureSettings, CapturedImage, CatmonError,
    ClassificationResult, Classifier, Destination, ImageId, NotificationService, UploadService,
};
use devices::SimulationOverride;
use tracing::{debug, info};

// ============================================================================
// Capture
// ============================================================================

/// Produces one image per admitted event
pub struct CaptureStage<C: CaptureDevice> {
    device: C,
    simulation: SimulationOverride,
    output_dir: PathBuf,
    pre_delay: Duration,
}

impl<C: CaptureDevice> CaptureStage<C> {
    pub fn new(device: C, settings: &CaptureSettings, simulation: SimulationOverride) -> Self {
        Self {
            device,
            simulation,
            output_dir: settings.output_dir.clone(),
            pre_delay: settings.pre_delay(),
        }
    }

    /// `<prefix><YYYY-MM-DD_HHMMSS>.jpg`, prefixed only while testing
    pub fn image_name(&self, event_time: DateTime<Local>) -> String {
        let prefix = if self.simulation.is_testing() {
            self.simulation.test_prefix()
        } else {
            ""
        };
        format!("{prefix}{}.jpg", event_time.format("%Y-%m-%d_%H%M%S"))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn device(&self) -> &C {
        &self.device
    }

    /// Capture (or substitute) the image for `event`
    ///
    /// # Errors
    /// - `Capture` if the device fails
    /// - `SimulationImageNotFound` if simulated capture finds no substitute
    pub async fn capture(&mut self, event: &AdmittedEvent) -> Result<CapturedImage, CatmonError> {
        let image = if self.simulation.should_simulate_capture() {
            self.substitute()?
        } else {
            self.acquire(event).await?
        };

        observability::metrics::record_brightness(image.metadata.lux, image.metadata.mean_luma);
        info!(
            image = %image.id,
            lux = ?image.metadata.lux,
            exposure_time_us = ?image.metadata.exposure_time_us,
            mean_luma = ?image.metadata.mean_luma,
            "image captured"
        );
        Ok(image)
    }

    async fn acquire(&mut self, event: &AdmittedEvent) -> Result<CapturedImage, CatmonError> {
        let name = self.image_name(event.event_time);
        let path = self.output_dir.join(&name);

        if !self.pre_delay.is_zero() {
            debug!(delay_ms = self.pre_delay.as_millis() as u64, "pre-capture delay");
            tokio::time::sleep(self.pre_delay).await;
        }

        let metadata = self.device.capture_to(&path).await?;
        Ok(CapturedImage {
            id: ImageId::from(name),
            path,
            metadata,
        })
    }

    fn substitute(&self) -> Result<CapturedImage, CatmonError> {
        let pattern = self.simulation.default_pattern();
        match self.simulation.get_substitute_image(None)? {
            Some(image) => {
                info!(image = %image.id, pattern, "using substitute image");
                Ok(image)
            }
            None => Err(CatmonError::SimulationImageNotFound {
                pattern: pattern.to_string(),
            }),
        }
    }

    /// Stop the capture device
    pub async fn stop(&mut self) -> Result<(), CatmonError> {
        self.device.stop().await
    }
}

// ============================================================================
// Classify
// ============================================================================

/// Optional classification of the captured image
pub struct ClassifyStage<K: Classifier> {
    classifier: Option<K>,
}

impl<K: Classifier> ClassifyStage<K> {
    pub fn new(classifier: Option<K>) -> Self {
        Self { classifier }
    }

    pub fn disabled() -> Self {
        Self { classifier: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classify `image`; `Ok(None)` when classification is disabled
    ///
    /// # Errors
    /// `Classification` if the classifier fails or reports a confidence
    /// outside 0.0 - 1.0
    pub async fn classify(
        &mut self,
        image: &CapturedImage,
    ) -> Result<Option<ClassificationResult>, CatmonError> {
        let Some(classifier) = self.classifier.as_mut() else {
            return Ok(None);
        };

        let result = classifier.predict(image).await?;
        if !(0.0..=1.0).contains(&result.confidence) {
            return Err(CatmonError::classification(
                image.id.as_str(),
                format!("confidence {} outside 0.0 - 1.0", result.confidence),
            ));
        }
        info!(
            label = %result.label,
            confidence = format!("{:.2}%", result.confidence * 100.0),
            model = %result.model,
            "classification"
        );
        Ok(Some(result))
    }
}

// ============================================================================
// Publish
// ============================================================================

/// Upload and notification, independently optional
pub struct PublishStage<U: UploadService, N: NotificationService> {
    uploader: Option<U>,
    notifier: Option<N>,
}

impl<U: UploadService, N: NotificationService> PublishStage<U, N> {
    pub fn new(uploader: Option<U>, notifier: Option<N>) -> Self {
        Self { uploader, notifier }
    }

    pub fn upload_enabled(&self) -> bool {
        self.uploader.is_some()
    }

    pub fn notify_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Upload `image` into `destination`, refreshing credentials first if
    /// the service reports them expired. No-op when uploads are disabled.
    ///
    /// # Errors
    /// `Upload` if the refresh or the upload fails
    pub async fn upload(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), CatmonError> {
        let Some(uploader) = self.uploader.as_mut() else {
            return Ok(());
        };

        if uploader.credentials_expired() {
            info!(uploader = uploader.name(), "upload credentials expired, refreshing");
            uploader.refresh_credentials().await?;
        }
        info!(
            image = %image.id,
            folder = %destination.name,
            uploader = uploader.name(),
            "uploading image"
        );
        uploader.upload(image, destination).await
    }

    /// Post `text` with a reference to `image`. No-op when disabled.
    ///
    /// # Errors
    /// `Notification` if the service fails
    pub async fn notify(
        &mut self,
        text: &str,
        image: &CapturedImage,
    ) -> Result<(), CatmonError> {
        let Some(notifier) = self.notifier.as_mut() else {
            return Ok(());
        };

        info!(
            account = notifier.account(),
            text = %text.replace('\n', " "),
            "posting notification"
        );
        notifier.publish(text, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::{AcquisitionMetadata, CaptureBackend, SimulationConfig, SimulationSettings};
    use devices::{MockCamera, MockClassifier};
    use publisher::{RecordingNotifier, RecordingUploader};
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> CaptureSettings {
        CaptureSettings {
            backend: CaptureBackend::Mock,
            output_dir: dir.path().to_path_buf(),
            pre_delay_ms: 0,
            ..CaptureSettings::default()
        }
    }

    fn event() -> AdmittedEvent {
        AdmittedEvent::new(
            Local
                .with_ymd_and_hms(2023, 10, 14, 18, 15, 3)
                .single()
                .unwrap(),
        )
    }

    fn sample_image() -> CapturedImage {
        CapturedImage {
            id: "a.jpg".into(),
            path: PathBuf::from("a.jpg"),
            metadata: AcquisitionMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_capture_names_image_after_event_time() {
        let dir = TempDir::new().unwrap();
        let mut stage =
            CaptureStage::new(MockCamera::new(), &settings(&dir), SimulationOverride::disabled());

        let image = stage.capture(&event()).await.unwrap();
        assert_eq!(image.id.as_str(), "2023-10-14_181503.jpg");
        assert_eq!(image.path, dir.path().join("2023-10-14_181503.jpg"));
        assert!(image.path.is_file());
        assert_eq!(image.metadata.lux, Some(250.0));
        assert_eq!(stage.device().captures(), 1);
    }

    #[tokio::test]
    async fn test_test_prefix_while_testing() {
        let dir = TempDir::new().unwrap();
        let simulation = SimulationOverride::new(
            SimulationConfig::new(true, false),
            &SimulationSettings::default(),
            dir.path(),
        );
        let stage = CaptureStage::new(MockCamera::new(), &settings(&dir), simulation);
        assert_eq!(
            stage.image_name(event().event_time),
            "test_2023-10-14_181503.jpg"
        );
    }

    #[tokio::test]
    async fn test_simulated_capture_uses_substitute() {
        let images = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        image::RgbImage::from_pixel(8, 8, image::Rgb([40, 40, 40]))
            .save(images.path().join("unseen_boo.jpg"))
            .unwrap();

        let sim_settings = SimulationSettings {
            simulate_capture: true,
            substitute_pattern: format!("{}/unseen*", images.path().display()),
            ..SimulationSettings::default()
        };
        let simulation = SimulationOverride::new(
            SimulationConfig::new(false, true),
            &sim_settings,
            out.path(),
        );
        let mut stage = CaptureStage::new(MockCamera::new(), &settings(&out), simulation);

        let image = stage.capture(&event()).await.unwrap();
        assert_eq!(image.id.as_str(), "test_unseen_boo.jpg");
        assert!(image.metadata.mean_luma.is_some());
        assert_eq!(stage.device().captures(), 0);
    }

    #[tokio::test]
    async fn test_simulated_capture_without_match_fails() {
        let out = TempDir::new().unwrap();
        let sim_settings = SimulationSettings {
            simulate_capture: true,
            substitute_pattern: format!("{}/nothing*", out.path().display()),
            ..SimulationSettings::default()
        };
        let simulation = SimulationOverride::new(
            SimulationConfig::new(false, true),
            &sim_settings,
            out.path(),
        );
        let mut stage = CaptureStage::new(MockCamera::new(), &settings(&out), simulation);

        let err = stage.capture(&event()).await.unwrap_err();
        assert!(matches!(err, CatmonError::SimulationImageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_classify_disabled_and_out_of_range() {
        let mut disabled = ClassifyStage::<MockClassifier>::disabled();
        assert!(!disabled.is_enabled());
        assert!(disabled.classify(&sample_image()).await.unwrap().is_none());

        let mut stage = ClassifyStage::new(Some(MockClassifier::new(
            ClassificationResult::new("boo", 1.5, "m1"),
        )));
        let err = stage.classify(&sample_image()).await.unwrap_err();
        assert!(matches!(err, CatmonError::Classification { .. }));
    }

    #[tokio::test]
    async fn test_upload_refreshes_expired_credentials() {
        let uploader = RecordingUploader::new().with_expired_credentials();
        let record = uploader.record();
        let mut stage = PublishStage::<_, RecordingNotifier>::new(Some(uploader), None);

        stage
            .upload(&sample_image(), &Destination::new("catmon", "folder-default"))
            .await
            .unwrap();
        assert_eq!(record.refreshes(), 1);
        assert_eq!(record.uploads().len(), 1);

        assert!(!stage.notify_enabled());
        stage.notify("hello", &sample_image()).await.unwrap();
    }
}
