//! Collaborator traits consumed by the pipeline core
//!
//! Real hardware, external services and the mocks all implement these, so
//! the gate and the orchestrator never know which one they are talking to.
//! Every call may block for as long as the collaborator needs; timeouts are
//! the collaborator's responsibility.

use std::path::Path;
use std::time::Duration;

use crate::{
    AcquisitionMetadata, CapturedImage, CatmonError, ClassificationResult, Destination, Level,
    SensorTransition,
};

/// Binary sensor input (reed switch on a GPIO pin)
#[trait_variant::make(SensorSource: Send)]
pub trait LocalSensorSource {
    /// Pin number, for logging
    fn pin(&self) -> u32;

    /// Wait for the next rising edge
    ///
    /// Edges closer than `bounce` to the previous one are swallowed by the
    /// source. Returns `Ok(None)` once a finite source is exhausted.
    ///
    /// # Errors
    /// `SensorRead` if the pin can no longer be read (fatal for the loop)
    async fn wait_for_edge(
        &mut self,
        bounce: Duration,
    ) -> Result<Option<SensorTransition>, CatmonError>;

    /// Sample the live level
    async fn read(&self) -> Result<Level, CatmonError>;

    /// Release the pin; idempotent
    async fn release(&mut self) -> Result<(), CatmonError>;
}

/// Still-image capture device
#[trait_variant::make(CaptureDevice: Send)]
pub trait LocalCaptureDevice {
    /// Device name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Capture one still image into `path`
    async fn capture_to(&mut self, path: &Path) -> Result<AcquisitionMetadata, CatmonError>;

    /// Stop the device; idempotent
    async fn stop(&mut self) -> Result<(), CatmonError>;
}

/// Image classifier
#[trait_variant::make(Classifier: Send)]
pub trait LocalClassifier {
    fn name(&self) -> &str;

    /// Predict the subject of a captured image
    async fn predict(&mut self, image: &CapturedImage)
        -> Result<ClassificationResult, CatmonError>;
}

/// Remote storage upload service
///
/// Credentials are owned and refreshed by the service; the orchestrator
/// only asks whether they expired and triggers the refresh.
#[trait_variant::make(UploadService: Send)]
pub trait LocalUploadService {
    fn name(&self) -> &str;

    /// Whether the access credential must be refreshed before the next upload
    fn credentials_expired(&self) -> bool;

    async fn refresh_credentials(&mut self) -> Result<(), CatmonError>;

    /// Upload the image file into the destination folder
    async fn upload(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), CatmonError>;
}

/// Social notification service
#[trait_variant::make(NotificationService: Send)]
pub trait LocalNotificationService {
    fn name(&self) -> &str;

    /// Account the notifications are posted as
    fn account(&self) -> &str;

    /// Post `text` with a reference to the image attached
    async fn publish(&mut self, text: &str, image: &CapturedImage) -> Result<(), CatmonError>;
}
