//! Configured device backends
//!
//! `Sensor`, `Camera` and `Model` dispatch to the backend chosen in the
//! `[sensor]`, `[capture]` and `[classify]` sections.

use std::path::Path;
use std::time::Duration;

use contracts::{
    AcquisitionMetadata, CaptureBackend, CaptureDevice, CaptureSettings, CapturedImage,
    CatmonError, ClassificationResult, Classifier, ClassifierBackend, ClassifySettings, Level,
    SensorBackend, SensorSettings, SensorSource, SensorTransition,
};

use crate::{
    CommandCamera, CommandClassifier, DisconnectedSensor, MockCamera, MockClassifier,
    SysfsGpioSensor,
};

/// Configured sensor backend
pub enum Sensor {
    Gpio(SysfsGpioSensor),
    Disconnected(DisconnectedSensor),
}

impl Sensor {
    /// Open the backend selected by the settings
    ///
    /// # Errors
    /// `SensorRead` if the GPIO pin cannot be set up
    pub async fn from_settings(settings: &SensorSettings) -> Result<Self, CatmonError> {
        match settings.backend {
            SensorBackend::Gpio => SysfsGpioSensor::open(settings).await.map(Self::Gpio),
            SensorBackend::Disconnected => {
                Ok(Self::Disconnected(DisconnectedSensor::new(settings.pin)))
            }
        }
    }
}

impl SensorSource for Sensor {
    fn pin(&self) -> u32 {
        match self {
            Self::Gpio(s) => s.pin(),
            Self::Disconnected(s) => s.pin(),
        }
    }

    async fn wait_for_edge(
        &mut self,
        bounce: Duration,
    ) -> Result<Option<SensorTransition>, CatmonError> {
        match self {
            Self::Gpio(s) => s.wait_for_edge(bounce).await,
            Self::Disconnected(s) => s.wait_for_edge(bounce).await,
        }
    }

    async fn read(&self) -> Result<Level, CatmonError> {
        match self {
            Self::Gpio(s) => s.read().await,
            Self::Disconnected(s) => s.read().await,
        }
    }

    async fn release(&mut self) -> Result<(), CatmonError> {
        match self {
            Self::Gpio(s) => s.release().await,
            Self::Disconnected(s) => s.release().await,
        }
    }
}

/// Configured capture backend
pub enum Camera {
    Command(CommandCamera),
    Mock(MockCamera),
}

impl Camera {
    pub fn from_settings(settings: &CaptureSettings) -> Self {
        match settings.backend {
            CaptureBackend::Command => Self::Command(CommandCamera::from_settings(settings)),
            CaptureBackend::Mock => Self::Mock(MockCamera::new()),
        }
    }
}

impl CaptureDevice for Camera {
    fn name(&self) -> &str {
        match self {
            Self::Command(c) => c.name(),
            Self::Mock(c) => c.name(),
        }
    }

    async fn capture_to(&mut self, path: &Path) -> Result<AcquisitionMetadata, CatmonError> {
        match self {
            Self::Command(c) => c.capture_to(path).await,
            Self::Mock(c) => c.capture_to(path).await,
        }
    }

    async fn stop(&mut self) -> Result<(), CatmonError> {
        match self {
            Self::Command(c) => c.stop().await,
            Self::Mock(c) => c.stop().await,
        }
    }
}

/// Configured classifier backend
pub enum Model {
    Command(CommandClassifier),
    Mock(MockClassifier),
}

impl Model {
    pub fn from_settings(settings: &ClassifySettings) -> Self {
        match settings.backend {
            ClassifierBackend::Command => {
                let name = settings
                    .command
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "classifier".to_string());
                Self::Command(CommandClassifier::new(name, settings.command.clone()))
            }
            ClassifierBackend::Mock => Self::Mock(MockClassifier::from_params(&settings.params)),
        }
    }
}

impl Classifier for Model {
    fn name(&self) -> &str {
        match self {
            Self::Command(m) => m.name(),
            Self::Mock(m) => m.name(),
        }
    }

    async fn predict(
        &mut self,
        image: &CapturedImage,
    ) -> Result<ClassificationResult, CatmonError> {
        match self {
            Self::Command(m) => m.predict(image).await,
            Self::Mock(m) => m.predict(image).await,
        }
    }
}
