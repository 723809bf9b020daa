//! Layered error definitions
//!
//! Categorized by source: config / sensor / pipeline stages / simulation

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum CatmonError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sensor Errors =====
    /// Sensor could not be read; fatal for the wait loop
    #[error("sensor read error on pin {pin}: {message}")]
    SensorRead { pin: u32, message: String },

    // ===== Stage Errors =====
    /// Capture device failed
    #[error("capture error for '{image}': {message}")]
    Capture { image: String, message: String },

    /// Classifier failed or returned malformed output
    #[error("classification error for '{image}': {message}")]
    Classification { image: String, message: String },

    /// Classifier returned a label outside the configured set
    #[error("invalid classification label '{label}' (expected one of {expected:?})")]
    InvalidClassification { label: String, expected: Vec<String> },

    /// Upload collaborator failed
    #[error("upload of '{image}' to '{destination}' failed: {message}")]
    Upload {
        image: String,
        destination: String,
        message: String,
    },

    /// Notification collaborator failed
    #[error("notification for '{image}' failed: {message}")]
    Notification { image: String, message: String },

    // ===== Simulation Errors =====
    /// Simulated capture requested but nothing matched the substitute pattern
    #[error("no substitute image matches pattern '{pattern}'")]
    SimulationImageNotFound { pattern: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminant of [`CatmonError`], used for matching and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConfigParse,
    ConfigValidation,
    SensorRead,
    Capture,
    Classification,
    InvalidClassification,
    Upload,
    Notification,
    SimulationImageNotFound,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigParse => "config_parse",
            Self::ConfigValidation => "config_validation",
            Self::SensorRead => "sensor_read",
            Self::Capture => "capture",
            Self::Classification => "classification",
            Self::InvalidClassification => "invalid_classification",
            Self::Upload => "upload",
            Self::Notification => "notification",
            Self::SimulationImageNotFound => "simulation_image_not_found",
            Self::Io => "io",
        }
    }
}

impl CatmonError {
    /// Error discriminant
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigParse { .. } => ErrorKind::ConfigParse,
            Self::ConfigValidation { .. } => ErrorKind::ConfigValidation,
            Self::SensorRead { .. } => ErrorKind::SensorRead,
            Self::Capture { .. } => ErrorKind::Capture,
            Self::Classification { .. } => ErrorKind::Classification,
            Self::InvalidClassification { .. } => ErrorKind::InvalidClassification,
            Self::Upload { .. } => ErrorKind::Upload,
            Self::Notification { .. } => ErrorKind::Notification,
            Self::SimulationImageNotFound { .. } => ErrorKind::SimulationImageNotFound,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the error must stop the wait loop rather than just the current run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SensorRead { .. })
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sensor read error
    pub fn sensor_read(pin: u32, message: impl Into<String>) -> Self {
        Self::SensorRead {
            pin,
            message: message.into(),
        }
    }

    /// Create capture error
    pub fn capture(image: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capture {
            image: image.into(),
            message: message.into(),
        }
    }

    /// Create classification error
    pub fn classification(image: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Classification {
            image: image.into(),
            message: message.into(),
        }
    }

    /// Create upload error
    pub fn upload(
        image: impl Into<String>,
        destination: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upload {
            image: image.into(),
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create notification error
    pub fn notification(image: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notification {
            image: image.into(),
            message: message.into(),
        }
    }
}
