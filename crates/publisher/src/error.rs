//! Publisher error types

use thiserror::Error;

/// Publisher-specific errors
///
/// Mapped onto `CatmonError::Upload` / `CatmonError::Notification` at the
/// collaborator trait boundary, where the image and destination are known.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// Backend could not be created from its params
    #[error("failed to create publisher '{name}': {message}")]
    Creation { name: String, message: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),

    /// Token endpoint answered but the response was unusable
    #[error("token error: {0}")]
    Token(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublisherError {
    /// Create a publisher creation error
    pub fn creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Creation {
            name: name.into(),
            message: message.into(),
        }
    }
}
