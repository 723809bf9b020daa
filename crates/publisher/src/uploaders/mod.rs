//! Upload service implementations
//!
//! `Uploader` dispatches to the backend chosen in `[upload]`.

mod folder;
mod http;

pub use self::folder::{FolderUploader, FolderUploaderConfig};
pub use self::http::{HttpUploader, HttpUploaderConfig};

use contracts::{CapturedImage, CatmonError, Destination, UploadBackend, UploadService, UploadSettings};

use crate::PublisherError;

/// Configured upload backend
pub enum Uploader {
    Folder(FolderUploader),
    Http(HttpUploader),
}

impl Uploader {
    /// Build the backend selected by the settings
    pub fn from_settings(settings: &UploadSettings) -> Result<Self, PublisherError> {
        match settings.backend {
            UploadBackend::Folder => FolderUploader::from_params("folder", &settings.params)
                .map(Self::Folder)
                .map_err(|e| PublisherError::creation("folder", e.to_string())),
            UploadBackend::Http => HttpUploader::from_params("http", &settings.params).map(Self::Http),
        }
    }
}

impl UploadService for Uploader {
    fn name(&self) -> &str {
        match self {
            Self::Folder(u) => u.name(),
            Self::Http(u) => u.name(),
        }
    }

    fn credentials_expired(&self) -> bool {
        match self {
            Self::Folder(u) => u.credentials_expired(),
            Self::Http(u) => u.credentials_expired(),
        }
    }

    async fn refresh_credentials(&mut self) -> Result<(), CatmonError> {
        match self {
            Self::Folder(u) => u.refresh_credentials().await,
            Self::Http(u) => u.refresh_credentials().await,
        }
    }

    async fn upload(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), CatmonError> {
        match self {
            Self::Folder(u) => u.upload(image, destination).await,
            Self::Http(u) => u.upload(image, destination).await,
        }
    }
}
