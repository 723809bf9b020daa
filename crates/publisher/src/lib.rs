//! # Publisher
//!
//! Upload and notification backends for the publish stage.
//!
//! Responsibilities:
//! - Upload an image into its routed destination folder
//!   (local folder tree, or an HTTP storage API with token refresh)
//! - Post the notification text with a reference to the image
//!   (log stream, or a JSON webhook)
//! - Recording stand-ins for tests and dry runs

mod error;
mod notifiers;
mod recording;
mod uploaders;

pub use error::PublisherError;
pub use notifiers::{flatten, LogNotifier, Notifier, WebhookConfig, WebhookNotifier};
pub use recording::{
    NotificationRecord, RecordedNotification, RecordedUpload, RecordingNotifier,
    RecordingUploader, UploadRecord,
};
pub use uploaders::{FolderUploader, FolderUploaderConfig, HttpUploader, HttpUploaderConfig, Uploader};
