//! Recording publishers for tests and dry runs
//!
//! Both keep what they were asked to publish behind a shared handle, so the
//! caller can inspect it after handing the publisher to the orchestrator.

use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{CapturedImage, CatmonError, Destination, ImageId, NotificationService, UploadService};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One recorded upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub image: ImageId,
    pub destination: Destination,
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub account: String,
    pub text: String,
    pub image: ImageId,
}

#[derive(Debug, Default)]
struct UploadLog {
    uploads: Vec<RecordedUpload>,
    refreshes: u32,
}

/// Shared view of a RecordingUploader
#[derive(Debug, Clone, Default)]
pub struct UploadRecord(Arc<Mutex<UploadLog>>);

impl UploadRecord {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        lock(&self.0).uploads.clone()
    }

    pub fn refreshes(&self) -> u32 {
        lock(&self.0).refreshes
    }
}

/// Upload service that records instead of uploading
pub struct RecordingUploader {
    record: UploadRecord,
    expired: bool,
    fail_with: Option<String>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self {
            record: UploadRecord::default(),
            expired: false,
            fail_with: None,
        }
    }

    /// Start with expired credentials; the first upload needs a refresh
    pub fn with_expired_credentials(mut self) -> Self {
        self.expired = true;
        self
    }

    /// Make every upload fail with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn record(&self) -> UploadRecord {
        self.record.clone()
    }
}

impl Default for RecordingUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadService for RecordingUploader {
    fn name(&self) -> &str {
        "recording"
    }

    fn credentials_expired(&self) -> bool {
        self.expired
    }

    async fn refresh_credentials(&mut self) -> Result<(), CatmonError> {
        lock(&self.record.0).refreshes += 1;
        self.expired = false;
        Ok(())
    }

    async fn upload(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), CatmonError> {
        if self.expired {
            return Err(CatmonError::upload(
                image.id.as_str(),
                &destination.name,
                "credentials expired",
            ));
        }
        if let Some(message) = &self.fail_with {
            return Err(CatmonError::upload(
                image.id.as_str(),
                &destination.name,
                message.clone(),
            ));
        }
        lock(&self.record.0).uploads.push(RecordedUpload {
            image: image.id.clone(),
            destination: destination.clone(),
        });
        Ok(())
    }
}

/// Shared view of a RecordingNotifier
#[derive(Debug, Clone, Default)]
pub struct NotificationRecord(Arc<Mutex<Vec<RecordedNotification>>>);

impl NotificationRecord {
    pub fn notifications(&self) -> Vec<RecordedNotification> {
        lock(&self.0).clone()
    }
}

/// Notification service that records instead of posting
pub struct RecordingNotifier {
    account: String,
    record: NotificationRecord,
    fail_with: Option<String>,
}

impl RecordingNotifier {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            record: NotificationRecord::default(),
            fail_with: None,
        }
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn record(&self) -> NotificationRecord {
        self.record.clone()
    }
}

impl NotificationService for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn account(&self) -> &str {
        &self.account
    }

    async fn publish(&mut self, text: &str, image: &CapturedImage) -> Result<(), CatmonError> {
        if let Some(message) = &self.fail_with {
            return Err(CatmonError::notification(image.id.as_str(), message.clone()));
        }
        lock(&self.record.0).push(RecordedNotification {
            account: self.account.clone(),
            text: text.to_string(),
            image: image.id.clone(),
        });
        Ok(())
    }
}
