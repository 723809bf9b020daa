//! Notification service implementations
//!
//! `Notifier` dispatches to the backend chosen in `[notify]`.

mod log;
mod webhook;

pub use self::log::{flatten, LogNotifier};
pub use self::webhook::{WebhookConfig, WebhookNotifier};

use contracts::{CapturedImage, CatmonError, NotificationService, NotifyBackend, NotifySettings};

use crate::PublisherError;

/// Configured notification backend
pub enum Notifier {
    Log(LogNotifier),
    Webhook(WebhookNotifier),
}

impl Notifier {
    /// Build the backend selected by the settings
    pub fn from_settings(settings: &NotifySettings) -> Result<Self, PublisherError> {
        match settings.backend {
            NotifyBackend::Log => Ok(Self::Log(LogNotifier::new("log", &settings.account_name))),
            NotifyBackend::Webhook => {
                WebhookNotifier::from_params("webhook", &settings.account_name, &settings.params)
                    .map(Self::Webhook)
            }
        }
    }
}

impl NotificationService for Notifier {
    fn name(&self) -> &str {
        match self {
            Self::Log(n) => n.name(),
            Self::Webhook(n) => n.name(),
        }
    }

    fn account(&self) -> &str {
        match self {
            Self::Log(n) => n.account(),
            Self::Webhook(n) => n.account(),
        }
    }

    async fn publish(&mut self, text: &str, image: &CapturedImage) -> Result<(), CatmonError> {
        match self {
            Self::Log(n) => n.publish(text, image).await,
            Self::Webhook(n) => n.publish(text, image).await,
        }
    }
}
