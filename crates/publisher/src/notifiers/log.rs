//! LogNotifier - writes notifications to the log stream

use contracts::{CapturedImage, CatmonError, NotificationService};
use tracing::{info, instrument};

/// Notification service that only logs what would be posted
pub struct LogNotifier {
    name: String,
    account: String,
    published: u64,
}

impl LogNotifier {
    pub fn new(name: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
            published: 0,
        }
    }
}

/// Notification text on one line, for log output
pub fn flatten(text: &str) -> String {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl NotificationService for LogNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn account(&self) -> &str {
        &self.account
    }

    #[instrument(name = "log_notify", skip(self, text, image), fields(notifier = %self.name))]
    async fn publish(&mut self, text: &str, image: &CapturedImage) -> Result<(), CatmonError> {
        self.published += 1;
        info!(
            account = %self.account,
            image = %image.id,
            count = self.published,
            text = %flatten(text),
            "notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AcquisitionMetadata;
    use std::path::PathBuf;

    #[test]
    fn test_flatten() {
        assert_eq!(
            flatten("Good evening Boo!\n\nCatmonic says 93.0%\n\nAuto-tweet from catmon2: a.jpg"),
            "Good evening Boo! Catmonic says 93.0% Auto-tweet from catmon2: a.jpg"
        );
        assert_eq!(flatten("one line"), "one line");
    }

    #[tokio::test]
    async fn test_publish_counts() {
        let mut notifier = LogNotifier::new("log", "catmon");
        let image = CapturedImage {
            id: "a.jpg".into(),
            path: PathBuf::from("a.jpg"),
            metadata: AcquisitionMetadata::default(),
        };
        notifier.publish("hello", &image).await.unwrap();
        assert_eq!(notifier.published, 1);
        assert_eq!(notifier.account(), "catmon");
    }
}
