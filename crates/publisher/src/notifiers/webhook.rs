//! WebhookNotifier - posts notifications as JSON to a webhook

use std::collections::HashMap;
use std::time::Duration;

use contracts::{CapturedImage, CatmonError, NotificationService};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::PublisherError;

/// Configuration for WebhookNotifier
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// Optional bearer token
    pub token: Option<String>,
    pub timeout: Duration,
}

impl WebhookConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let url = params
            .get("url")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| "missing 'url' parameter".to_string())?
            .clone();
        let timeout_secs = match params.get("timeout_secs") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("invalid timeout_secs '{raw}': {e}"))?,
            None => 10,
        };
        Ok(Self {
            url,
            token: params.get("token").cloned(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// JSON body sent to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    account: &'a str,
    text: &'a str,
    image: &'a str,
    image_path: String,
}

/// Notification service posting to a webhook
pub struct WebhookNotifier {
    name: String,
    account: String,
    http: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(
        name: impl Into<String>,
        account: impl Into<String>,
        config: WebhookConfig,
    ) -> Result<Self, PublisherError> {
        let name = name.into();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PublisherError::creation(&name, e.to_string()))?;
        Ok(Self {
            name,
            account: account.into(),
            http,
            config,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        account: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, PublisherError> {
        let name = name.into();
        let config =
            WebhookConfig::from_params(params).map_err(|e| PublisherError::creation(&name, e))?;
        Self::new(name, account, config)
    }

    async fn post(&self, text: &str, image: &CapturedImage) -> Result<(), PublisherError> {
        let payload = WebhookPayload {
            account: &self.account,
            text,
            image: image.id.as_str(),
            image_path: image.path.display().to_string(),
        };
        let mut req = self.http.post(&self.config.url).json(&payload);
        if let Some(token) = &self.config.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let resp = req.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(PublisherError::Status(resp.status()))
        }
    }
}

impl NotificationService for WebhookNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn account(&self) -> &str {
        &self.account
    }

    #[instrument(name = "webhook_notify", skip(self, text, image), fields(notifier = %self.name, image = %image.id))]
    async fn publish(&mut self, text: &str, image: &CapturedImage) -> Result<(), CatmonError> {
        self.post(text, image)
            .await
            .map_err(|e| CatmonError::notification(image.id.as_str(), e.to_string()))?;
        debug!("notification posted");
        Ok(())
    }
}
