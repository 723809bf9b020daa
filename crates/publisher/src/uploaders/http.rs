//! HttpUploader - storage API upload with client-credentials token
//!
//! `POST {base_url}/folders/{destination id}/files?name={image}` with the
//! JPEG as body. When `token_url` is configured an access token is fetched
//! with the OAuth2 client-credentials grant and refreshed once it expires;
//! otherwise an optional static `token` is sent as-is.

use std::collections::HashMap;
use std::time::Duration;

use contracts::{CapturedImage, CatmonError, Destination, UploadService};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::PublisherError;

/// Refresh this long before the server-side expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Configuration for HttpUploader
#[derive(Debug, Clone)]
pub struct HttpUploaderConfig {
    pub base_url: String,
    pub token_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    /// Static bearer token, used when no token endpoint is configured
    pub static_token: Option<String>,
    pub timeout: Duration,
}

impl HttpUploaderConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let base_url = params
            .get("base_url")
            .ok_or_else(|| "missing 'base_url' parameter".to_string())?
            .trim_end_matches('/')
            .to_string();

        let token_url = params.get("token_url").cloned();
        let client_id = params.get("client_id").cloned().unwrap_or_default();
        let client_secret = params.get("client_secret").cloned().unwrap_or_default();
        if token_url.is_some() && (client_id.is_empty() || client_secret.is_empty()) {
            return Err("'token_url' requires 'client_id' and 'client_secret'".to_string());
        }

        let timeout_secs = match params.get("timeout_secs") {
            Some(raw) => raw
                .parse()
                .map_err(|e| format!("invalid timeout_secs '{raw}': {e}"))?,
            None => 30,
        };

        Ok(Self {
            base_url,
            token_url,
            client_id,
            client_secret,
            static_token: params.get("token").cloned(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Upload service talking to an HTTP storage API
pub struct HttpUploader {
    name: String,
    http: reqwest::Client,
    config: HttpUploaderConfig,
    token: Option<AccessToken>,
}

impl HttpUploader {
    pub fn new(name: impl Into<String>, config: HttpUploaderConfig) -> Result<Self, PublisherError> {
        let name = name.into();
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PublisherError::creation(&name, e.to_string()))?;

        Ok(Self {
            name,
            http,
            config,
            token: None,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, PublisherError> {
        let name = name.into();
        let config =
            HttpUploaderConfig::from_params(params).map_err(|e| PublisherError::creation(&name, e))?;
        Self::new(name, config)
    }

    fn bearer(&self) -> Option<&str> {
        match (&self.token, &self.config.static_token) {
            (Some(token), _) => Some(token.value.as_str()),
            (None, Some(token)) => Some(token.as_str()),
            (None, None) => None,
        }
    }

    async fn fetch_token(&self, token_url: &str) -> Result<AccessToken, PublisherError> {
        let resp = self
            .http
            .post(token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PublisherError::Status(resp.status()));
        }
        let body: TokenResponse = resp.json().await?;
        if body.access_token.is_empty() {
            return Err(PublisherError::Token("empty access_token".to_string()));
        }
        Ok(AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        })
    }

    async fn put_file(
        &self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), PublisherError> {
        let body = tokio::fs::read(&image.path).await?;
        let mut req = self
            .http
            .post(format!(
                "{}/folders/{}/files",
                self.config.base_url, destination.id
            ))
            .query(&[("name", image.id.as_str())])
            .header("Content-Type", "image/jpeg")
            .body(body);
        if let Some(token) = self.bearer() {
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

impl UploadService for HttpUploader {
    fn name(&self) -> &str {
        &self.name
    }

    fn credentials_expired(&self) -> bool {
        if self.config.token_url.is_none() {
            return false;
        }
        match &self.token {
            Some(token) => Instant::now() + EXPIRY_MARGIN >= token.expires_at,
            None => true,
        }
    }

    #[instrument(name = "http_refresh_credentials", skip(self), fields(uploader = %self.name))]
    async fn refresh_credentials(&mut self) -> Result<(), CatmonError> {
        let Some(token_url) = self.config.token_url.clone() else {
            return Ok(());
        };
        match self.fetch_token(&token_url).await {
            Ok(token) => {
                info!("access token refreshed");
                self.token = Some(token);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "access token refresh failed");
                self.token = None;
                Err(CatmonError::upload("<credentials>", &self.name, e.to_string()))
            }
        }
    }

    #[instrument(
        name = "http_upload",
        skip(self, image, destination),
        fields(uploader = %self.name, image = %image.id, folder = %destination.name)
    )]
    async fn upload(
        &mut self,
        image: &CapturedImage,
        destination: &Destination,
    ) -> Result<(), CatmonError> {
        self.put_file(image, destination).await.map_err(|e| {
            CatmonError::upload(image.id.as_str(), &destination.name, e.to_string())
        })?;
        debug!("image uploaded");
        Ok(())
    }
}
