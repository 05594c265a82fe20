//! HTTP mail service client
//!
//! POSTs each message as JSON to `MAILER_URL`. Any non-2xx answer counts
//! as a failed send.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::mailer::{InvitationMailer, InviteMessage};
use crate::types::{Result, TrackerError};

#[derive(Debug, Clone)]
pub struct WebhookMailerConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

pub struct WebhookMailer {
    config: WebhookMailerConfig,
    http_client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(config: WebhookMailerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("scholarship-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TrackerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl InvitationMailer for WebhookMailer {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &InviteMessage) -> Result<()> {
        let mut request = self.http_client.post(&self.config.url).json(message);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, to = %message.to, "Mail service rejected invitation");
            return Err(TrackerError::Mailer(format!(
                "mail service returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        debug!(to = %message.to, "Invitation handed to mail service");
        Ok(())
    }
}
