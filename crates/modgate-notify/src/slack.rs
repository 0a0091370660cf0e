//! Slack webhook channel
//!
//! Posts a color-coded attachment to an incoming-webhook URL. The color
//! tracks classification severity so the worst categories stand out in
//! the channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use modgate_core::{Classification, Error, NotificationChannel, Result};

use crate::channel::{Alert, Channel};

/// Slack channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Incoming webhook URL
    pub webhook_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl SlackConfig {
    /// Create a config with the default timeout
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Slack incoming-webhook notification channel
pub struct SlackChannel {
    config: SlackConfig,
    http: reqwest::Client,
}

impl SlackChannel {
    /// Build a channel with a bounded request timeout
    pub fn new(config: SlackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::notification(format!("failed to build http client: {e}")))?;

        Ok(Self { config, http })
    }

    fn build_message(alert: &Alert) -> serde_json::Value {
        json!({
            "attachments": [
                {
                    "color": severity_color(alert.classification),
                    "title": format!(
                        "Content Moderation Alert - {}",
                        alert.classification.as_str().to_uppercase()
                    ),
                    "fields": [
                        { "title": "Request ID", "value": alert.request_id, "short": true },
                        { "title": "Submitter", "value": alert.submitter, "short": true },
                        { "title": "Content Type", "value": alert.kind.as_str(), "short": true },
                        {
                            "title": "Confidence",
                            "value": format!("{:.0}%", alert.confidence * 100.0),
                            "short": true
                        },
                        { "title": "Content Preview", "value": alert.preview, "short": false },
                        { "title": "Reasoning", "value": alert.reasoning, "short": false }
                    ],
                    "footer": "ModGate Content Moderation"
                }
            ]
        })
    }
}

/// Attachment color keyed by classification severity
fn severity_color(classification: Classification) -> &'static str {
    match classification {
        Classification::Toxic => "#ff0000",
        Classification::Harassment => "#ff6600",
        Classification::Inappropriate => "#ffcc00",
        Classification::Spam => "#999999",
        Classification::Safe => "#36a64f",
    }
}

#[async_trait]
impl Channel for SlackChannel {
    fn kind(&self) -> NotificationChannel {
        NotificationChannel::Slack
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let message = Self::build_message(alert);

        let response = self
            .http
            .post(&self.config.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| Error::notification(format!("slack webhook call failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::notification(format!(
                "slack webhook returned status {status}"
            )));
        }

        debug!(request_id = %alert.request_id, "Slack notification delivered");
        Ok(())
    }
}
