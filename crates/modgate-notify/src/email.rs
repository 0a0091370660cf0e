//! Transactional email channel
//!
//! Delivers alerts through the Brevo SMTP API: one POST per alert with
//! both HTML and plain-text bodies, addressed to the submitter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use modgate_core::{Error, NotificationChannel, Result};

use crate::channel::{Alert, Channel};

/// Email channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Brevo API key
    pub api_key: String,

    /// Sender address shown on outgoing alerts
    pub sender_email: String,

    /// Sender display name
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sender_name() -> String {
    "ModGate Alerts".to_string()
}

fn default_endpoint() -> String {
    "https://api.brevo.com/v3/smtp/email".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Brevo transactional email notification channel
pub struct EmailChannel {
    config: EmailConfig,
    http: reqwest::Client,
}

impl EmailChannel {
    /// Build a channel with a bounded request timeout
    pub fn new(config: EmailConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::notification(format!("failed to build http client: {e}")))?;

        Ok(Self { config, http })
    }

    fn subject(alert: &Alert) -> String {
        format!(
            "Content Moderation Alert - {} Content Detected",
            alert.classification.as_str().to_uppercase()
        )
    }

    fn html_body(alert: &Alert) -> String {
        format!(
            r#"<html>
<body>
    <h2>Content Moderation Alert</h2>
    <p><strong>Classification:</strong> {classification}</p>
    <p><strong>Request ID:</strong> {request_id}</p>
    <p><strong>Submitter:</strong> {submitter}</p>
    <p><strong>Content Type:</strong> {kind}</p>
    <p><strong>Confidence:</strong> {confidence:.0}%</p>
    <p><strong>Content Preview:</strong></p>
    <blockquote>{preview}</blockquote>
    <p><strong>Reasoning:</strong></p>
    <p>{reasoning}</p>
    <hr>
    <p><em>This is an automated alert from ModGate</em></p>
</body>
</html>"#,
            classification = alert.classification.as_str().to_uppercase(),
            request_id = alert.request_id,
            submitter = alert.submitter,
            kind = alert.kind,
            confidence = alert.confidence * 100.0,
            preview = alert.preview,
            reasoning = alert.reasoning,
        )
    }

    fn text_body(alert: &Alert) -> String {
        format!(
            "Content Moderation Alert\n\n\
             Classification: {}\n\
             Request ID: {}\n\
             Submitter: {}\n\
             Content Type: {}\n\
             Confidence: {:.0}%\n\n\
             Content Preview:\n{}\n\n\
             Reasoning:\n{}\n\n\
             ---\n\
             This is an automated alert from ModGate\n",
            alert.classification.as_str().to_uppercase(),
            alert.request_id,
            alert.submitter,
            alert.kind,
            alert.confidence * 100.0,
            alert.preview,
            alert.reasoning,
        )
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn kind(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let recipient_name = alert
            .submitter
            .split('@')
            .next()
            .unwrap_or(alert.submitter.as_str());

        let payload = json!({
            "sender": {
                "name": self.config.sender_name,
                "email": self.config.sender_email,
            },
            "to": [
                { "email": alert.submitter, "name": recipient_name }
            ],
            "subject": Self::subject(alert),
            "htmlContent": Self::html_body(alert),
            "textContent": Self::text_body(alert),
        });

        let response = self
            .http
            .post(&self.config.endpoint)
            .header("accept", "application/json")
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notification(format!("email api call failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::notification(format!(
                "email api returned status {status}"
            )));
        }

        debug!(request_id = %alert.request_id, recipient = %alert.submitter, "Email notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modgate_core::{Classification, ContentKind};

    fn sample_alert() -> Alert {
        Alert {
            request_id: "req_9".to_string(),
            submitter: "someone@example.com".to_string(),
            classification: Classification::Toxic,
            kind: ContentKind::Image,
            preview: "Image from URL: https://example.com/pic.png".to_string(),
            confidence: 0.75,
            reasoning: "harmful imagery".to_string(),
        }
    }

    #[test]
    fn test_subject_names_classification() {
        assert_eq!(
            EmailChannel::subject(&sample_alert()),
            "Content Moderation Alert - TOXIC Content Detected"
        );
    }

    #[test]
    fn test_bodies_carry_alert_context() {
        let alert = sample_alert();
        let html = EmailChannel::html_body(&alert);
        let text = EmailChannel::text_body(&alert);

        for body in [&html, &text] {
            assert!(body.contains("req_9"));
            assert!(body.contains("someone@example.com"));
            assert!(body.contains("TOXIC"));
            assert!(body.contains("75%"));
            assert!(body.contains("harmful imagery"));
        }
        assert!(html.contains("<blockquote>"));
    }
}
