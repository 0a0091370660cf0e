//! Per-channel alert fan-out
//!
//! The dispatcher runs after the submission response has already been
//! handed back to the caller, so nothing here can affect the submission
//! outcome. Channels are attempted independently: one channel failing is
//! recorded and the remaining channels still run.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use modgate_core::NotificationAttempt;

use crate::channel::{Alert, Channel};

/// Fans one alert out to every configured channel
#[derive(Clone, Default)]
pub struct Dispatcher {
    channels: Vec<Arc<dyn Channel>>,
}

impl Dispatcher {
    /// Create a dispatcher with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel to the fan-out set
    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Number of configured channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver the alert to every channel, one attempt record per
    /// channel.
    ///
    /// Successful attempts are stamped with the owning request's creation
    /// time rather than the send wall time. Safe classifications are
    /// skipped outright even if a caller hands one in.
    pub async fn dispatch(
        &self,
        alert: &Alert,
        request_created_at: DateTime<Utc>,
    ) -> Vec<NotificationAttempt> {
        if !alert.classification.is_flagged() {
            info!(request_id = %alert.request_id, "Content is safe, skipping notifications");
            return Vec::new();
        }

        let mut attempts = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let kind = channel.kind();
            match channel.send(alert).await {
                Ok(()) => {
                    metrics::counter!("modgate_notifications_total", "channel" => kind.as_str(), "outcome" => "sent")
                        .increment(1);
                    info!(request_id = %alert.request_id, channel = %kind, "Notification sent");
                    attempts.push(NotificationAttempt::sent(kind, request_created_at));
                }
                Err(e) => {
                    metrics::counter!("modgate_notifications_total", "channel" => kind.as_str(), "outcome" => "failed")
                        .increment(1);
                    warn!(request_id = %alert.request_id, channel = %kind, error = %e, "Notification failed");
                    attempts.push(NotificationAttempt::failed(
                        kind,
                        e.to_string(),
                        request_created_at,
                    ));
                }
            }
        }

        attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use modgate_core::{
        Classification, ContentKind, Error, NotificationChannel, NotificationOutcome, Result,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingChannel {
        kind: NotificationChannel,
        fail: bool,
        calls: AtomicUsize,
    }

    impl RecordingChannel {
        fn new(kind: NotificationChannel, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn kind(&self) -> NotificationChannel {
            self.kind
        }

        async fn send(&self, _alert: &Alert) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::notification("simulated outage"))
            } else {
                Ok(())
            }
        }
    }

    fn flagged_alert() -> Alert {
        Alert {
            request_id: "req_42".to_string(),
            submitter: "user@example.com".to_string(),
            classification: Classification::Toxic,
            kind: ContentKind::Text,
            preview: "bad".to_string(),
            confidence: 0.9,
            reasoning: "hostile".to_string(),
        }
    }

    #[tokio::test]
    async fn test_one_failing_channel_does_not_block_others() {
        let slack = RecordingChannel::new(NotificationChannel::Slack, true);
        let email = RecordingChannel::new(NotificationChannel::Email, false);
        let dispatcher = Dispatcher::new()
            .with_channel(slack.clone())
            .with_channel(email.clone());

        let anchored = Utc::now();
        let attempts = dispatcher.dispatch(&flagged_alert(), anchored).await;

        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].outcome, NotificationOutcome::Failed);
        assert!(attempts[0].error.as_deref().unwrap().contains("simulated outage"));
        assert_eq!(attempts[1].outcome, NotificationOutcome::Sent);
        assert!(attempts[1].error.is_none());

        assert_eq!(slack.calls.load(Ordering::SeqCst), 1);
        assert_eq!(email.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sent_attempts_anchor_to_request_creation() {
        let email = RecordingChannel::new(NotificationChannel::Email, false);
        let dispatcher = Dispatcher::new().with_channel(email);

        let anchored = Utc::now() - chrono::Duration::minutes(5);
        let attempts = dispatcher.dispatch(&flagged_alert(), anchored).await;

        assert_eq!(attempts[0].sent_at, anchored);
    }

    #[tokio::test]
    async fn test_safe_alert_is_skipped_entirely() {
        let slack = RecordingChannel::new(NotificationChannel::Slack, false);
        let dispatcher = Dispatcher::new().with_channel(slack.clone());

        let mut alert = flagged_alert();
        alert.classification = Classification::Safe;
        let attempts = dispatcher.dispatch(&alert, Utc::now()).await;

        assert!(attempts.is_empty());
        assert_eq!(slack.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_dispatcher_records_nothing() {
        let dispatcher = Dispatcher::new();
        let attempts = dispatcher.dispatch(&flagged_alert(), Utc::now()).await;
        assert!(attempts.is_empty());
        assert_eq!(dispatcher.channel_count(), 0);
    }
}
