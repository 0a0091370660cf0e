//! Moderation store trait

use async_trait::async_trait;

use modgate_core::{
    ContentKind, Fingerprint, ModerationRequest, ModerationStatus, NotificationAttempt, Result,
    Verdict,
};

/// Durable record of moderation requests, their verdicts, and notification
/// outcomes.
///
/// Each operation is atomic from the caller's viewpoint, but no
/// transactional guarantee exists across calls: the pipeline composes
/// them sequentially and accepts the resulting duplicate-check race (two
/// concurrent identical submissions may both pass `find_by_fingerprint`
/// and both create a request).
#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Find the most recently created request matching the dedup key.
    async fn find_by_fingerprint(
        &self,
        kind: ContentKind,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ModerationRequest>>;

    /// Latest verdict for a request, by creation order.
    async fn latest_verdict(&self, request_id: &str) -> Result<Option<Verdict>>;

    /// Create a new request in `processing` status. The store assigns the
    /// identifier and timestamps.
    async fn create_request(
        &self,
        submitter: &str,
        kind: ContentKind,
        fingerprint: Fingerprint,
    ) -> Result<ModerationRequest>;

    /// Append a verdict to a request.
    async fn save_verdict(&self, request_id: &str, verdict: Verdict) -> Result<()>;

    /// Transition a request's lifecycle status. Requests already in a
    /// terminal status are left untouched.
    async fn set_status(&self, request_id: &str, status: ModerationStatus) -> Result<()>;

    /// Append a notification attempt to a request.
    async fn record_notification(
        &self,
        request_id: &str,
        attempt: NotificationAttempt,
    ) -> Result<()>;

    /// All requests for one submitter, in creation order.
    async fn requests_for_submitter(&self, submitter: &str) -> Result<Vec<ModerationRequest>>;

    /// All verdicts for a request, in creation order.
    async fn verdicts_for_request(&self, request_id: &str) -> Result<Vec<Verdict>>;

    /// All notification attempts for a request, in recording order.
    async fn notifications_for_request(
        &self,
        request_id: &str,
    ) -> Result<Vec<NotificationAttempt>>;

    /// Distinct submitter identities, in first-seen order.
    async fn submitters(&self) -> Result<Vec<String>>;
}

/// Generate a store-assigned request identifier.
pub(crate) fn generate_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4())
}
