//! In-memory moderation store

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::warn;

use modgate_core::{
    ContentKind, Error, Fingerprint, ModerationRequest, ModerationStatus, NotificationAttempt,
    Result, Verdict,
};

use crate::store::{generate_request_id, ModerationStore};

/// Moderation store backed by process memory.
///
/// Intended for tests and zero-setup deployments; everything is lost on
/// restart. Interior mutability keeps the store shareable behind an
/// `Arc` without external locking.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Requests in creation order
    requests: Vec<ModerationRequest>,

    /// Verdicts per request id, in creation order
    verdicts: HashMap<String, Vec<Verdict>>,

    /// Notification attempts per request id, in recording order
    notifications: HashMap<String, Vec<NotificationAttempt>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModerationStore for MemoryStore {
    async fn find_by_fingerprint(
        &self,
        kind: ContentKind,
        fingerprint: &Fingerprint,
    ) -> Result<Option<ModerationRequest>> {
        let inner = self.inner.read();
        Ok(inner
            .requests
            .iter()
            .rev()
            .find(|r| r.kind == kind && &r.fingerprint == fingerprint)
            .cloned())
    }

    async fn latest_verdict(&self, request_id: &str) -> Result<Option<Verdict>> {
        let inner = self.inner.read();
        Ok(inner
            .verdicts
            .get(request_id)
            .and_then(|v| v.last())
            .cloned())
    }

    async fn create_request(
        &self,
        submitter: &str,
        kind: ContentKind,
        fingerprint: Fingerprint,
    ) -> Result<ModerationRequest> {
        let now = Utc::now();
        let request = ModerationRequest {
            id: generate_request_id(),
            submitter: submitter.to_string(),
            kind,
            fingerprint,
            status: ModerationStatus::Processing,
            created_at: now,
            updated_at: now,
        };

        self.inner.write().requests.push(request.clone());
        Ok(request)
    }

    async fn save_verdict(&self, request_id: &str, verdict: Verdict) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.requests.iter().any(|r| r.id == request_id) {
            return Err(Error::store(format!("unknown request: {request_id}")));
        }
        inner
            .verdicts
            .entry(request_id.to_string())
            .or_default()
            .push(verdict);
        Ok(())
    }

    async fn set_status(&self, request_id: &str, status: ModerationStatus) -> Result<()> {
        let mut inner = self.inner.write();
        let request = inner
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| Error::store(format!("unknown request: {request_id}")))?;

        if request.status.is_terminal() {
            warn!(request_id = %request_id, current = ?request.status, "Ignoring status change on terminal request");
            return Ok(());
        }

        request.status = status;
        request.updated_at = Utc::now();
        Ok(())
    }

    async fn record_notification(
        &self,
        request_id: &str,
        attempt: NotificationAttempt,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.requests.iter().any(|r| r.id == request_id) {
            return Err(Error::store(format!("unknown request: {request_id}")));
        }
        inner
            .notifications
            .entry(request_id.to_string())
            .or_default()
            .push(attempt);
        Ok(())
    }

    async fn requests_for_submitter(&self, submitter: &str) -> Result<Vec<ModerationRequest>> {
        let inner = self.inner.read();
        Ok(inner
            .requests
            .iter()
            .filter(|r| r.submitter == submitter)
            .cloned()
            .collect())
    }

    async fn verdicts_for_request(&self, request_id: &str) -> Result<Vec<Verdict>> {
        let inner = self.inner.read();
        Ok(inner.verdicts.get(request_id).cloned().unwrap_or_default())
    }

    async fn notifications_for_request(
        &self,
        request_id: &str,
    ) -> Result<Vec<NotificationAttempt>> {
        let inner = self.inner.read();
        Ok(inner
            .notifications
            .get(request_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn submitters(&self) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut seen = Vec::new();
        for request in &inner.requests {
            if !seen.contains(&request.submitter) {
                seen.push(request.submitter.clone());
            }
        }
        Ok(seen)
    }
}
