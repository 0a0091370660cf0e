//! Moderation orchestrator
//!
//! One `submit` call walks a submission through the full lifecycle:
//! validate, fingerprint, dedup lookup, request creation, classification,
//! verdict persistence, and, for flagged content, a detached notification
//! dispatch that never blocks or fails the caller's response.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use modgate_classify::{parse_verdict, ClassificationClient};
use modgate_core::{
    fingerprint_bytes, fingerprint_text, fingerprint_url, ContentKind, Error, Fingerprint,
    ModerationStatus, Result, Verdict,
};
use modgate_notify::{truncate_preview, Alert, Dispatcher};
use modgate_store::ModerationStore;

/// Validation bounds applied before any store access
#[derive(Debug, Clone)]
pub struct PipelineLimits {
    /// Maximum accepted text length in characters
    pub max_text_chars: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 10_000,
        }
    }
}

/// Content of one submission
#[derive(Debug, Clone)]
pub enum SubmissionPayload {
    /// Raw text content
    Text(String),

    /// Image fetched from a URL; deduplicated by the URL reference, not
    /// the fetched bytes
    ImageUrl {
        url: String,
        bytes: Vec<u8>,
        mime: String,
    },

    /// Image supplied inline; deduplicated by the decoded bytes
    ImageInline { bytes: Vec<u8>, mime: String },
}

impl SubmissionPayload {
    fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::ImageUrl { .. } | Self::ImageInline { .. } => ContentKind::Image,
        }
    }
}

/// One validated submission entering the pipeline
#[derive(Debug, Clone)]
pub struct Submission {
    /// Submitter identity (email address)
    pub submitter: String,

    /// The content to moderate
    pub payload: SubmissionPayload,
}

impl Submission {
    /// Text submission
    pub fn text(submitter: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            submitter: submitter.into(),
            payload: SubmissionPayload::Text(text.into()),
        }
    }
}

/// Result of one submission
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Identifier of the canonical moderation request
    pub request_id: String,

    /// The verdict returned to the caller
    pub verdict: Verdict,

    /// Whether the verdict was reused from an earlier identical
    /// submission
    pub cached: bool,
}

/// The per-submission state machine.
///
/// All collaborators are injected at construction; the orchestrator holds
/// no mutable state of its own, so one instance serves every concurrent
/// submission.
pub struct Orchestrator {
    store: Arc<dyn ModerationStore>,
    classifier: Arc<dyn ClassificationClient>,
    dispatcher: Arc<Dispatcher>,
    limits: PipelineLimits,
}

impl Orchestrator {
    /// Create an orchestrator with default limits
    pub fn new(
        store: Arc<dyn ModerationStore>,
        classifier: Arc<dyn ClassificationClient>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            store,
            classifier,
            dispatcher,
            limits: PipelineLimits::default(),
        }
    }

    /// Override the validation limits
    pub fn with_limits(mut self, limits: PipelineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Run one submission through the pipeline.
    ///
    /// Identical content (same kind and fingerprint) is classified at
    /// most once: later submissions get the stored verdict back and no
    /// new request, verdict, or notification is produced. The dedup
    /// lookup and request creation are not atomic across calls, so two
    /// concurrent submissions of the same content can both classify and
    /// both alert; eventual dedup is the accepted behavior.
    pub async fn submit(&self, submission: Submission) -> Result<Outcome> {
        self.validate(&submission)?;

        let kind = submission.payload.kind();
        let fingerprint = self.fingerprint(&submission.payload)?;
        metrics::counter!("modgate_submissions_total", "kind" => kind.as_str()).increment(1);

        if let Some(existing) = self
            .store
            .find_by_fingerprint(kind, &fingerprint)
            .await?
        {
            if let Some(verdict) = self.store.latest_verdict(&existing.id).await? {
                metrics::counter!("modgate_cache_hits_total", "kind" => kind.as_str()).increment(1);
                info!(
                    request_id = %existing.id,
                    fingerprint = %fingerprint,
                    "Duplicate content, returning stored verdict"
                );
                return Ok(Outcome {
                    request_id: existing.id,
                    verdict,
                    cached: true,
                });
            }
        }

        let request = self
            .store
            .create_request(&submission.submitter, kind, fingerprint)
            .await?;

        let raw = match self.classify(&submission.payload).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(request_id = %request.id, error = %err, "Classification failed");
                // The caller must see the upstream error even if the
                // status write fails too.
                if let Err(status_err) = self
                    .store
                    .set_status(&request.id, ModerationStatus::Failed)
                    .await
                {
                    error!(request_id = %request.id, error = %status_err, "Failed to mark request failed");
                }
                return Err(err);
            }
        };

        let mut verdict = parse_verdict(&raw);
        // The upstream-reported flag is informational only; an upstream
        // "flagged": false must not suppress alerting for a non-safe
        // classification.
        verdict.flagged = verdict.classification.is_flagged();

        if let Err(err) = self.persist(&request.id, verdict.clone()).await {
            if let Err(status_err) = self
                .store
                .set_status(&request.id, ModerationStatus::Failed)
                .await
            {
                error!(request_id = %request.id, error = %status_err, "Failed to mark request failed");
            }
            return Err(err);
        }

        info!(
            request_id = %request.id,
            classification = %verdict.classification,
            confidence = verdict.confidence,
            "Moderation completed"
        );

        if verdict.flagged {
            self.spawn_dispatch(&submission, &request.id, request.created_at, &verdict);
        }

        Ok(Outcome {
            request_id: request.id,
            verdict,
            cached: false,
        })
    }

    fn validate(&self, submission: &Submission) -> Result<()> {
        if submission.submitter.trim().is_empty() {
            return Err(Error::invalid_input("submitter must not be empty"));
        }

        match &submission.payload {
            SubmissionPayload::Text(text) => {
                if text.trim().is_empty() {
                    return Err(Error::invalid_input("text must not be empty"));
                }
                let chars = text.chars().count();
                if chars > self.limits.max_text_chars {
                    return Err(Error::invalid_input(format!(
                        "text length {chars} exceeds limit of {} characters",
                        self.limits.max_text_chars
                    )));
                }
            }
            SubmissionPayload::ImageUrl { url, bytes, .. } => {
                if url.trim().is_empty() {
                    return Err(Error::invalid_input("image url must not be empty"));
                }
                if bytes.is_empty() {
                    return Err(Error::invalid_input("image payload must not be empty"));
                }
            }
            SubmissionPayload::ImageInline { bytes, .. } => {
                if bytes.is_empty() {
                    return Err(Error::invalid_input("image payload must not be empty"));
                }
            }
        }

        Ok(())
    }

    fn fingerprint(&self, payload: &SubmissionPayload) -> Result<Fingerprint> {
        Ok(match payload {
            SubmissionPayload::Text(text) => fingerprint_text(text),
            SubmissionPayload::ImageUrl { url, .. } => fingerprint_url(url),
            SubmissionPayload::ImageInline { bytes, .. } => fingerprint_bytes(bytes),
        })
    }

    async fn classify(&self, payload: &SubmissionPayload) -> Result<String> {
        let start = Instant::now();
        let result = match payload {
            SubmissionPayload::Text(text) => self.classifier.classify_text(text).await,
            SubmissionPayload::ImageUrl { url, bytes, mime } => {
                let hint = format!("Image from URL: {url}");
                self.classifier.classify_image(bytes, mime, &hint).await
            }
            SubmissionPayload::ImageInline { bytes, mime } => {
                self.classifier
                    .classify_image(bytes, mime, "Image from base64 data")
                    .await
            }
        };
        metrics::histogram!("modgate_classification_latency_us")
            .record(start.elapsed().as_micros() as f64);
        result
    }

    async fn persist(&self, request_id: &str, verdict: Verdict) -> Result<()> {
        self.store.save_verdict(request_id, verdict).await?;
        self.store
            .set_status(request_id, ModerationStatus::Completed)
            .await
    }

    /// Hand the alert to the dispatcher as a detached unit of work.
    ///
    /// The task is spawned rather than awaited: the caller's response is
    /// already final, and cancelling the inbound request must not cancel
    /// the dispatch.
    fn spawn_dispatch(
        &self,
        submission: &Submission,
        request_id: &str,
        request_created_at: chrono::DateTime<chrono::Utc>,
        verdict: &Verdict,
    ) {
        let alert = Alert {
            request_id: request_id.to_string(),
            submitter: submission.submitter.clone(),
            classification: verdict.classification,
            kind: submission.payload.kind(),
            preview: preview_of(&submission.payload),
            confidence: verdict.confidence,
            reasoning: verdict.reasoning.clone(),
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let store = Arc::clone(&self.store);
        let request_id = request_id.to_string();

        tokio::spawn(async move {
            let attempts = dispatcher.dispatch(&alert, request_created_at).await;
            for attempt in attempts {
                if let Err(e) = store.record_notification(&request_id, attempt).await {
                    error!(request_id = %request_id, error = %e, "Failed to record notification attempt");
                }
            }
        });
    }
}

/// Bounded human-readable preview of the submitted content.
fn preview_of(payload: &SubmissionPayload) -> String {
    match payload {
        SubmissionPayload::Text(text) => truncate_preview(text),
        SubmissionPayload::ImageUrl { url, .. } => truncate_preview(&format!("Image from URL: {url}")),
        SubmissionPayload::ImageInline { .. } => "Image from base64 data".to_string(),
    }
}
