//! Core types for ModGate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of submitted content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
}

impl ContentKind {
    /// Lowercase wire name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a moderation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ModerationStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Classification taxonomy returned by the upstream model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Safe,
    Toxic,
    Spam,
    Harassment,
    Inappropriate,
}

impl Classification {
    /// Parse a label, mapping unknown or missing values to `Safe`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "toxic" => Self::Toxic,
            "spam" => Self::Spam,
            "harassment" => Self::Harassment,
            "inappropriate" => Self::Inappropriate,
            _ => Self::Safe,
        }
    }

    /// Lowercase wire name for this classification
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Toxic => "toxic",
            Self::Spam => "spam",
            Self::Harassment => "harassment",
            Self::Inappropriate => "inappropriate",
        }
    }

    /// Anything other than `safe` counts as flagged.
    pub fn is_flagged(&self) -> bool {
        !matches!(self, Self::Safe)
    }

    /// Relative severity used for alert presentation (higher is worse).
    pub fn severity_rank(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Spam => 1,
            Self::Inappropriate => 2,
            Self::Harassment => 3,
            Self::Toxic => 4,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One moderation request, created at first sight of a distinct
/// (submitter, content, kind) combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRequest {
    /// Store-assigned identifier (`req_<uuid>`)
    pub id: String,

    /// Submitter identity (email address)
    pub submitter: String,

    /// Kind of the submitted content
    pub kind: ContentKind,

    /// Deduplication fingerprint of the normalized content
    pub fingerprint: crate::Fingerprint,

    /// Current lifecycle status
    pub status: ModerationStatus,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last status-change time
    pub updated_at: DateTime<Utc>,
}

/// Structured classification outcome for one moderation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Classification label
    pub classification: Classification,

    /// Confidence score, always within [0.0, 1.0]
    pub confidence: f64,

    /// Free-text explanation from the upstream model (may be empty)
    pub reasoning: String,

    /// Whether the content was flagged; recomputed from the
    /// classification by the pipeline, never trusted from upstream
    pub flagged: bool,

    /// Full raw upstream response, retained for audit
    pub raw_response: String,

    /// Creation time; orders verdicts within a request
    pub created_at: DateTime<Utc>,
}

/// Notification delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Slack,
    Email,
}

impl NotificationChannel {
    /// Lowercase wire name for this channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single channel delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationOutcome {
    Sent,
    Failed,
}

/// One delivery attempt for one (request, channel) pair, immutable once
/// recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAttempt {
    /// Channel this attempt went through
    pub channel: NotificationChannel,

    /// Whether the delivery succeeded
    pub outcome: NotificationOutcome,

    /// Error detail, present iff the delivery failed
    pub error: Option<String>,

    /// Anchored to the owning request's creation time rather than the
    /// wall time of the send
    pub sent_at: DateTime<Utc>,
}

impl NotificationAttempt {
    /// Record a successful delivery
    pub fn sent(channel: NotificationChannel, sent_at: DateTime<Utc>) -> Self {
        Self {
            channel,
            outcome: NotificationOutcome::Sent,
            error: None,
            sent_at,
        }
    }

    /// Record a failed delivery with its error detail
    pub fn failed(
        channel: NotificationChannel,
        error: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            channel,
            outcome: NotificationOutcome::Failed,
            error: Some(error.into()),
            sent_at,
        }
    }
}
