//! Notification channel trait and alert context

use async_trait::async_trait;
use modgate_core::{Classification, ContentKind, NotificationChannel, Result};

/// Maximum characters of content carried in an alert preview
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Context handed to every channel for one flagged submission
#[derive(Debug, Clone)]
pub struct Alert {
    /// Identifier of the moderation request that triggered the alert
    pub request_id: String,

    /// Submitter identity (email address)
    pub submitter: String,

    /// Classification that caused the flag
    pub classification: Classification,

    /// Kind of the flagged content
    pub kind: ContentKind,

    /// Bounded content preview, already truncated
    pub preview: String,

    /// Model confidence in the classification
    pub confidence: f64,

    /// Model reasoning for the classification
    pub reasoning: String,
}

/// Trait for notification delivery mechanisms.
///
/// A channel performs exactly one delivery per call and reports the
/// outcome; it must not retry internally. Errors are recorded by the
/// dispatcher and never reach the submission caller.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Which channel this adapter delivers to
    fn kind(&self) -> NotificationChannel;

    /// Deliver the alert
    async fn send(&self, alert: &Alert) -> Result<()>;
}

/// Truncate content to [`PREVIEW_MAX_CHARS`] characters, appending a
/// marker when anything was cut. Operates on characters, not bytes, so
/// multi-byte content stays valid.
pub fn truncate_preview(content: &str) -> String {
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_content_is_untouched() {
        assert_eq!(truncate_preview("short"), "short");
        assert_eq!(truncate_preview(""), "");
    }

    #[test]
    fn test_long_content_is_cut_with_marker() {
        let long = "x".repeat(500);
        let preview = truncate_preview(&long);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_exact_boundary_has_no_marker() {
        let exact = "y".repeat(PREVIEW_MAX_CHARS);
        assert_eq!(truncate_preview(&exact), exact);
    }

    #[test]
    fn test_multibyte_content_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let preview = truncate_preview(&long);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
    }
}
