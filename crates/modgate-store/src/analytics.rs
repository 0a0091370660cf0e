//! Read-side analytics rollups
//!
//! Pure aggregation over any [`ModerationStore`] implementation. Counts
//! are taken from each request's latest verdict; requests that never
//! reached a verdict (failed submissions) contribute to totals only.

use serde::Serialize;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use modgate_core::{Classification, ContentKind, Result};

use crate::store::ModerationStore;

/// Per-submitter moderation rollup
#[derive(Debug, Clone, Serialize)]
pub struct SubmitterSummary {
    pub submitter: String,
    pub total_requests: usize,
    pub text_requests: usize,
    pub image_requests: usize,
    pub safe_content: usize,
    pub toxic_content: usize,
    pub spam_content: usize,
    pub harassment_content: usize,
    pub inappropriate_content: usize,
    pub flagged_content: usize,
    pub average_confidence: f64,
    pub last_request_at: Option<DateTime<Utc>>,
}

impl SubmitterSummary {
    fn empty(submitter: &str) -> Self {
        Self {
            submitter: submitter.to_string(),
            total_requests: 0,
            text_requests: 0,
            image_requests: 0,
            safe_content: 0,
            toxic_content: 0,
            spam_content: 0,
            harassment_content: 0,
            inappropriate_content: 0,
            flagged_content: 0,
            average_confidence: 0.0,
            last_request_at: None,
        }
    }
}

/// Overall moderation statistics across all submitters
#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub total_submitters: usize,
    pub total_requests: usize,
    pub total_flagged: usize,
    /// Flagged share of all requests, as a percentage rounded to 2 places
    pub flag_rate: f64,
}

/// Overall statistics plus the per-submitter breakdown
#[derive(Debug, Clone, Serialize)]
pub struct OverallSummary {
    pub stats: OverallStats,
    pub submitters: BTreeMap<String, SubmitterSummary>,
}

/// Build the rollup for one submitter.
pub async fn submitter_summary(
    store: &dyn ModerationStore,
    submitter: &str,
) -> Result<SubmitterSummary> {
    let requests = store.requests_for_submitter(submitter).await?;
    if requests.is_empty() {
        return Ok(SubmitterSummary::empty(submitter));
    }

    let mut summary = SubmitterSummary::empty(submitter);
    summary.total_requests = requests.len();

    let mut confidence_sum = 0.0;
    let mut verdict_count = 0usize;

    for request in &requests {
        match request.kind {
            ContentKind::Text => summary.text_requests += 1,
            ContentKind::Image => summary.image_requests += 1,
        }

        summary.last_request_at = match summary.last_request_at {
            Some(prev) if prev >= request.created_at => Some(prev),
            _ => Some(request.created_at),
        };

        let Some(verdict) = store.latest_verdict(&request.id).await? else {
            continue;
        };

        confidence_sum += verdict.confidence;
        verdict_count += 1;

        match verdict.classification {
            Classification::Safe => summary.safe_content += 1,
            Classification::Toxic => summary.toxic_content += 1,
            Classification::Spam => summary.spam_content += 1,
            Classification::Harassment => summary.harassment_content += 1,
            Classification::Inappropriate => summary.inappropriate_content += 1,
        }
        if verdict.classification.is_flagged() {
            summary.flagged_content += 1;
        }
    }

    if verdict_count > 0 {
        summary.average_confidence = round3(confidence_sum / verdict_count as f64);
    }

    Ok(summary)
}

/// Build the rollup across every known submitter.
pub async fn overall_summary(store: &dyn ModerationStore) -> Result<OverallSummary> {
    let mut submitters = BTreeMap::new();

    for submitter in store.submitters().await? {
        let summary = submitter_summary(store, &submitter).await?;
        submitters.insert(submitter, summary);
    }

    let total_requests: usize = submitters.values().map(|s| s.total_requests).sum();
    let total_flagged: usize = submitters.values().map(|s| s.flagged_content).sum();
    let flag_rate = if total_requests > 0 {
        round2(total_flagged as f64 / total_requests as f64 * 100.0)
    } else {
        0.0
    };

    Ok(OverallSummary {
        stats: OverallStats {
            total_submitters: submitters.len(),
            total_requests,
            total_flagged,
            flag_rate,
        },
        submitters,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use modgate_core::{fingerprint_text, ModerationStatus, Verdict};

    async fn seed_request(
        store: &MemoryStore,
        submitter: &str,
        text: &str,
        classification: Classification,
        confidence: f64,
    ) {
        let request = store
            .create_request(submitter, ContentKind::Text, fingerprint_text(text))
            .await
            .unwrap();
        store
            .save_verdict(
                &request.id,
                Verdict {
                    classification,
                    confidence,
                    reasoning: String::new(),
                    flagged: classification.is_flagged(),
                    raw_response: String::new(),
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        store
            .set_status(&request.id, ModerationStatus::Completed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submitter_summary_counts_by_classification() {
        let store = MemoryStore::new();
        seed_request(&store, "a@x.com", "one", Classification::Safe, 0.9).await;
        seed_request(&store, "a@x.com", "two", Classification::Toxic, 0.8).await;
        seed_request(&store, "a@x.com", "three", Classification::Harassment, 0.7).await;
        seed_request(&store, "b@x.com", "four", Classification::Safe, 0.6).await;

        let summary = submitter_summary(&store, "a@x.com").await.unwrap();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.text_requests, 3);
        assert_eq!(summary.safe_content, 1);
        assert_eq!(summary.toxic_content, 1);
        assert_eq!(summary.harassment_content, 1);
        assert_eq!(summary.flagged_content, 2);
        assert_eq!(summary.average_confidence, 0.8);
        assert!(summary.last_request_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_submitter_yields_empty_summary() {
        let store = MemoryStore::new();
        let summary = submitter_summary(&store, "nobody@x.com").await.unwrap();
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.average_confidence, 0.0);
        assert!(summary.last_request_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_requests_count_toward_totals_only() {
        let store = MemoryStore::new();
        let request = store
            .create_request("a@x.com", ContentKind::Text, fingerprint_text("failed"))
            .await
            .unwrap();
        store
            .set_status(&request.id, ModerationStatus::Failed)
            .await
            .unwrap();

        let summary = submitter_summary(&store, "a@x.com").await.unwrap();
        assert_eq!(summary.total_requests, 1);
        assert_eq!(summary.flagged_content, 0);
        assert_eq!(summary.average_confidence, 0.0);
    }

    #[tokio::test]
    async fn test_overall_summary_flag_rate() {
        let store = MemoryStore::new();
        seed_request(&store, "a@x.com", "one", Classification::Safe, 0.9).await;
        seed_request(&store, "a@x.com", "two", Classification::Spam, 0.8).await;
        seed_request(&store, "b@x.com", "three", Classification::Toxic, 0.7).await;

        let overall = overall_summary(&store).await.unwrap();
        assert_eq!(overall.stats.total_submitters, 2);
        assert_eq!(overall.stats.total_requests, 3);
        assert_eq!(overall.stats.total_flagged, 2);
        assert_eq!(overall.stats.flag_rate, 66.67);
        assert!(overall.submitters.contains_key("a@x.com"));
    }
}
