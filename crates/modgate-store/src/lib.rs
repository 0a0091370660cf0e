//! ModGate Store
//!
//! Persistence layer for moderation requests, verdicts, and notification
//! attempts.
//!
//! This crate provides:
//! - The [`ModerationStore`] trait the pipeline composes against
//! - An in-memory store for tests and zero-setup deployments
//! - An append-only JSON-lines store with an in-memory index
//! - Read-side analytics rollups over any store implementation

pub mod analytics;
pub mod jsonl;
pub mod memory;
pub mod store;

pub use analytics::{
    overall_summary, submitter_summary, OverallStats, OverallSummary, SubmitterSummary,
};
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use store::ModerationStore;
