//! ModGate Pipeline
//!
//! The moderation orchestrator: the per-submission state machine tying
//! together fingerprinting, deduplication, classification, persistence,
//! and alert hand-off.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, Outcome, PipelineLimits, Submission, SubmissionPayload};
