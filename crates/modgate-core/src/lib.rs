//! ModGate Core
//!
//! Core types, errors, and utilities shared across ModGate components.
//!
//! This crate provides:
//! - Common types for moderation requests, verdicts, and notification attempts
//! - Error types and result handling
//! - Deterministic content fingerprinting for deduplication

pub mod error;
pub mod fingerprint;
pub mod types;

pub use error::{Error, Result};
pub use fingerprint::{
    decode_image_payload, fingerprint_bytes, fingerprint_text, fingerprint_url, Fingerprint,
};
pub use types::{
    Classification, ContentKind, ModerationRequest, ModerationStatus, NotificationAttempt,
    NotificationChannel, NotificationOutcome, Verdict,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::fingerprint::Fingerprint;
    pub use crate::types::{
        Classification, ContentKind, ModerationRequest, ModerationStatus, NotificationAttempt,
        NotificationChannel, NotificationOutcome, Verdict,
    };
}
