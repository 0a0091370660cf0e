//! ModGate Classification
//!
//! Client and parsing layer between the moderation pipeline and the
//! external classification model.
//!
//! This crate provides:
//! - The [`ClassificationClient`] trait the pipeline depends on
//! - A Gemini `generateContent` HTTP adapter
//! - Prompt construction for the fixed moderation taxonomy
//! - A total verdict parser that degrades gracefully on malformed output

pub mod client;
pub mod gemini;
pub mod prompt;
pub mod verdict;

pub use client::ClassificationClient;
pub use gemini::{GeminiClient, GeminiConfig};
pub use verdict::parse_verdict;
