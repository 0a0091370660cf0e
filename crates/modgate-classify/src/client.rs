//! Classification client trait

use async_trait::async_trait;
use modgate_core::Result;

/// Trait for classification backends.
///
/// Implementations send content to an external model and return its raw
/// textual response. No retries happen at this layer; a failed call
/// surfaces as [`modgate_core::Error::UpstreamUnavailable`] (network,
/// timeout) or [`modgate_core::Error::Upstream`] (non-success response).
#[async_trait]
pub trait ClassificationClient: Send + Sync {
    /// Classify text content, returning the raw model response
    async fn classify_text(&self, text: &str) -> Result<String>;

    /// Classify image content, returning the raw model response.
    ///
    /// `hint` is a short human-readable description of where the image
    /// came from, included in the prompt for context.
    async fn classify_image(&self, bytes: &[u8], mime: &str, hint: &str) -> Result<String>;

    /// Get the client name
    fn name(&self) -> &str;
}
