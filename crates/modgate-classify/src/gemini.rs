//! Gemini `generateContent` HTTP adapter
//!
//! Sends moderation prompts to the Google Gemini REST API:
//! ```text
//! POST {endpoint}/models/{model}:generateContent?key=...
//! {"contents":[{"parts":[{"text":"..."},{"inlineData":{"mimeType":"image/png","data":"..."}}]}]}
//! ```
//! The response text is recovered by walking candidates -> content ->
//! parts and concatenating part texts.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use modgate_core::{Error, Result};

use crate::client::ClassificationClient;
use crate::prompt;

/// Gemini client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Gemini REST API
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl GeminiConfig {
    /// Create a config with defaults for everything but the API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// HTTP client for the Gemini classification backend
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Build a client with a bounded request timeout
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::upstream(format!("failed to build http client: {e}")))?;

        Ok(Self { config, http })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(self.url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::upstream_unavailable(format!("gemini request failed: {e}"))
                } else {
                    Error::upstream(format!("gemini request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "gemini returned status {status}"
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("undecodable gemini response: {e}")))?;

        let text = extract_text(&body);
        if text.is_empty() {
            return Err(Error::upstream("gemini returned no candidate text"));
        }

        debug!(model = %self.config.model, chars = text.len(), "Received classification response");
        Ok(text)
    }
}

#[async_trait]
impl ClassificationClient for GeminiClient {
    async fn classify_text(&self, text: &str) -> Result<String> {
        let parts = vec![Part::text(prompt::text_prompt(text))];
        self.generate(parts).await
    }

    async fn classify_image(&self, bytes: &[u8], mime: &str, hint: &str) -> Result<String> {
        let parts = vec![
            Part::text(prompt::image_prompt(hint)),
            Part::inline_data(mime, bytes),
        ];
        self.generate(parts).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Concatenate all part texts from the first-to-last candidates.
fn extract_text(response: &GenerateContentResponse) -> String {
    let mut texts = Vec::new();
    for candidate in &response.candidates {
        if let Some(ref content) = candidate.content {
            for part in &content.parts {
                if let Some(ref text) = part.text {
                    if !text.is_empty() {
                        texts.push(text.as_str());
                    }
                }
            }
        }
    }
    texts.join("\n")
}

// =============================================================================
// Gemini Request/Response Structures
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime: &str, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(&response), "first\nsecond");
    }

    #[test]
    fn test_extract_text_handles_empty_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(extract_text(&response), "");

        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(extract_text(&response), "");
    }

    #[test]
    fn test_extract_text_skips_textless_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": ""}, {"text": "kept"}]}},
                {"content": null}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(&response), "kept");
    }

    #[test]
    fn test_request_serializes_inline_data_as_camel_case() {
        let part = Part::inline_data("image/png", b"abc");
        let json = serde_json::to_value(&part).unwrap();
        assert!(json.get("inlineData").is_some());
        assert_eq!(json["inlineData"]["mimeType"], "image/png");
    }

    #[test]
    fn test_url_includes_model_and_action() {
        let client = GeminiClient::new(GeminiConfig::new("key")).unwrap();
        assert!(client.url().ends_with("/models/gemini-1.5-flash:generateContent"));
    }
}
