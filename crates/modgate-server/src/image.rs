//! Image acquisition and validation
//!
//! Resolves a URL or inline base64 payload into `(bytes, mime)` before
//! the pipeline sees it. Formats are identified from magic bytes, never
//! from file extensions or caller-supplied headers, and checked against a
//! fixed allow-list.

use std::time::Duration;
use tracing::debug;

use modgate_core::{decode_image_payload, Error, Result};

/// Supported image formats, by sniffed MIME type
pub const SUPPORTED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

/// Fetches and validates image payloads
pub struct ImageFetcher {
    http: reqwest::Client,
    max_bytes: usize,
}

impl ImageFetcher {
    /// Build a fetcher with a bounded download timeout
    pub fn new(max_bytes: usize, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::invalid_content(format!("failed to build http client: {e}")))?;

        Ok(Self { http, max_bytes })
    }

    /// Download an image from a URL and validate it.
    pub async fn fetch_url(&self, url: &str) -> Result<(Vec<u8>, String)> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::invalid_content(format!("failed to download image: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::invalid_content(format!(
                "image download returned status {status}"
            )));
        }

        // Reject early when the server declares an oversized body.
        if let Some(declared) = response.content_length() {
            if declared as usize > self.max_bytes {
                return Err(Error::PayloadTooLarge {
                    size: declared as usize,
                    limit: self.max_bytes,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::invalid_content(format!("failed to read image body: {e}")))?
            .to_vec();

        let mime = self.validate(&bytes)?;
        debug!(url = %url, size = bytes.len(), mime = %mime, "Image fetched from URL");
        Ok((bytes, mime))
    }

    /// Decode an inline base64 payload and validate it.
    pub fn decode_inline(&self, payload: &str) -> Result<(Vec<u8>, String)> {
        let bytes = decode_image_payload(payload)?;
        let mime = self.validate(&bytes)?;
        debug!(size = bytes.len(), mime = %mime, "Image decoded from inline payload");
        Ok((bytes, mime))
    }

    fn validate(&self, bytes: &[u8]) -> Result<String> {
        if bytes.len() > self.max_bytes {
            return Err(Error::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        match sniff_mime(bytes) {
            Some(mime) => Ok(mime.to_string()),
            None => Err(Error::unsupported_format(
                "image format not recognized; supported: JPEG, PNG, GIF, BMP, WEBP",
            )),
        }
    }
}

/// Identify an image format from its leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
