//! Deterministic content fingerprinting
//!
//! Fingerprints are the deduplication key for submitted content: the same
//! content must always produce the same fingerprint, so normalization
//! happens before hashing. Text is case- and whitespace-insensitive; image
//! references are compared by normalized URL; inline image payloads are
//! compared by their decoded bytes.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Data-URI prefix accepted on inline image payloads
const DATA_URI_PREFIX: &str = "data:image";

/// A deterministic, content-derived identity used for deduplication.
///
/// Stored as the lowercase-hex SHA-256 digest of the normalized content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hex digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint text content.
///
/// Normalization: trim, lowercase, collapse internal whitespace runs to a
/// single space. Texts differing only in casing or whitespace density hash
/// identically.
pub fn fingerprint_text(text: &str) -> Fingerprint {
    let lowered = text.to_lowercase();
    let normalized = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    Fingerprint::from_bytes(normalized.as_bytes())
}

/// Fingerprint an image by its URL reference.
///
/// This hashes the normalized URL string, not the fetched bytes: two
/// different URLs serving identical image data are treated as distinct
/// content.
pub fn fingerprint_url(url: &str) -> Fingerprint {
    let normalized = url.trim().to_lowercase();
    Fingerprint::from_bytes(normalized.as_bytes())
}

/// Fingerprint raw content bytes (decoded image data).
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint::from_bytes(bytes)
}

/// Decode an inline base64 image payload, stripping any leading
/// `data:image/...;base64,` scheme prefix.
///
/// Fails with [`Error::InvalidContent`] when the payload is not valid
/// base64.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let encoded = match payload.strip_prefix(DATA_URI_PREFIX) {
        Some(_) => payload
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or(payload),
        None => payload,
    };

    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::invalid_content(format!("undecodable base64 image payload: {e}")))
}
