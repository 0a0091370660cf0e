//! Server configuration
//!
//! Loaded from a YAML file with CLI overrides; secrets come from the
//! environment (`MODGATE_GEMINI_API_KEY`, `MODGATE_SLACK_WEBHOOK_URL`,
//! `MODGATE_BREVO_API_KEY`) so they never have to live in the config
//! file. Channels whose secrets are absent are simply not configured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use modgate_classify::GeminiConfig;
use modgate_notify::{EmailConfig, SlackConfig};

/// Environment variable carrying the Gemini API key
pub const ENV_GEMINI_API_KEY: &str = "MODGATE_GEMINI_API_KEY";

/// Environment variable carrying the Slack webhook URL
pub const ENV_SLACK_WEBHOOK_URL: &str = "MODGATE_SLACK_WEBHOOK_URL";

/// Environment variable carrying the Brevo API key
pub const ENV_BREVO_API_KEY: &str = "MODGATE_BREVO_API_KEY";

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Persistence backend selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gemini classification backend
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,

    /// Slack alert channel (optional)
    #[serde(default)]
    pub slack: Option<SlackConfig>,

    /// Email alert channel (optional)
    #[serde(default)]
    pub email: Option<EmailConfig>,

    /// Validation and acquisition limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl ServerConfig {
    /// Load configuration from a file (when present) and merge in
    /// environment-provided secrets.
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        config.merge_env();
        Ok(config)
    }

    /// Overlay secrets from the environment onto the file-provided
    /// configuration.
    fn merge_env(&mut self) {
        if let Ok(key) = std::env::var(ENV_GEMINI_API_KEY) {
            match self.gemini {
                Some(ref mut gemini) => gemini.api_key = key,
                None => self.gemini = Some(GeminiConfig::new(key)),
            }
        }

        if let Ok(url) = std::env::var(ENV_SLACK_WEBHOOK_URL) {
            match self.slack {
                Some(ref mut slack) => slack.webhook_url = url,
                None => self.slack = Some(SlackConfig::new(url)),
            }
        }

        if let Ok(key) = std::env::var(ENV_BREVO_API_KEY) {
            if let Some(ref mut email) = self.email {
                email.api_key = key;
            }
            // An email channel needs a sender address from the config
            // file; a bare API key is not enough to construct one.
        }
    }
}

/// Persistence backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to run against
    #[serde(default)]
    pub backend: StorageBackend,

    /// Data directory for the jsonl backend
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-process store
    Memory,
    /// Append-only JSON-lines log under `storage.data_dir`
    #[default]
    Jsonl,
}

/// Validation and image-acquisition limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted text length in characters
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Maximum accepted image payload in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Timeout for fetching an image URL, in seconds
    #[serde(default = "default_image_fetch_timeout_secs")]
    pub image_fetch_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            max_image_bytes: default_max_image_bytes(),
            image_fetch_timeout_secs: default_image_fetch_timeout_secs(),
        }
    }
}

fn default_max_text_chars() -> usize {
    10_000
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_image_fetch_timeout_secs() -> u64 {
    30
}
