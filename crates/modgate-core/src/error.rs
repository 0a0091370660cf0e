//! Error types for ModGate

/// Result type alias using ModGate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ModGate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied a malformed or out-of-bounds payload
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Payload could not be decoded into usable content
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Image format outside the supported allow-list
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Payload exceeds the configured size ceiling
    #[error("payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Classification backend unreachable or timed out
    #[error("classification backend unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Classification backend returned a non-success response
    #[error("classification backend error: {0}")]
    Upstream(String),

    /// Persistence failure in the moderation store
    #[error("store error: {0}")]
    Store(String),

    /// Notification channel failure (never crosses the dispatcher boundary)
    #[error("notification error: {0}")]
    Notification(String),
}

impl Error {
    /// Create a new invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new invalid-content error
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        Self::InvalidContent(msg.into())
    }

    /// Create a new unsupported-format error
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create a new upstream-unavailable error
    pub fn upstream_unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create a new upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Stable machine-readable code for this error class.
    ///
    /// Returned to API callers in place of internal error detail.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidContent(_) => "invalid_content",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Upstream(_) => "upstream_error",
            Self::Store(_) => "store_error",
            Self::Notification(_) => "notification_error",
        }
    }

    /// Whether this error class is attributable to the caller.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidContent(_)
                | Self::UnsupportedFormat(_)
                | Self::PayloadTooLarge { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}
