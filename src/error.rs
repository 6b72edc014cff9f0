//! Error types for the hark dispatcher

use thiserror::Error;

/// Result type alias for hark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while hearing, dispatching and answering
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Command table could not be parsed or built
    #[error("command table error: {0}")]
    CommandTable(String),

    /// Speech was captured but not understood
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// Speech-to-text or text-to-speech backend unreachable
    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A skill handler failed
    #[error("skill error: {0}")]
    Skill(String),

    /// Chat transport error
    #[error("channel error: {0}")]
    Channel(String),

    /// The input source was closed (e.g. stdin reached EOF)
    #[error("input closed")]
    InputClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the error is a transient speech backend outage worth retrying
    #[must_use]
    pub const fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}
