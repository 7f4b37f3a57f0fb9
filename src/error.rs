//! Error types for EPGMUX.

use thiserror::Error;

/// Common error type for EPGMUX.
#[derive(Error, Debug)]
pub enum EpgmuxError {
    /// Feed fetch or decode error.
    ///
    /// Per-feed failures are handled locally by the update cycle; this
    /// variant surfaces them where a whole operation depends on the fetch
    /// machinery (for example HTTP client construction).
    #[error("fetch error: {0}")]
    Fetch(#[from] crate::feed::FetchError),

    /// Artifact serialization or compression error.
    ///
    /// A failed publish leaves the previously published artifact current.
    #[error("publish error: {0}")]
    Publish(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for EPGMUX operations.
pub type Result<T> = std::result::Result<T, EpgmuxError>;
