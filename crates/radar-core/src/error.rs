//! Error types for the Asteroid Radar core library.

use thiserror::Error;

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Asteroid Radar operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The asteroid feed did not have the expected shape.
    #[error("Failed to parse asteroid feed: {0}")]
    FeedParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
