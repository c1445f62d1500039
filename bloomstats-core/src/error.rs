//! Error types for bloomstats-core

use thiserror::Error;

/// Main error type for the bloomstats-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Client input error: inverted date range, unknown granularity or
    /// retention type token, or an out-of-bounds period. Rejected before
    /// any query is issued.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// The event log collaborator could not answer a query. The whole
    /// request fails; no partial series is returned and no retry happens
    /// inside the core.
    #[error("event log unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for bloomstats-core
pub type Result<T> = std::result::Result<T, Error>;
