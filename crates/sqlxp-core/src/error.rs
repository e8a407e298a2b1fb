//! Error types for sqlxp

use thiserror::Error;

/// Core error type for sqlxp operations
#[derive(Error, Debug)]
pub enum SqlxpError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    /// Column metadata for a result set could not be read
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// A row's values could not be read into slots
    #[error("Scan error: {0}")]
    Scan(String),

    /// The cursor failed after it stopped yielding rows
    #[error("Cursor error: {0}")]
    Cursor(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for sqlxp operations
pub type Result<T> = std::result::Result<T, SqlxpError>;
