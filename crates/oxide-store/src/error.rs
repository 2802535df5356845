//! Error types for the store.

use oxide_store_core::BuildError;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Statement could not be assembled (unknown schema, missing primary
    /// key, wrong builder kind).
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The SQL references a placeholder with no value.
    #[error("no value bound for parameter {0}")]
    UnboundParameter(String),

    /// Mapping between records and typed structs failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reserved for caller-level timeouts; never produced by the store.
    #[error("operation timed out")]
    Timeout,
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, OrmError>;
