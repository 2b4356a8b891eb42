//! Storage error types.
//!
//! Returned by every storage backend and by adapter construction.

use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Dialing the database or preparing its index failed. Fatal at startup.
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),
    #[error("Tenant not allowed: {0}")]
    TenantNotAllowed(String),
    #[error("Operation timed out: {operation}")]
    Timeout { operation: &'static str },
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound(err.to_string()),
            other => StorageError::Query(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations; uses [`StorageError`].
pub type Result<T> = std::result::Result<T, StorageError>;
