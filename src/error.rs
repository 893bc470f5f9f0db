//! Error types for RingKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RingError
pub type Result<T> = std::result::Result<T, RingError>;

/// Unified error type for RingKV operations
#[derive(Debug, Error)]
pub enum RingError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Request Errors (never retried)
    // -------------------------------------------------------------------------
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // -------------------------------------------------------------------------
    // Durability Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Discovery Errors
    // -------------------------------------------------------------------------
    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Could not locate server {0} in the catalog")]
    Unresolved(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl RingError {
    /// True for errors caused by the request itself rather than the system.
    ///
    /// These map to an `Invalid Request` response and must never be retried.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, RingError::InvalidRequest(_) | RingError::InvalidPattern(_))
    }
}
