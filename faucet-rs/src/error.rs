//! Error types for faucet-rs

use std::time::Duration;
use thiserror::Error;

/// Result type alias for faucet operations
pub type Result<T> = std::result::Result<T, FaucetError>;

/// Faucet error types
#[derive(Error, Debug)]
pub enum FaucetError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ledger could not be read, parsed or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The disbursement service rejected or failed the transfer
    #[error("Disbursement error: {0}")]
    Disbursement(String),

    /// The disbursement service did not answer in time
    #[error("Disbursement timed out after {0:?}")]
    Timeout(Duration),
}

impl From<config::ConfigError> for FaucetError {
    fn from(e: config::ConfigError) -> Self {
        FaucetError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for FaucetError {
    fn from(e: reqwest::Error) -> Self {
        FaucetError::Disbursement(e.to_string())
    }
}
