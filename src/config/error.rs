//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Request timeout of {request_secs}s is shorter than the {required_ms} ms database wait it must cover")]
    RequestTimeoutTooShort { request_secs: u64, required_ms: u128 },

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Lock timeout must be between 1 and 60000 ms")]
    InvalidLockTimeout,

    #[error("Vault master key must be base64 encoding of 32 bytes")]
    InvalidMasterKey,

    #[error("Signature header name is not a valid HTTP header")]
    InvalidSignatureHeader,

    #[error("At least one handled event must be configured")]
    NoHandledEvents,

    #[error("Webhook body limit must be between 1 KiB and 1 MiB")]
    InvalidBodyLimit,
}
