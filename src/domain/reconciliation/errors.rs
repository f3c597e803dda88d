//! Reconciliation failure taxonomy.
//!
//! Each variant maps to an HTTP status that drives the gateway's redelivery
//! policy. A duplicate capture is not an error; it is reported through
//! `ReconciliationOutcome::DuplicatePayment`.

use axum::http::StatusCode;
use thiserror::Error;

/// Terminal failures of a single inbound confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// Body could not be parsed or lacks a required field.
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    /// No payment intent matches the order reference.
    #[error("Payment intent not found for order '{0}'")]
    IntentNotFound(String),

    /// The tenant has no usable signing secret configured.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Presented signature does not match the body.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// The atomic apply step rolled back; redelivery may succeed.
    #[error("Apply failed: {0}")]
    ApplyFailed(String),

    /// Attempted read or write across tenant boundaries.
    #[error("Read-only violation: {0}")]
    ReadOnlyViolation(String),
}

impl ReconciliationError {
    /// Returns true if the gateway should redeliver.
    ///
    /// Only the apply step is transient. Verification failures and malformed
    /// input are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconciliationError::ApplyFailed(_))
    }

    /// Maps the error to the HTTP status returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReconciliationError::MalformedNotification(_) => StatusCode::BAD_REQUEST,
            ReconciliationError::SignatureInvalid => StatusCode::UNAUTHORIZED,
            ReconciliationError::ReadOnlyViolation(_) => StatusCode::FORBIDDEN,
            ReconciliationError::IntentNotFound(_) => StatusCode::NOT_FOUND,
            ReconciliationError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ReconciliationError::ApplyFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ReconciliationError::MalformedNotification(_) => "MALFORMED_NOTIFICATION",
            ReconciliationError::IntentNotFound(_) => "INTENT_NOT_FOUND",
            ReconciliationError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            ReconciliationError::SignatureInvalid => "SIGNATURE_INVALID",
            ReconciliationError::ApplyFailed(_) => "APPLY_FAILED",
            ReconciliationError::ReadOnlyViolation(_) => "READ_ONLY_VIOLATION",
        }
    }

    /// Message safe to return to an unauthenticated caller.
    ///
    /// Internal detail (secret names, store errors) stays in the audit log.
    pub fn public_message(&self) -> String {
        match self {
            ReconciliationError::MalformedNotification(msg) => {
                format!("Malformed notification: {}", msg)
            }
            ReconciliationError::IntentNotFound(_) => "Payment intent not found".to_string(),
            ReconciliationError::ConfigurationError(_) => {
                "Payment gateway is not configured for this tenant".to_string()
            }
            ReconciliationError::SignatureInvalid => "Invalid signature".to_string(),
            ReconciliationError::ApplyFailed(_) => {
                "Payment could not be applied, retry later".to_string()
            }
            ReconciliationError::ReadOnlyViolation(_) => "Forbidden".to_string(),
        }
    }
}
