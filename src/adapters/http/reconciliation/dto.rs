//! Request and response bodies for the reconciliation endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ReconciliationOutcome;
use crate::domain::ledger::FeeStatus;

/// Client-side confirmation returned by the gateway checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_ref: String,
    pub payment_ref: String,
    pub signature: String,
}

/// Body returned for every acknowledged confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    /// `applied`, `duplicate`, `attempt_failed` or `ignored`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_status: Option<FeeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<Decimal>,
}

impl From<ReconciliationOutcome> for ReconciliationResponse {
    fn from(outcome: ReconciliationOutcome) -> Self {
        match outcome {
            ReconciliationOutcome::Applied {
                payment_id,
                fee_status,
                amount_paid,
                ..
            } => Self {
                status: "applied".to_string(),
                payment_id: Some(payment_id.to_string()),
                fee_status: Some(fee_status),
                amount_paid: Some(amount_paid),
            },
            ReconciliationOutcome::DuplicatePayment { payment_id, .. } => Self {
                status: "duplicate".to_string(),
                payment_id: Some(payment_id.to_string()),
                fee_status: None,
                amount_paid: None,
            },
            ReconciliationOutcome::AttemptFailed { .. } => Self {
                status: "attempt_failed".to_string(),
                payment_id: None,
                fee_status: None,
                amount_paid: None,
            },
            ReconciliationOutcome::Ignored { .. } => Self {
                status: "ignored".to_string(),
                payment_id: None,
                fee_status: None,
                amount_paid: None,
            },
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
