//! HTTP handlers for the reconciliation endpoints.
//!
//! Both confirmation paths hand the request to the same
//! `ReconcilePaymentHandler`; the handlers only translate HTTP in and out.
//!
//! The pipeline runs on its own task. A request timeout or a dropped
//! connection abandons the response, never a half-finished reconciliation.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::IntoResponse;

use crate::application::{
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconciliationOutcome,
};
use crate::domain::reconciliation::{ConfirmationSource, ReconciliationError};

use super::dto::{ErrorResponse, HealthResponse, ReconciliationResponse, VerifyPaymentRequest};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the reconciliation routes.
#[derive(Clone)]
pub struct ReconciliationAppState {
    pub reconciler: Arc<ReconcilePaymentHandler>,
    /// Header the gateway puts its signature in.
    pub signature_header: HeaderName,
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// `POST /api/webhooks/payments`
///
/// The body is taken as raw bytes; the signature covers exactly what arrived.
pub async fn receive_webhook(
    State(state): State<ReconciliationAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ReconciliationApiError> {
    let signature = headers
        .get(&state.signature_header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = ReconcilePaymentCommand {
        source: ConfirmationSource::Webhook {
            raw_body: body.to_vec(),
            signature,
        },
    };

    let outcome = reconcile(&state, cmd).await?;
    Ok((StatusCode::OK, Json(ReconciliationResponse::from(outcome))))
}

/// `POST /api/payments/verify`
///
/// An unreadable body still goes through the pipeline so it is audited.
pub async fn verify_payment(
    State(state): State<ReconciliationAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ReconciliationApiError> {
    let source = match serde_json::from_slice::<VerifyPaymentRequest>(&body) {
        Ok(request) => ConfirmationSource::Direct {
            order_ref: request.order_ref,
            payment_ref: request.payment_ref,
            signature: request.signature,
        },
        Err(e) => ConfirmationSource::MalformedDirect {
            raw_body: body.to_vec(),
            reason: e.to_string(),
        },
    };

    let outcome = reconcile(&state, ReconcilePaymentCommand { source }).await?;
    Ok((StatusCode::OK, Json(ReconciliationResponse::from(outcome))))
}

/// Runs the pipeline to completion on a separate task.
async fn reconcile(
    state: &ReconciliationAppState,
    cmd: ReconcilePaymentCommand,
) -> Result<ReconciliationOutcome, ReconciliationError> {
    let reconciler = Arc::clone(&state.reconciler);
    tokio::spawn(async move { reconciler.handle(cmd).await })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Reconciliation task aborted");
            ReconciliationError::ApplyFailed(e.to_string())
        })?
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts reconciliation failures to HTTP responses.
#[derive(Debug)]
pub struct ReconciliationApiError(ReconciliationError);

impl From<ReconciliationError> for ReconciliationApiError {
    fn from(err: ReconciliationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ReconciliationApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorResponse::new(self.0.code(), self.0.public_message());
        (self.0.status_code(), Json(body)).into_response()
    }
}
