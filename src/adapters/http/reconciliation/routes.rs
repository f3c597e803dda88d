//! Axum router configuration for reconciliation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, receive_webhook, verify_payment, ReconciliationAppState};

/// Gateway webhook routes (no auth, signature verified).
///
/// # Routes
/// - `POST /payments` - Gateway payment notifications
pub fn webhook_routes() -> Router<ReconciliationAppState> {
    Router::new().route("/payments", post(receive_webhook))
}

/// Client confirmation routes.
///
/// # Routes
/// - `POST /verify` - Checkout callback relayed by the payer's browser
pub fn payment_routes() -> Router<ReconciliationAppState> {
    Router::new().route("/verify", post(verify_payment))
}

/// Create the complete reconciliation router.
///
/// ```ignore
/// let app = reconciliation_router().with_state(state);
/// ```
pub fn reconciliation_router() -> Router<ReconciliationAppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhook_routes())
        .nest("/api/payments", payment_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{HeaderName, Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::crypto::AesGcmCipher;
    use crate::adapters::memory::{InMemoryCredentialVault, InMemoryLedger};
    use crate::application::ReconcilePaymentHandler;
    use crate::ports::ServiceRole;

    fn test_state() -> ReconciliationAppState {
        let ledger = Arc::new(InMemoryLedger::new());
        let vault = Arc::new(InMemoryCredentialVault::new(Arc::new(AesGcmCipher::new(&[1u8; 32]))));
        let reconciler = ReconcilePaymentHandler::new(
            ledger.clone(),
            ledger.clone(),
            vault,
            ledger,
            ServiceRole::assume(),
        );
        ReconciliationAppState {
            reconciler: Arc::new(reconciler),
            signature_header: HeaderName::from_static("x-razorpay-signature"),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Router Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn health_route_responds() {
        let app = reconciliation_router().with_state(test_state());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_order_on_webhook_is_404() {
        let app = reconciliation_router().with_state(test_state());
        let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","order_id":"order_x","amount":100,"currency":"INR"}}}}"#;

        let response = app
            .oneshot(
                Request::post("/api/webhooks/payments")
                    .header("x-razorpay-signature", "00")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn garbage_verify_body_is_400() {
        let app = reconciliation_router().with_state(test_state());

        let response = app
            .oneshot(
                Request::post("/api/payments/verify")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_route_rejects_get() {
        let app = reconciliation_router().with_state(test_state());

        let response = app
            .oneshot(Request::get("/api/webhooks/payments").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
