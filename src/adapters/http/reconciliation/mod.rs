//! HTTP adapter for payment reconciliation.
//!
//! - `POST /api/webhooks/payments` - Gateway webhook (raw body, signature header)
//! - `POST /api/payments/verify` - Direct client-side confirmation
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{ReconciliationApiError, ReconciliationAppState};
pub use routes::{payment_routes, reconciliation_router, webhook_routes};
