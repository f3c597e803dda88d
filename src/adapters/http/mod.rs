//! HTTP adapters - REST API implementations.

pub mod reconciliation;

pub use reconciliation::{reconciliation_router, ReconciliationAppState};
