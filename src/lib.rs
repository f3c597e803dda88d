//! Fee Reconciler - Multi-tenant payment reconciliation for school fees
//!
//! Turns gateway payment confirmations into exactly-once ledger updates.
//! Every confirmation resolves its tenant from a stored payment intent,
//! is verified against that tenant's own secret and is applied under a
//! fee-record row lock with the transaction id as the idempotency key.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
