//! PostgreSQL adapters - Database implementations for the ledger ports.
//!
//! - `PostgresLedgerStore` - Fee records, payment records, the atomic apply step
//! - `PostgresPaymentIntentLedger` - Payment intents
//! - `PostgresAuditLog` - Notification audit trail
//! - `PostgresCredentialVault` - Encrypted per-tenant credentials

mod audit_log;
mod credential_vault;
mod ledger_store;
mod payment_intent_ledger;
mod rows;

pub use audit_log::PostgresAuditLog;
pub use credential_vault::PostgresCredentialVault;
pub use ledger_store::PostgresLedgerStore;
pub use payment_intent_ledger::PostgresPaymentIntentLedger;
