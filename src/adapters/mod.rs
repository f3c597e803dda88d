//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Ledger, intents, audit log and vault on PostgreSQL
//! - `memory` - The same ports over in-process tables
//! - `crypto` - AES-GCM envelope for credentials at rest
//! - `http` - Axum routes for webhook and direct confirmations

pub mod crypto;
pub mod http;
pub mod memory;
pub mod postgres;

pub use crypto::AesGcmCipher;
pub use memory::{InMemoryCredentialVault, InMemoryLedger};
pub use postgres::{
    PostgresAuditLog, PostgresCredentialVault, PostgresLedgerStore, PostgresPaymentIntentLedger,
};
