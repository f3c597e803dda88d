//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CredentialVault` - Per-tenant gateway secrets (elevated reads)
//! - `SecretCipher` - Envelope encryption for stored credentials
//! - `PaymentIntentLedger` - Intents registered before gateway orders
//! - `LedgerStore` - Fee balances, payment records, the atomic apply step
//! - `AuditLog` - Inbound notification trail

mod audit_log;
mod credential_vault;
mod ledger_store;
mod payment_intent_ledger;
mod secret_cipher;

pub use audit_log::AuditLog;
pub use credential_vault::{CredentialVault, ServiceRole, VaultError};
pub use ledger_store::{ApplyOutcome, ApplyReceipt, CaptureApplication, LedgerStore};
pub use payment_intent_ledger::PaymentIntentLedger;
pub use secret_cipher::{CipherError, SecretCipher};
