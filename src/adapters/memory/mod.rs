//! In-memory adapters for tests and local development.

mod credential_vault;
mod ledger;

pub use credential_vault::InMemoryCredentialVault;
pub use ledger::InMemoryLedger;
