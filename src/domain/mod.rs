//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, money, timestamps, errors, state machines)
//! - `ledger` - Fee records, payment intents, payment records
//! - `reconciliation` - Confirmation parsing, signature verification, outcome taxonomy
//! - `audit` - Inbound notification log
//! - `credential` - Per-tenant gateway credential names

pub mod audit;
pub mod credential;
pub mod foundation;
pub mod ledger;
pub mod reconciliation;
