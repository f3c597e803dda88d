//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, money types, and error types
//! that form the vocabulary of the fee ledger.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{FeeRecordId, PaymentIntentId, PaymentRecordId, StudentId, TenantId, WebhookLogId};
pub use money::Currency;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
