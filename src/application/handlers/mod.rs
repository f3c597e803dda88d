//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod reconciliation;

pub use reconciliation::{
    CancelStaleIntentsCommand, CancelStaleIntentsHandler, CancelStaleIntentsResult,
    ConfigureCredentialCommand, ConfigureCredentialError, ConfigureCredentialHandler,
    CreatePaymentIntentCommand, CreatePaymentIntentError, CreatePaymentIntentHandler,
    CreatePaymentIntentResult, ListAuditEntriesHandler, ListAuditEntriesQuery,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconciliationOutcome,
};
