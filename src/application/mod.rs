//! Application layer - Commands, Queries, and Handlers.
//!
//! Orchestrates domain operations and coordinates between ports. Command
//! handlers write, query handlers read.

pub mod handlers;

pub use handlers::{
    CancelStaleIntentsCommand, CancelStaleIntentsHandler, CancelStaleIntentsResult,
    ConfigureCredentialCommand, ConfigureCredentialError, ConfigureCredentialHandler,
    CreatePaymentIntentCommand, CreatePaymentIntentError, CreatePaymentIntentHandler,
    CreatePaymentIntentResult, ListAuditEntriesHandler, ListAuditEntriesQuery,
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconciliationOutcome,
};
