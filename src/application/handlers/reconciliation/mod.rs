//! Reconciliation command and query handlers.

// Command handlers
mod cancel_stale_intents;
mod configure_credential;
mod create_payment_intent;
mod reconcile_payment;

// Query handlers
mod list_audit_entries;

pub use cancel_stale_intents::{
    CancelStaleIntentsCommand, CancelStaleIntentsHandler, CancelStaleIntentsResult,
};
pub use configure_credential::{
    ConfigureCredentialCommand, ConfigureCredentialError, ConfigureCredentialHandler,
};
pub use create_payment_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentError, CreatePaymentIntentHandler,
    CreatePaymentIntentResult,
};
pub use list_audit_entries::{ListAuditEntriesHandler, ListAuditEntriesQuery, MAX_AUDIT_PAGE};
pub use reconcile_payment::{
    ReconcilePaymentCommand, ReconcilePaymentHandler, ReconciliationOutcome,
    DEFAULT_HANDLED_EVENTS,
};
