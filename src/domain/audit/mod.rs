//! Append-only audit trail of inbound payment confirmations.

mod webhook_log;

pub use webhook_log::{AuditCompletion, ProcessingStatus, WebhookLogEntry};
