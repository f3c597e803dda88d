//! Webhook log entry and its single permitted transition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, TenantId, Timestamp, ValidationError, WebhookLogId};

/// Processing status of a logged notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Received,
    Processed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Received => "received",
            ProcessingStatus::Processed => "processed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(ProcessingStatus::Received),
            "processed" => Ok(ProcessingStatus::Processed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "processing_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for ProcessingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (ProcessingStatus::Received, ProcessingStatus::Processed)
                | (ProcessingStatus::Received, ProcessingStatus::Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ProcessingStatus::Received => vec![ProcessingStatus::Processed, ProcessingStatus::Failed],
            ProcessingStatus::Processed | ProcessingStatus::Failed => vec![],
        }
    }
}

/// One inbound notification as received, with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookLogEntry {
    pub id: WebhookLogId,
    /// Unset until the tenant is resolved from the payment intent.
    pub tenant_id: Option<TenantId>,
    pub event_name: String,
    pub raw_payload: String,
    pub signature_valid: bool,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
    pub received_at: Timestamp,
}

impl WebhookLogEntry {
    /// Opens an entry in `Received` state.
    pub fn received(event_name: impl Into<String>, raw_payload: impl Into<String>) -> Self {
        Self {
            id: WebhookLogId::new(),
            tenant_id: None,
            event_name: event_name.into(),
            raw_payload: raw_payload.into(),
            signature_valid: false,
            status: ProcessingStatus::Received,
            error_message: None,
            received_at: Timestamp::now(),
        }
    }

    /// Moves the entry to its terminal status. Allowed once.
    pub fn complete(
        &mut self,
        status: ProcessingStatus,
        error_message: Option<String>,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(status)?;
        self.error_message = error_message;
        Ok(())
    }
}

/// Terminal update applied to a received entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditCompletion {
    pub id: WebhookLogId,
    pub tenant_id: Option<TenantId>,
    pub signature_valid: bool,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
}

impl AuditCompletion {
    /// Applies this completion to an entry.
    pub fn apply_to(&self, entry: &mut WebhookLogEntry) -> Result<(), ValidationError> {
        entry.complete(self.status, self.error_message.clone())?;
        entry.tenant_id = self.tenant_id.or(entry.tenant_id);
        entry.signature_valid = self.signature_valid;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_received_without_tenant() {
        let entry = WebhookLogEntry::received("payment.captured", "{}");
        assert_eq!(entry.status, ProcessingStatus::Received);
        assert!(entry.tenant_id.is_none());
        assert!(!entry.signature_valid);
    }

    #[test]
    fn entry_completes_once() {
        let mut entry = WebhookLogEntry::received("payment.captured", "{}");
        entry.complete(ProcessingStatus::Processed, None).unwrap();
        assert_eq!(entry.status, ProcessingStatus::Processed);

        let second = entry.complete(ProcessingStatus::Failed, Some("late".to_string()));
        assert!(second.is_err());
        assert_eq!(entry.status, ProcessingStatus::Processed);
    }

    #[test]
    fn cannot_complete_back_to_received() {
        let mut entry = WebhookLogEntry::received("payment.captured", "{}");
        assert!(entry.complete(ProcessingStatus::Received, None).is_err());
    }

    #[test]
    fn completion_sets_tenant_and_signature_flag() {
        let tenant = TenantId::new();
        let mut entry = WebhookLogEntry::received("payment.captured", "{}");
        let completion = AuditCompletion {
            id: entry.id,
            tenant_id: Some(tenant),
            signature_valid: true,
            status: ProcessingStatus::Processed,
            error_message: None,
        };

        completion.apply_to(&mut entry).unwrap();

        assert_eq!(entry.tenant_id, Some(tenant));
        assert!(entry.signature_valid);
    }

    #[test]
    fn status_parses_storage_strings() {
        assert_eq!("failed".parse::<ProcessingStatus>().unwrap(), ProcessingStatus::Failed);
        assert!("done".parse::<ProcessingStatus>().is_err());
    }
}
