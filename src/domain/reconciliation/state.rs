//! Per-notification processing state.

use serde::{Deserialize, Serialize};

use crate::domain::audit::ProcessingStatus;
use crate::domain::foundation::StateMachine;

/// Where an inbound confirmation is in the pipeline.
///
/// ```text
/// Received ──► SignatureChecked ──► Rejected | Duplicate | Applied | Failed | Ignored
///    │
///    └──► Failed   (malformed, unknown intent, missing secret)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Received,
    SignatureChecked,
    Rejected,
    Duplicate,
    Applied,
    Failed,
    /// Authentic event of a kind the ledger does not reconcile.
    Ignored,
}

impl NotificationState {
    /// Audit status recorded for a terminal state.
    ///
    /// Returns `None` for non-terminal states.
    pub fn processing_status(&self) -> Option<ProcessingStatus> {
        match self {
            NotificationState::Applied
            | NotificationState::Duplicate
            | NotificationState::Ignored => Some(ProcessingStatus::Processed),
            NotificationState::Rejected | NotificationState::Failed => {
                Some(ProcessingStatus::Failed)
            }
            NotificationState::Received | NotificationState::SignatureChecked => None,
        }
    }
}

impl StateMachine for NotificationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use NotificationState::*;
        matches!(
            (self, target),
            (Received, SignatureChecked)
                | (Received, Failed)
                | (SignatureChecked, Rejected)
                | (SignatureChecked, Duplicate)
                | (SignatureChecked, Applied)
                | (SignatureChecked, Failed)
                | (SignatureChecked, Ignored)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use NotificationState::*;
        match self {
            Received => vec![SignatureChecked, Failed],
            SignatureChecked => vec![Rejected, Duplicate, Applied, Failed, Ignored],
            Rejected | Duplicate | Applied | Failed | Ignored => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_cannot_skip_to_applied() {
        assert!(!NotificationState::Received.can_transition_to(&NotificationState::Applied));
        assert!(!NotificationState::Received.can_transition_to(&NotificationState::Duplicate));
    }

    #[test]
    fn pre_verification_failures_are_allowed() {
        assert!(NotificationState::Received.can_transition_to(&NotificationState::Failed));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for state in [
            NotificationState::Rejected,
            NotificationState::Duplicate,
            NotificationState::Applied,
            NotificationState::Failed,
            NotificationState::Ignored,
        ] {
            assert!(state.is_terminal(), "{:?} should be terminal", state);
            assert!(state.processing_status().is_some());
        }
    }

    #[test]
    fn duplicate_is_logged_as_processed() {
        assert_eq!(
            NotificationState::Duplicate.processing_status(),
            Some(ProcessingStatus::Processed)
        );
        assert_eq!(
            NotificationState::Rejected.processing_status(),
            Some(ProcessingStatus::Failed)
        );
    }

    #[test]
    fn in_flight_states_have_no_audit_status() {
        assert_eq!(NotificationState::Received.processing_status(), None);
        assert_eq!(NotificationState::SignatureChecked.processing_status(), None);
    }
}
