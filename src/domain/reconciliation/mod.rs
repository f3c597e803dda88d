//! Reconciliation domain: turning a gateway confirmation into a ledger update.
//!
//! - `signature` - HMAC verification over raw bytes
//! - `notification` - webhook payload parsing
//! - `source` - webhook vs. direct confirmation
//! - `state` - per-notification state machine
//! - `errors` - failure taxonomy with HTTP mapping

mod errors;
mod notification;
mod signature;
mod source;
mod state;

pub use errors::ReconciliationError;
pub use notification::{CaptureDetails, GatewayNotification};
pub use signature::SignatureVerifier;
pub use source::{
    direct_signing_payload, ConfirmationSource, ParsedConfirmation, DIRECT_VERIFICATION_EVENT,
};
pub use state::NotificationState;
