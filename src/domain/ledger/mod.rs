//! Fee ledger: what is owed, what is expected, and what was captured.

mod fee_record;
mod payment_intent;
mod payment_record;

pub use fee_record::{FeeRecord, FeeStatus};
pub use payment_intent::{IntentStatus, MarkPaid, PaymentIntent};
pub use payment_record::{PaymentMethod, PaymentRecord};
