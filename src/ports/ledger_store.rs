//! LedgerStore port - Fee balances and captured payments.
//!
//! `apply_capture` is the atomic unit of reconciliation. Implementations must
//! hold an exclusive lock on the fee record for its whole duration and commit
//! the payment record, the balance update, the intent transition and the
//! audit completion together or not at all.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::ServiceRole;
use crate::domain::audit::AuditCompletion;
use crate::domain::foundation::{DomainError, FeeRecordId, PaymentIntentId, TenantId};
use crate::domain::ledger::{FeeRecord, PaymentIntent, PaymentMethod, PaymentRecord};

/// Everything needed to apply one capture.
#[derive(Debug, Clone)]
pub struct CaptureApplication {
    pub tenant_id: TenantId,
    pub fee_record_id: FeeRecordId,
    pub intent_id: PaymentIntentId,
    pub transaction_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Audit completion committed with the ledger update.
    pub audit: AuditCompletion,
}

/// State after a successful application.
#[derive(Debug, Clone)]
pub struct ApplyReceipt {
    pub payment: PaymentRecord,
    pub fee_record: FeeRecord,
    pub intent: PaymentIntent,
}

/// Result of the atomic unit.
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// Committed.
    Applied(ApplyReceipt),
    /// The transaction id was already recorded; nothing was written.
    Duplicate(PaymentRecord),
}

/// Port for the fee ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Finds a fee record within one tenant.
    async fn find_fee_record(
        &self,
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
    ) -> Result<Option<FeeRecord>, DomainError>;

    /// Looks up a payment by gateway transaction id across all tenants.
    async fn find_payment_by_transaction_id(
        &self,
        role: &ServiceRole,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError>;

    /// Applies a capture atomically under the fee record lock.
    ///
    /// # Errors
    ///
    /// - `FeeRecordNotFound` / `IntentNotFound` if a referenced row is gone
    /// - `TenantMismatch` if the fee record or intent belongs to another tenant
    /// - `LockTimeout` if the row lock could not be acquired in time
    /// - `DatabaseError` on any other store failure
    async fn apply_capture(
        &self,
        application: CaptureApplication,
    ) -> Result<ApplyOutcome, DomainError>;
}
