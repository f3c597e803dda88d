//! Payment intent aggregate.
//!
//! An intent is registered before the payer is sent to the gateway. It ties a
//! gateway order reference to one fee record and is how an inbound capture
//! finds its tenant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Currency, FeeRecordId, PaymentIntentId, StateMachine, TenantId, Timestamp, ValidationError,
};

/// Lifecycle of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Order issued, no capture seen yet.
    Created,
    /// Capture reconciled. Terminal.
    Paid,
    /// Gateway reported the attempt failed.
    Failed,
    /// Swept as stale or abandoned by the payer.
    Cancelled,
}

impl StateMachine for IntentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use IntentStatus::*;
        matches!(
            (self, target),
            (Created, Paid)
                | (Created, Failed)
                | (Created, Cancelled)
                // Late captures still collected funds
                | (Failed, Paid)
                | (Cancelled, Paid)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use IntentStatus::*;
        match self {
            Created => vec![Paid, Failed, Cancelled],
            Failed => vec![Paid],
            Cancelled => vec![Paid],
            Paid => vec![],
        }
    }
}

/// Result of marking an intent paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaid {
    /// The intent moved to `Paid` with this reference.
    Updated,
    /// The intent was already paid; the recorded reference is kept.
    AlreadyPaid { gateway_payment_ref: Option<String> },
}

/// Expected capture against one fee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub tenant_id: TenantId,
    pub fee_record_id: FeeRecordId,
    pub order_ref: String,
    pub expected_amount: Decimal,
    pub currency: Currency,
    pub status: IntentStatus,
    pub gateway_payment_ref: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentIntent {
    /// Registers a new intent in `Created` state.
    pub fn create(
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
        order_ref: impl Into<String>,
        expected_amount: Decimal,
        currency: Currency,
    ) -> Result<Self, ValidationError> {
        let order_ref = order_ref.into();
        if order_ref.trim().is_empty() {
            return Err(ValidationError::empty_field("order_ref"));
        }
        if expected_amount <= Decimal::ZERO {
            return Err(ValidationError::not_positive("expected_amount"));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: PaymentIntentId::new(),
            tenant_id,
            fee_record_id,
            order_ref,
            expected_amount,
            currency,
            status: IntentStatus::Created,
            gateway_payment_ref: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Marks the intent paid. Calling again once paid is a no-op.
    pub fn mark_paid(
        &mut self,
        gateway_payment_ref: impl Into<String>,
        at: Timestamp,
    ) -> Result<MarkPaid, ValidationError> {
        if self.status == IntentStatus::Paid {
            return Ok(MarkPaid::AlreadyPaid {
                gateway_payment_ref: self.gateway_payment_ref.clone(),
            });
        }
        self.status = self.status.transition_to(IntentStatus::Paid)?;
        self.gateway_payment_ref = Some(gateway_payment_ref.into());
        self.updated_at = at;
        Ok(MarkPaid::Updated)
    }

    /// Cancels an intent that never received a capture.
    pub fn cancel(&mut self, at: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(IntentStatus::Cancelled)?;
        self.updated_at = at;
        Ok(())
    }

    /// Records a gateway-reported failure.
    pub fn mark_failed(&mut self, at: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(IntentStatus::Failed)?;
        self.updated_at = at;
        Ok(())
    }
}
