//! PaymentIntentLedger port - Intents registered before a gateway order.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::ServiceRole;
use crate::domain::foundation::{
    Currency, DomainError, FeeRecordId, PaymentIntentId, TenantId, Timestamp,
};
use crate::domain::ledger::PaymentIntent;

/// Port for creating and resolving payment intents.
#[async_trait]
pub trait PaymentIntentLedger: Send + Sync {
    /// Registers an intent.
    ///
    /// # Errors
    ///
    /// - `DuplicateOrder` if `order_ref` is already used by this tenant
    async fn create(
        &self,
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
        expected_amount: Decimal,
        currency: Currency,
        order_ref: &str,
    ) -> Result<PaymentIntent, DomainError>;

    /// Finds an intent by order reference within one tenant.
    async fn find_by_order_ref(
        &self,
        tenant_id: TenantId,
        order_ref: &str,
    ) -> Result<Option<PaymentIntent>, DomainError>;

    /// Finds an intent by order reference across all tenants.
    ///
    /// This is how an inbound notification learns its tenant, so it needs
    /// the elevated role.
    ///
    /// # Errors
    ///
    /// - `AmbiguousOrderRef` if more than one tenant uses the reference
    async fn resolve_order_ref(
        &self,
        role: &ServiceRole,
        order_ref: &str,
    ) -> Result<Option<PaymentIntent>, DomainError>;

    /// Marks an intent paid. A second call returns the already-paid intent
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - `IntentNotFound` if the intent doesn't exist
    async fn mark_paid(
        &self,
        intent_id: PaymentIntentId,
        gateway_payment_ref: &str,
    ) -> Result<PaymentIntent, DomainError>;

    /// Records a gateway-reported failed attempt.
    ///
    /// Only a `created` intent moves to `failed`; any other status is
    /// returned unchanged so a late failure never undoes a payment.
    ///
    /// # Errors
    ///
    /// - `IntentNotFound` if the intent doesn't exist
    async fn mark_failed(&self, intent_id: PaymentIntentId) -> Result<PaymentIntent, DomainError>;

    /// Cancels the tenant's `created` intents older than `created_before`.
    ///
    /// Returns the number of intents cancelled.
    async fn cancel_stale(
        &self,
        tenant_id: TenantId,
        created_before: Timestamp,
    ) -> Result<u64, DomainError>;
}
