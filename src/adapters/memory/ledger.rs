//! In-memory fee ledger.
//!
//! Implements `LedgerStore`, `PaymentIntentLedger` and `AuditLog` over one
//! shared set of tables, mirroring the Postgres schema:
//!
//! - a per-fee-record async mutex stands in for `SELECT … FOR UPDATE`
//! - payments are keyed by transaction id, the unique index
//! - `apply_capture` stages every change on copies and writes them back in a
//!   single critical section, so a failure leaves nothing behind
//!
//! Useful for tests and local development.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::audit::{AuditCompletion, WebhookLogEntry};
use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, FeeRecordId, PaymentIntentId, TenantId, Timestamp,
};
use crate::domain::ledger::{FeeRecord, IntentStatus, MarkPaid, PaymentIntent, PaymentRecord};
use crate::ports::{
    ApplyOutcome, ApplyReceipt, AuditLog, CaptureApplication, LedgerStore, PaymentIntentLedger,
    ServiceRole,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Tables {
    fee_records: HashMap<FeeRecordId, FeeRecord>,
    intents: HashMap<PaymentIntentId, PaymentIntent>,
    payments: HashMap<String, PaymentRecord>,
    audit: Vec<WebhookLogEntry>,
}

/// In-memory ledger shared by clones.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    tables: Arc<RwLock<Tables>>,
    row_locks: Arc<Mutex<HashMap<FeeRecordId, Arc<Mutex<()>>>>>,
    lock_timeout: Duration,
    #[cfg(test)]
    next_apply_failure: Arc<Mutex<Option<DomainError>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Creates a ledger whose row-lock waits give up after `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            row_locks: Arc::new(Mutex::new(HashMap::new())),
            lock_timeout,
            #[cfg(test)]
            next_apply_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Inserts or replaces a fee record (bulk assignment).
    pub async fn insert_fee_record(&self, record: FeeRecord) {
        self.tables
            .write()
            .await
            .fee_records
            .insert(record.id, record);
    }

    /// Makes the next `apply_capture` fail after taking the row lock.
    #[cfg(test)]
    pub(crate) async fn fail_next_apply(&self, error: DomainError) {
        *self.next_apply_failure.lock().await = Some(error);
    }

    /// Payments recorded against a fee record.
    pub async fn payments_for(&self, fee_record_id: FeeRecordId) -> Vec<PaymentRecord> {
        self.tables
            .read()
            .await
            .payments
            .values()
            .filter(|p| p.fee_record_id == fee_record_id)
            .cloned()
            .collect()
    }

    /// Every audit entry in insertion order, regardless of tenant.
    pub async fn all_audit_entries(&self) -> Vec<WebhookLogEntry> {
        self.tables.read().await.audit.clone()
    }

    /// Exclusive lock on one fee record row.
    ///
    /// Blocks a second apply on the same record. Records never contend with
    /// each other.
    async fn lock_row(&self, fee_record_id: FeeRecordId) -> Result<OwnedMutexGuard<()>, DomainError> {
        let row = {
            let mut locks = self.row_locks.lock().await;
            locks
                .entry(fee_record_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        tokio::time::timeout(self.lock_timeout, row.lock_owned())
            .await
            .map_err(|_| {
                DomainError::new(
                    ErrorCode::LockTimeout,
                    format!("Timed out waiting for lock on fee record {}", fee_record_id),
                )
            })
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn find_entry(entries: &[WebhookLogEntry], completion: &AuditCompletion) -> Result<usize, DomainError> {
    entries
        .iter()
        .position(|e| e.id == completion.id)
        .ok_or_else(|| {
            DomainError::new(
                ErrorCode::AuditEntryNotFound,
                format!("Audit entry {} not found", completion.id),
            )
        })
}

fn complete_entry(entry: &mut WebhookLogEntry, completion: &AuditCompletion) -> Result<(), DomainError> {
    if let (Some(existing), Some(incoming)) = (entry.tenant_id, completion.tenant_id) {
        if existing != incoming {
            return Err(DomainError::new(
                ErrorCode::TenantMismatch,
                format!("Audit entry {} belongs to another tenant", completion.id),
            ));
        }
    }

    completion.apply_to(entry).map_err(|_| {
        DomainError::new(
            ErrorCode::AuditEntryNotFound,
            format!("Audit entry {} already completed", completion.id),
        )
    })
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn find_fee_record(
        &self,
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
    ) -> Result<Option<FeeRecord>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .fee_records
            .get(&fee_record_id)
            .filter(|r| r.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_payment_by_transaction_id(
        &self,
        _role: &ServiceRole,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        Ok(self.tables.read().await.payments.get(transaction_id).cloned())
    }

    async fn apply_capture(
        &self,
        application: CaptureApplication,
    ) -> Result<ApplyOutcome, DomainError> {
        let _row = self.lock_row(application.fee_record_id).await?;

        #[cfg(test)]
        if let Some(err) = self.next_apply_failure.lock().await.take() {
            return Err(err);
        }

        // Re-read under the lock
        let (mut fee_record, mut intent) = {
            let tables = self.tables.read().await;
            let fee_record = tables
                .fee_records
                .get(&application.fee_record_id)
                .cloned()
                .ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::FeeRecordNotFound,
                        format!("Fee record {} not found", application.fee_record_id),
                    )
                })?;
            let intent = tables
                .intents
                .get(&application.intent_id)
                .cloned()
                .ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::IntentNotFound,
                        format!("Intent {} not found", application.intent_id),
                    )
                })?;
            (fee_record, intent)
        };

        if fee_record.tenant_id != application.tenant_id
            || intent.tenant_id != application.tenant_id
            || intent.fee_record_id != fee_record.id
        {
            return Err(DomainError::new(
                ErrorCode::TenantMismatch,
                format!(
                    "Fee record {} is not reachable from tenant {}",
                    fee_record.id, application.tenant_id
                ),
            ));
        }

        // Other tasks may run here; the row lock keeps this record ours.
        tokio::task::yield_now().await;

        let now = Timestamp::now();
        fee_record.apply_payment(application.amount, now)?;

        let payment = PaymentRecord::capture(
            application.tenant_id,
            fee_record.id,
            intent.id,
            application.transaction_id.clone(),
            application.amount,
            application.method.clone(),
        )?;

        intent
            .mark_paid(application.transaction_id.clone(), now)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;

        // Commit
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.payments.get(&application.transaction_id) {
            return Ok(ApplyOutcome::Duplicate(existing.clone()));
        }

        let audit_index = find_entry(&tables.audit, &application.audit)?;
        let mut audit_entry = tables.audit[audit_index].clone();
        complete_entry(&mut audit_entry, &application.audit)?;

        tables
            .payments
            .insert(payment.transaction_id.clone(), payment.clone());
        tables.fee_records.insert(fee_record.id, fee_record.clone());
        tables.intents.insert(intent.id, intent.clone());
        tables.audit[audit_index] = audit_entry;

        Ok(ApplyOutcome::Applied(ApplyReceipt {
            payment,
            fee_record,
            intent,
        }))
    }
}

#[async_trait]
impl PaymentIntentLedger for InMemoryLedger {
    async fn create(
        &self,
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
        expected_amount: Decimal,
        currency: Currency,
        order_ref: &str,
    ) -> Result<PaymentIntent, DomainError> {
        let intent =
            PaymentIntent::create(tenant_id, fee_record_id, order_ref, expected_amount, currency)?;

        let mut tables = self.tables.write().await;
        let taken = tables
            .intents
            .values()
            .any(|i| i.tenant_id == tenant_id && i.order_ref == intent.order_ref);
        if taken {
            return Err(DomainError::new(
                ErrorCode::DuplicateOrder,
                format!("Order reference '{}' already used", intent.order_ref),
            ));
        }

        tables.intents.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn find_by_order_ref(
        &self,
        tenant_id: TenantId,
        order_ref: &str,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .intents
            .values()
            .find(|i| i.tenant_id == tenant_id && i.order_ref == order_ref)
            .cloned())
    }

    async fn resolve_order_ref(
        &self,
        _role: &ServiceRole,
        order_ref: &str,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        let tables = self.tables.read().await;
        let mut matches = tables.intents.values().filter(|i| i.order_ref == order_ref);
        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(DomainError::new(
                ErrorCode::AmbiguousOrderRef,
                format!("Order reference '{}' is used by more than one tenant", order_ref),
            ));
        }
        Ok(first)
    }

    async fn mark_paid(
        &self,
        intent_id: PaymentIntentId,
        gateway_payment_ref: &str,
    ) -> Result<PaymentIntent, DomainError> {
        let mut tables = self.tables.write().await;
        let intent = tables.intents.get_mut(&intent_id).ok_or_else(|| {
            DomainError::new(ErrorCode::IntentNotFound, format!("Intent {} not found", intent_id))
        })?;

        let mut staged = intent.clone();
        match staged
            .mark_paid(gateway_payment_ref, Timestamp::now())
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?
        {
            MarkPaid::Updated => *intent = staged.clone(),
            MarkPaid::AlreadyPaid { .. } => {}
        }
        Ok(intent.clone())
    }

    async fn mark_failed(&self, intent_id: PaymentIntentId) -> Result<PaymentIntent, DomainError> {
        let mut tables = self.tables.write().await;
        let intent = tables.intents.get_mut(&intent_id).ok_or_else(|| {
            DomainError::new(ErrorCode::IntentNotFound, format!("Intent {} not found", intent_id))
        })?;

        if intent.status == IntentStatus::Created {
            intent.mark_failed(Timestamp::now())?;
        }
        Ok(intent.clone())
    }

    async fn cancel_stale(
        &self,
        tenant_id: TenantId,
        created_before: Timestamp,
    ) -> Result<u64, DomainError> {
        let now = Timestamp::now();
        let mut cancelled = 0;
        let mut tables = self.tables.write().await;
        for intent in tables.intents.values_mut() {
            if intent.tenant_id == tenant_id
                && intent.status == IntentStatus::Created
                && intent.created_at.is_before(&created_before)
            {
                intent.cancel(now)?;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }
}

#[async_trait]
impl AuditLog for InMemoryLedger {
    async fn record(&self, entry: &WebhookLogEntry) -> Result<(), DomainError> {
        self.tables.write().await.audit.push(entry.clone());
        Ok(())
    }

    async fn complete(&self, completion: &AuditCompletion) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        let index = find_entry(&tables.audit, completion)?;
        complete_entry(&mut tables.audit[index], completion)
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        limit: u32,
    ) -> Result<Vec<WebhookLogEntry>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .audit
            .iter()
            .rev()
            .filter(|e| e.tenant_id == Some(tenant_id))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::ProcessingStatus;
    use crate::domain::foundation::StudentId;
    use crate::domain::ledger::{FeeStatus, PaymentMethod};

    fn rupees(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }

    async fn setup(total_minor: i64) -> (InMemoryLedger, TenantId, FeeRecord, PaymentIntent) {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        let fee = FeeRecord::assign(FeeRecordId::new(), tenant, StudentId::new(), rupees(total_minor))
            .unwrap();
        ledger.insert_fee_record(fee.clone()).await;
        let intent = ledger
            .create(tenant, fee.id, rupees(total_minor), Currency::inr(), "order_1")
            .await
            .unwrap();
        (ledger, tenant, fee, intent)
    }

    async fn application(
        ledger: &InMemoryLedger,
        tenant: TenantId,
        fee: &FeeRecord,
        intent: &PaymentIntent,
        transaction_id: &str,
        amount: Decimal,
    ) -> CaptureApplication {
        let entry = WebhookLogEntry::received("payment.captured", "{}");
        ledger.record(&entry).await.unwrap();
        CaptureApplication {
            tenant_id: tenant,
            fee_record_id: fee.id,
            intent_id: intent.id,
            transaction_id: transaction_id.to_string(),
            amount,
            method: PaymentMethod::Upi,
            audit: AuditCompletion {
                id: entry.id,
                tenant_id: Some(tenant),
                signature_valid: true,
                status: ProcessingStatus::Processed,
                error_message: None,
            },
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Atomic apply
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn apply_updates_balance_intent_and_audit_together() {
        let (ledger, tenant, fee, intent) = setup(8_200_000).await;
        let app = application(&ledger, tenant, &fee, &intent, "pay_1", rupees(4_000_000)).await;

        let outcome = ledger.apply_capture(app).await.unwrap();

        let receipt = match outcome {
            ApplyOutcome::Applied(r) => r,
            other => panic!("expected applied, got {:?}", other),
        };
        assert_eq!(receipt.fee_record.amount_paid, rupees(4_000_000));
        assert_eq!(receipt.fee_record.status, FeeStatus::PartiallyPaid);
        assert_eq!(receipt.intent.status, IntentStatus::Paid);

        let entries = ledger.list_for_tenant(tenant, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ProcessingStatus::Processed);
    }

    #[tokio::test]
    async fn second_apply_with_same_transaction_is_duplicate() {
        let (ledger, tenant, fee, intent) = setup(8_200_000).await;
        let first = application(&ledger, tenant, &fee, &intent, "pay_1", rupees(4_000_000)).await;
        let second = application(&ledger, tenant, &fee, &intent, "pay_1", rupees(4_000_000)).await;

        ledger.apply_capture(first).await.unwrap();
        let outcome = ledger.apply_capture(second).await.unwrap();

        assert!(matches!(outcome, ApplyOutcome::Duplicate(_)));
        let stored = ledger.find_fee_record(tenant, fee.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_paid, rupees(4_000_000));
        assert_eq!(ledger.payments_for(fee.id).await.len(), 1);
    }

    #[tokio::test]
    async fn injected_failure_leaves_no_partial_state() {
        let (ledger, tenant, fee, intent) = setup(8_200_000).await;
        let app = application(&ledger, tenant, &fee, &intent, "pay_1", rupees(4_000_000)).await;
        ledger
            .fail_next_apply(DomainError::new(ErrorCode::DatabaseError, "disk full"))
            .await;

        assert!(ledger.apply_capture(app).await.is_err());

        let stored = ledger.find_fee_record(tenant, fee.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_paid, Decimal::ZERO);
        assert!(ledger.payments_for(fee.id).await.is_empty());
        let intent = ledger.find_by_order_ref(tenant, "order_1").await.unwrap().unwrap();
        assert_eq!(intent.status, IntentStatus::Created);
    }

    #[tokio::test]
    async fn foreign_tenant_is_rejected() {
        let (ledger, _tenant, fee, intent) = setup(8_200_000).await;
        let other = TenantId::new();
        let app = application(&ledger, other, &fee, &intent, "pay_1", rupees(100)).await;

        let err = ledger.apply_capture(app).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TenantMismatch);
    }

    #[tokio::test]
    async fn held_row_lock_times_out() {
        let ledger = InMemoryLedger::with_lock_timeout(Duration::from_millis(20));
        let tenant = TenantId::new();
        let fee = FeeRecord::assign(FeeRecordId::new(), tenant, StudentId::new(), rupees(100))
            .unwrap();
        ledger.insert_fee_record(fee.clone()).await;
        let intent = ledger
            .create(tenant, fee.id, rupees(100), Currency::inr(), "order_1")
            .await
            .unwrap();
        let app = application(&ledger, tenant, &fee, &intent, "pay_1", rupees(100)).await;

        let _held = ledger.lock_row(fee.id).await.unwrap();
        let err = ledger.apply_capture(app).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::LockTimeout);
    }

    // ══════════════════════════════════════════════════════════════
    // Intents
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn duplicate_order_ref_in_same_tenant_is_rejected() {
        let (ledger, tenant, fee, _) = setup(1_000).await;
        let err = ledger
            .create(tenant, fee.id, rupees(100), Currency::inr(), "order_1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateOrder);
    }

    #[tokio::test]
    async fn same_order_ref_in_two_tenants_is_ambiguous() {
        let (ledger, _, _, _) = setup(1_000).await;
        ledger
            .create(TenantId::new(), FeeRecordId::new(), rupees(100), Currency::inr(), "order_1")
            .await
            .unwrap();

        let err = ledger
            .resolve_order_ref(&ServiceRole::assume(), "order_1")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AmbiguousOrderRef);
    }

    #[tokio::test]
    async fn mark_paid_twice_keeps_first_reference() {
        let (ledger, _, _, intent) = setup(1_000).await;
        ledger.mark_paid(intent.id, "pay_1").await.unwrap();
        let second = ledger.mark_paid(intent.id, "pay_2").await.unwrap();

        assert_eq!(second.status, IntentStatus::Paid);
        assert_eq!(second.gateway_payment_ref.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn mark_failed_moves_created_intent_to_failed() {
        let (ledger, _, _, intent) = setup(1_000).await;

        let failed = ledger.mark_failed(intent.id).await.unwrap();

        assert_eq!(failed.status, IntentStatus::Failed);
    }

    #[tokio::test]
    async fn mark_failed_after_payment_keeps_intent_paid() {
        let (ledger, _, _, intent) = setup(1_000).await;
        ledger.mark_paid(intent.id, "pay_1").await.unwrap();

        let unchanged = ledger.mark_failed(intent.id).await.unwrap();

        assert_eq!(unchanged.status, IntentStatus::Paid);
        assert_eq!(unchanged.gateway_payment_ref.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn cancel_stale_only_touches_old_created_intents() {
        let (ledger, tenant, fee, intent) = setup(1_000).await;
        let paid = ledger
            .create(tenant, fee.id, rupees(100), Currency::inr(), "order_2")
            .await
            .unwrap();
        ledger.mark_paid(paid.id, "pay_2").await.unwrap();

        let cutoff = Timestamp::from_datetime(
            *Timestamp::now().as_datetime() + chrono::Duration::seconds(1),
        );
        let cancelled = ledger.cancel_stale(tenant, cutoff).await.unwrap();

        assert_eq!(cancelled, 1);
        let stored = ledger.find_by_order_ref(tenant, &intent.order_ref).await.unwrap().unwrap();
        assert_eq!(stored.status, IntentStatus::Cancelled);
    }

    // ══════════════════════════════════════════════════════════════
    // Audit
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn audit_entry_completes_only_once() {
        let ledger = InMemoryLedger::new();
        let entry = WebhookLogEntry::received("payment.captured", "{}");
        ledger.record(&entry).await.unwrap();

        let completion = AuditCompletion {
            id: entry.id,
            tenant_id: None,
            signature_valid: false,
            status: ProcessingStatus::Failed,
            error_message: Some("malformed".to_string()),
        };
        ledger.complete(&completion).await.unwrap();

        let err = ledger.complete(&completion).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuditEntryNotFound);
    }

    #[tokio::test]
    async fn list_for_tenant_hides_other_tenants() {
        let ledger = InMemoryLedger::new();
        let mine = TenantId::new();
        let mut entry = WebhookLogEntry::received("payment.captured", "{}");
        entry.tenant_id = Some(mine);
        ledger.record(&entry).await.unwrap();
        let mut foreign = WebhookLogEntry::received("payment.captured", "{}");
        foreign.tenant_id = Some(TenantId::new());
        ledger.record(&foreign).await.unwrap();

        let entries = ledger.list_for_tenant(mine, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
    }
}
