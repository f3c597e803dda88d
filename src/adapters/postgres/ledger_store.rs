//! PostgreSQL implementation of LedgerStore.
//!
//! `apply_capture` runs as one transaction:
//!
//! 1. `SET LOCAL lock_timeout` so a contended row fails fast as `LockTimeout`
//! 2. `SELECT … FOR UPDATE` on the fee record, then the intent
//! 3. insert the payment record (unique transaction id)
//! 4. update the fee record balance and status
//! 5. mark the intent paid
//! 6. complete the audit entry as `processed`
//! 7. `COMMIT`
//!
//! Any error before the commit drops the transaction, which rolls it back.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::audit_log::complete_entry;
use super::rows::{
    db_error, fee_status_to_str, intent_status_to_str, is_unique_violation, FeeRecordRow,
    PaymentIntentRow, PaymentRecordRow, INTENT_COLUMNS, PAYMENT_COLUMNS,
    TRANSACTION_ID_CONSTRAINT,
};
use crate::domain::foundation::{DomainError, ErrorCode, FeeRecordId, TenantId, Timestamp};
use crate::domain::ledger::{FeeRecord, MarkPaid, PaymentIntent, PaymentRecord};
use crate::ports::{
    ApplyOutcome, ApplyReceipt, CaptureApplication, LedgerStore, ServiceRole,
};

const FEE_RECORD_COLUMNS: &str =
    "id, tenant_id, student_id, total_due, amount_paid, status, updated_at";

pub struct PostgresLedgerStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }

    async fn payment_by_transaction_id(
        conn: &mut PgConnection,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_records WHERE transaction_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to find payment record", e))?;

        Ok(row.map(PaymentRecord::from))
    }

    /// Loads the existing record after the insert lost a race.
    async fn existing_payment(&self, transaction_id: &str) -> Result<PaymentRecord, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::payment_by_transaction_id(&mut *conn, transaction_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Payment {} vanished after unique violation", transaction_id),
                )
            })
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn find_fee_record(
        &self,
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
    ) -> Result<Option<FeeRecord>, DomainError> {
        let row: Option<FeeRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM fee_records WHERE id = $1 AND tenant_id = $2",
            FEE_RECORD_COLUMNS
        ))
        .bind(fee_record_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch fee record", e))?;

        row.map(FeeRecord::try_from).transpose()
    }

    async fn find_payment_by_transaction_id(
        &self,
        _role: &ServiceRole,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        Self::payment_by_transaction_id(&mut *conn, transaction_id).await
    }

    async fn apply_capture(
        &self,
        application: CaptureApplication,
    ) -> Result<ApplyOutcome, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        // SET does not take bind parameters; the value is a u64.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to set lock timeout", e))?;

        // Re-read the balance under an exclusive row lock
        let fee_row: Option<FeeRecordRow> = sqlx::query_as(&format!(
            "SELECT {} FROM fee_records WHERE id = $1 FOR UPDATE",
            FEE_RECORD_COLUMNS
        ))
        .bind(application.fee_record_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock fee record", e))?;

        let mut fee_record = fee_row
            .map(FeeRecord::try_from)
            .transpose()?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::FeeRecordNotFound,
                    format!("Fee record {} not found", application.fee_record_id),
                )
            })?;

        if fee_record.tenant_id != application.tenant_id {
            return Err(DomainError::new(
                ErrorCode::TenantMismatch,
                format!(
                    "Fee record {} does not belong to tenant {}",
                    fee_record.id, application.tenant_id
                ),
            ));
        }

        let intent_row: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_intents WHERE id = $1 FOR UPDATE",
            INTENT_COLUMNS
        ))
        .bind(application.intent_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to lock payment intent", e))?;

        let mut intent = intent_row
            .map(PaymentIntent::try_from)
            .transpose()?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::IntentNotFound,
                    format!("Intent {} not found", application.intent_id),
                )
            })?;

        if intent.tenant_id != application.tenant_id || intent.fee_record_id != fee_record.id {
            return Err(DomainError::new(
                ErrorCode::TenantMismatch,
                format!(
                    "Intent {} does not target fee record {} of tenant {}",
                    intent.id, fee_record.id, application.tenant_id
                ),
            ));
        }

        // New balance and derived status
        let now = Timestamp::now();
        fee_record.apply_payment(application.amount, now)?;

        // Insert the payment record; the unique index is the idempotency key
        let payment = PaymentRecord::capture(
            application.tenant_id,
            fee_record.id,
            intent.id,
            application.transaction_id.clone(),
            application.amount,
            application.method.clone(),
        )?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO payment_records (
                id, tenant_id, fee_record_id, intent_id, transaction_id, amount, method, captured_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.tenant_id.as_uuid())
        .bind(payment.fee_record_id.as_uuid())
        .bind(payment.intent_id.as_uuid())
        .bind(&payment.transaction_id)
        .bind(payment.amount)
        .bind(payment.method.as_str())
        .bind(payment.captured_at.as_datetime())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e, TRANSACTION_ID_CONSTRAINT) {
                tx.rollback()
                    .await
                    .map_err(|e| db_error("Failed to roll back duplicate", e))?;
                let existing = self.existing_payment(&application.transaction_id).await?;
                return Ok(ApplyOutcome::Duplicate(existing));
            }
            return Err(db_error("Failed to insert payment record", e));
        }

        // Balance
        sqlx::query(
            r#"
            UPDATE fee_records
            SET amount_paid = $2, status = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(fee_record.id.as_uuid())
        .bind(fee_record.amount_paid)
        .bind(fee_status_to_str(fee_record.status))
        .bind(fee_record.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update fee record", e))?;

        // Intent
        let marked = intent
            .mark_paid(application.transaction_id.clone(), now)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        if marked == MarkPaid::Updated {
            sqlx::query(
                r#"
                UPDATE payment_intents
                SET status = $2, gateway_payment_ref = $3, updated_at = $4
                WHERE id = $1
                "#,
            )
            .bind(intent.id.as_uuid())
            .bind(intent_status_to_str(intent.status))
            .bind(&intent.gateway_payment_ref)
            .bind(intent.updated_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to mark intent paid", e))?;
        }

        // Audit entry
        complete_entry(&mut *tx, &application.audit).await?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(ApplyOutcome::Applied(ApplyReceipt {
            payment,
            fee_record,
            intent,
        }))
    }
}
