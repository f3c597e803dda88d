//! PostgreSQL implementation of PaymentIntentLedger.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::rows::{
    db_error, intent_status_to_str, is_unique_violation, PaymentIntentRow, INTENT_COLUMNS,
    ORDER_REF_CONSTRAINT,
};
use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, FeeRecordId, PaymentIntentId, TenantId, Timestamp,
};
use crate::domain::ledger::{IntentStatus, MarkPaid, PaymentIntent};
use crate::ports::{PaymentIntentLedger, ServiceRole};

pub struct PostgresPaymentIntentLedger {
    pool: PgPool,
}

impl PostgresPaymentIntentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_id(
        &self,
        intent_id: PaymentIntentId,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        let row: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_intents WHERE id = $1",
            INTENT_COLUMNS
        ))
        .bind(intent_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch payment intent", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }
}

#[async_trait]
impl PaymentIntentLedger for PostgresPaymentIntentLedger {
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

        sqlx::query(
            r#"
            INSERT INTO payment_intents (
                id, tenant_id, fee_record_id, order_ref, expected_amount, currency,
                status, gateway_payment_ref, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, $9)
            "#,
        )
        .bind(intent.id.as_uuid())
        .bind(intent.tenant_id.as_uuid())
        .bind(intent.fee_record_id.as_uuid())
        .bind(&intent.order_ref)
        .bind(intent.expected_amount)
        .bind(intent.currency.as_str())
        .bind(intent_status_to_str(intent.status))
        .bind(intent.created_at.as_datetime())
        .bind(intent.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, ORDER_REF_CONSTRAINT) {
                return DomainError::new(
                    ErrorCode::DuplicateOrder,
                    format!("Order reference '{}' already used", intent.order_ref),
                );
            }
            db_error("Failed to insert payment intent", e)
        })?;

        Ok(intent)
    }

    async fn find_by_order_ref(
        &self,
        tenant_id: TenantId,
        order_ref: &str,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        let row: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_intents WHERE tenant_id = $1 AND order_ref = $2",
            INTENT_COLUMNS
        ))
        .bind(tenant_id.as_uuid())
        .bind(order_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment intent", e))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn resolve_order_ref(
        &self,
        _role: &ServiceRole,
        order_ref: &str,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        let mut rows: Vec<PaymentIntentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_intents WHERE order_ref = $1 LIMIT 2",
            INTENT_COLUMNS
        ))
        .bind(order_ref)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to resolve order reference", e))?;

        if rows.len() > 1 {
            return Err(DomainError::new(
                ErrorCode::AmbiguousOrderRef,
                format!("Order reference '{}' is used by more than one tenant", order_ref),
            ));
        }
        rows.pop().map(PaymentIntent::try_from).transpose()
    }

    async fn mark_paid(
        &self,
        intent_id: PaymentIntentId,
        gateway_payment_ref: &str,
    ) -> Result<PaymentIntent, DomainError> {
        let mut intent = self.find_by_id(intent_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::IntentNotFound, format!("Intent {} not found", intent_id))
        })?;

        let now = Timestamp::now();
        match intent
            .mark_paid(gateway_payment_ref, now)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?
        {
            MarkPaid::AlreadyPaid { .. } => return Ok(intent),
            MarkPaid::Updated => {}
        }

        // Guarded on status so a concurrent mark keeps the first reference.
        let updated: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payment_intents
            SET status = 'paid', gateway_payment_ref = $2, updated_at = $3
            WHERE id = $1 AND status <> 'paid'
            RETURNING {}
            "#,
            INTENT_COLUMNS
        ))
        .bind(intent_id.as_uuid())
        .bind(gateway_payment_ref)
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark intent paid", e))?;

        match updated {
            Some(row) => PaymentIntent::try_from(row),
            None => self.find_by_id(intent_id).await?.ok_or_else(|| {
                DomainError::new(ErrorCode::IntentNotFound, format!("Intent {} not found", intent_id))
            }),
        }
    }

    async fn mark_failed(&self, intent_id: PaymentIntentId) -> Result<PaymentIntent, DomainError> {
        let updated: Option<PaymentIntentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payment_intents
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING {}
            "#,
            INTENT_COLUMNS
        ))
        .bind(intent_id.as_uuid())
        .bind(intent_status_to_str(IntentStatus::Failed))
        .bind(intent_status_to_str(IntentStatus::Created))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to mark intent failed", e))?;

        match updated {
            Some(row) => PaymentIntent::try_from(row),
            None => self.find_by_id(intent_id).await?.ok_or_else(|| {
                DomainError::new(ErrorCode::IntentNotFound, format!("Intent {} not found", intent_id))
            }),
        }
    }

    async fn cancel_stale(
        &self,
        tenant_id: TenantId,
        created_before: Timestamp,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_intents
            SET status = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND status = $4 AND created_at < $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(created_before.as_datetime())
        .bind(intent_status_to_str(IntentStatus::Cancelled))
        .bind(intent_status_to_str(IntentStatus::Created))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to cancel stale intents", e))?;

        Ok(result.rows_affected())
    }
}
