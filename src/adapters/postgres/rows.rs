//! Row types and column mappings shared by the Postgres adapters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::audit::{ProcessingStatus, WebhookLogEntry};
use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, FeeRecordId, PaymentIntentId, PaymentRecordId, StudentId,
    TenantId, Timestamp, WebhookLogId,
};
use crate::domain::ledger::{FeeRecord, FeeStatus, IntentStatus, PaymentIntent, PaymentRecord};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `lock_not_available` (raised by `lock_timeout`).
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Name of the unique constraint that makes transaction ids idempotency keys.
pub(super) const TRANSACTION_ID_CONSTRAINT: &str = "payment_records_transaction_id_key";
pub(super) const ORDER_REF_CONSTRAINT: &str = "payment_intents_tenant_order_ref_key";

/// Returns true if the error is a unique violation on `constraint`.
pub(super) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// Maps a driver error, distinguishing lock contention from other failures.
pub(super) fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(
            db_err.code().as_deref(),
            Some(LOCK_NOT_AVAILABLE) | Some(DEADLOCK_DETECTED)
        ) {
            return DomainError::new(ErrorCode::LockTimeout, format!("{}: {}", context, err));
        }
    }
    DomainError::database(context, err)
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct FeeRecordRow {
    id: Uuid,
    tenant_id: Uuid,
    student_id: Uuid,
    total_due: Decimal,
    amount_paid: Decimal,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FeeRecordRow> for FeeRecord {
    type Error = DomainError;

    fn try_from(row: FeeRecordRow) -> Result<Self, Self::Error> {
        Ok(FeeRecord {
            id: FeeRecordId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            student_id: StudentId::from_uuid(row.student_id),
            total_due: row.total_due,
            amount_paid: row.amount_paid,
            status: parse_fee_status(&row.status)?,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PaymentIntentRow {
    id: Uuid,
    tenant_id: Uuid,
    fee_record_id: Uuid,
    order_ref: String,
    expected_amount: Decimal,
    currency: String,
    status: String,
    gateway_payment_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentIntentRow> for PaymentIntent {
    type Error = DomainError;

    fn try_from(row: PaymentIntentRow) -> Result<Self, Self::Error> {
        Ok(PaymentIntent {
            id: PaymentIntentId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            fee_record_id: FeeRecordId::from_uuid(row.fee_record_id),
            order_ref: row.order_ref,
            expected_amount: row.expected_amount,
            currency: Currency::new(&row.currency).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid currency: {}", e))
            })?,
            status: parse_intent_status(&row.status)?,
            gateway_payment_ref: row.gateway_payment_ref,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PaymentRecordRow {
    id: Uuid,
    tenant_id: Uuid,
    fee_record_id: Uuid,
    intent_id: Uuid,
    transaction_id: String,
    amount: Decimal,
    method: String,
    captured_at: DateTime<Utc>,
}

impl From<PaymentRecordRow> for PaymentRecord {
    fn from(row: PaymentRecordRow) -> Self {
        PaymentRecord {
            id: PaymentRecordId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            fee_record_id: FeeRecordId::from_uuid(row.fee_record_id),
            intent_id: PaymentIntentId::from_uuid(row.intent_id),
            transaction_id: row.transaction_id,
            amount: row.amount,
            method: row.method.parse().unwrap_or_else(|never| match never {}),
            captured_at: Timestamp::from_datetime(row.captured_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct WebhookLogRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    event_name: String,
    raw_payload: String,
    signature_valid: bool,
    processing_status: String,
    error_message: Option<String>,
    received_at: DateTime<Utc>,
}

impl TryFrom<WebhookLogRow> for WebhookLogEntry {
    type Error = DomainError;

    fn try_from(row: WebhookLogRow) -> Result<Self, Self::Error> {
        let status: ProcessingStatus = row.processing_status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status: {}", e))
        })?;
        Ok(WebhookLogEntry {
            id: WebhookLogId::from_uuid(row.id),
            tenant_id: row.tenant_id.map(TenantId::from_uuid),
            event_name: row.event_name,
            raw_payload: row.raw_payload,
            signature_valid: row.signature_valid,
            status,
            error_message: row.error_message,
            received_at: Timestamp::from_datetime(row.received_at),
        })
    }
}

pub(super) fn parse_fee_status(s: &str) -> Result<FeeStatus, DomainError> {
    match s {
        "unpaid" => Ok(FeeStatus::Unpaid),
        "partially_paid" => Ok(FeeStatus::PartiallyPaid),
        "paid" => Ok(FeeStatus::Paid),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid fee status value: {}", s),
        )),
    }
}

pub(super) fn fee_status_to_str(status: FeeStatus) -> &'static str {
    match status {
        FeeStatus::Unpaid => "unpaid",
        FeeStatus::PartiallyPaid => "partially_paid",
        FeeStatus::Paid => "paid",
    }
}

pub(super) fn parse_intent_status(s: &str) -> Result<IntentStatus, DomainError> {
    match s {
        "created" => Ok(IntentStatus::Created),
        "paid" => Ok(IntentStatus::Paid),
        "failed" => Ok(IntentStatus::Failed),
        "cancelled" => Ok(IntentStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid intent status value: {}", s),
        )),
    }
}

pub(super) fn intent_status_to_str(status: IntentStatus) -> &'static str {
    match status {
        IntentStatus::Created => "created",
        IntentStatus::Paid => "paid",
        IntentStatus::Failed => "failed",
        IntentStatus::Cancelled => "cancelled",
    }
}

pub(super) const INTENT_COLUMNS: &str = "id, tenant_id, fee_record_id, order_ref, expected_amount, \
     currency, status, gateway_payment_ref, created_at, updated_at";

pub(super) const PAYMENT_COLUMNS: &str =
    "id, tenant_id, fee_record_id, intent_id, transaction_id, amount, method, captured_at";
