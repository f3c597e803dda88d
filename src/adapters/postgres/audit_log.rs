//! PostgreSQL implementation of AuditLog.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::rows::{db_error, WebhookLogRow};
use crate::domain::audit::{AuditCompletion, WebhookLogEntry};
use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::ports::AuditLog;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Completes a `received` entry on the given connection.
///
/// Shared with the ledger store so the `processed` transition can commit in
/// the same transaction as the ledger update.
pub(super) async fn complete_entry(
    conn: &mut PgConnection,
    completion: &AuditCompletion,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE webhook_logs SET
            tenant_id = COALESCE($2, tenant_id),
            signature_valid = $3,
            processing_status = $4,
            error_message = $5,
            completed_at = NOW()
        WHERE id = $1
          AND processing_status = 'received'
          AND (tenant_id IS NULL OR $2::uuid IS NULL OR tenant_id = $2)
        "#,
    )
    .bind(completion.id.as_uuid())
    .bind(completion.tenant_id.map(|t| *t.as_uuid()))
    .bind(completion.signature_valid)
    .bind(completion.status.as_str())
    .bind(&completion.error_message)
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to complete audit entry", e))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::AuditEntryNotFound,
            format!("Audit entry {} not found or already completed", completion.id),
        ));
    }
    Ok(())
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn record(&self, entry: &WebhookLogEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_logs (
                id, tenant_id, event_name, raw_payload, signature_valid,
                processing_status, error_message, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.tenant_id.map(|t| *t.as_uuid()))
        .bind(&entry.event_name)
        .bind(&entry.raw_payload)
        .bind(entry.signature_valid)
        .bind(entry.status.as_str())
        .bind(&entry.error_message)
        .bind(entry.received_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record audit entry", e))?;

        Ok(())
    }

    async fn complete(&self, completion: &AuditCompletion) -> Result<(), DomainError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        complete_entry(&mut *conn, completion).await
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        limit: u32,
    ) -> Result<Vec<WebhookLogEntry>, DomainError> {
        let rows: Vec<WebhookLogRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, event_name, raw_payload, signature_valid,
                   processing_status, error_message, received_at
            FROM webhook_logs
            WHERE tenant_id = $1
            ORDER BY received_at DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list audit entries", e))?;

        rows.into_iter().map(WebhookLogEntry::try_from).collect()
    }
}
