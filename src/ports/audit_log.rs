//! AuditLog port - Append-only record of inbound confirmations.

use async_trait::async_trait;

use crate::domain::audit::{AuditCompletion, WebhookLogEntry};
use crate::domain::foundation::{DomainError, TenantId};

/// Port for the notification audit trail.
///
/// Each entry is written once in `received` state and completed once, by the
/// request that created it.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends a new entry.
    async fn record(&self, entry: &WebhookLogEntry) -> Result<(), DomainError>;

    /// Moves a `received` entry to its terminal status.
    ///
    /// # Errors
    ///
    /// - `AuditEntryNotFound` if the entry doesn't exist or is already complete
    /// - `TenantMismatch` if the entry is attributed to another tenant
    async fn complete(&self, completion: &AuditCompletion) -> Result<(), DomainError>;

    /// Most recent entries attributed to one tenant, newest first.
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
        limit: u32,
    ) -> Result<Vec<WebhookLogEntry>, DomainError>;
}
