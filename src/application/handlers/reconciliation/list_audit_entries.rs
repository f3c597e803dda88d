//! ListAuditEntriesHandler - Query handler for a tenant's notification log.

use std::sync::Arc;

use crate::domain::audit::WebhookLogEntry;
use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::AuditLog;

/// Upper bound on entries returned in one page.
pub const MAX_AUDIT_PAGE: u32 = 500;

#[derive(Debug, Clone)]
pub struct ListAuditEntriesQuery {
    pub tenant_id: TenantId,
    pub limit: Option<u32>,
}

pub struct ListAuditEntriesHandler {
    audit: Arc<dyn AuditLog>,
}

impl ListAuditEntriesHandler {
    pub fn new(audit: Arc<dyn AuditLog>) -> Self {
        Self { audit }
    }

    /// Newest entries first, capped at `MAX_AUDIT_PAGE`.
    pub async fn handle(
        &self,
        query: ListAuditEntriesQuery,
    ) -> Result<Vec<WebhookLogEntry>, DomainError> {
        let limit = query.limit.unwrap_or(50).clamp(1, MAX_AUDIT_PAGE);
        self.audit.list_for_tenant(query.tenant_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::domain::audit::{AuditCompletion, ProcessingStatus};

    #[tokio::test]
    async fn lists_only_entries_completed_for_tenant() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();

        let ours = WebhookLogEntry::received("payment.captured", "{}");
        let unresolved = WebhookLogEntry::received("unknown", "garbage");
        ledger.record(&ours).await.unwrap();
        ledger.record(&unresolved).await.unwrap();
        ledger
            .complete(&AuditCompletion {
                id: ours.id,
                tenant_id: Some(tenant),
                signature_valid: true,
                status: ProcessingStatus::Processed,
                error_message: None,
            })
            .await
            .unwrap();

        let handler = ListAuditEntriesHandler::new(Arc::new(ledger));
        let entries = handler
            .handle(ListAuditEntriesQuery {
                tenant_id: tenant,
                limit: None,
            })
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, ours.id);
    }

    #[tokio::test]
    async fn zero_limit_still_returns_one() {
        let ledger = InMemoryLedger::new();
        let tenant = TenantId::new();
        for _ in 0..3 {
            let entry = WebhookLogEntry::received("payment.captured", "{}");
            ledger.record(&entry).await.unwrap();
            ledger
                .complete(&AuditCompletion {
                    id: entry.id,
                    tenant_id: Some(tenant),
                    signature_valid: true,
                    status: ProcessingStatus::Processed,
                    error_message: None,
                })
                .await
                .unwrap();
        }

        let handler = ListAuditEntriesHandler::new(Arc::new(ledger));
        let entries = handler
            .handle(ListAuditEntriesQuery {
                tenant_id: tenant,
                limit: Some(0),
            })
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
    }
}
