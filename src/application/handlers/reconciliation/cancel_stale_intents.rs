//! CancelStaleIntentsHandler - Sweeps intents that never saw a capture.
//!
//! Cancellation does not block a late capture: a capture arriving for a
//! cancelled intent is still applied because the funds were collected.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TenantId, Timestamp};
use crate::ports::PaymentIntentLedger;

#[derive(Debug, Clone)]
pub struct CancelStaleIntentsCommand {
    pub tenant_id: TenantId,
    /// Intents still `created` and older than this many days are cancelled.
    pub older_than_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelStaleIntentsResult {
    pub cancelled: u64,
}

pub struct CancelStaleIntentsHandler {
    intents: Arc<dyn PaymentIntentLedger>,
}

impl CancelStaleIntentsHandler {
    pub fn new(intents: Arc<dyn PaymentIntentLedger>) -> Self {
        Self { intents }
    }

    pub async fn handle(
        &self,
        cmd: CancelStaleIntentsCommand,
    ) -> Result<CancelStaleIntentsResult, DomainError> {
        if cmd.older_than_days < 0 {
            return Err(DomainError::validation(
                "older_than_days",
                "Age threshold must not be negative",
            ));
        }

        let cutoff = Timestamp::now().minus_days(cmd.older_than_days);
        let cancelled = self.intents.cancel_stale(cmd.tenant_id, cutoff).await?;

        if cancelled > 0 {
            tracing::info!(tenant_id = %cmd.tenant_id, cancelled, "Stale payment intents cancelled");
        }
        Ok(CancelStaleIntentsResult { cancelled })
    }
}
