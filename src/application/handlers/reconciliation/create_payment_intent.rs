//! CreatePaymentIntentHandler - Registers an intent before the payer is sent
//! to the gateway.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::foundation::{Currency, DomainError, ErrorCode, FeeRecordId, TenantId};
use crate::domain::ledger::PaymentIntent;
use crate::ports::{LedgerStore, PaymentIntentLedger};

/// Command to create a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub tenant_id: TenantId,
    pub fee_record_id: FeeRecordId,
    pub amount: Decimal,
    pub currency: Currency,
    /// Order id issued by the gateway.
    pub order_ref: String,
}

/// Result of successful intent creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentResult {
    pub intent: PaymentIntent,
    /// Balance left on the fee record when the intent was created.
    pub outstanding: Decimal,
}

/// Error type for intent creation.
#[derive(Debug, Clone)]
pub enum CreatePaymentIntentError {
    /// Fee record does not exist in this tenant.
    FeeRecordNotFound(FeeRecordId),
    /// Requested amount is larger than what is still owed.
    AmountExceedsBalance { requested: Decimal, outstanding: Decimal },
    /// Order reference already registered for this tenant.
    DuplicateOrder(String),
    /// Domain error.
    Domain(DomainError),
}

impl std::fmt::Display for CreatePaymentIntentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreatePaymentIntentError::FeeRecordNotFound(id) => {
                write!(f, "Fee record not found: {}", id)
            }
            CreatePaymentIntentError::AmountExceedsBalance {
                requested,
                outstanding,
            } => write!(
                f,
                "Amount {} exceeds outstanding balance {}",
                requested, outstanding
            ),
            CreatePaymentIntentError::DuplicateOrder(order_ref) => {
                write!(f, "Order already registered: {}", order_ref)
            }
            CreatePaymentIntentError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CreatePaymentIntentError {}

impl From<DomainError> for CreatePaymentIntentError {
    fn from(err: DomainError) -> Self {
        CreatePaymentIntentError::Domain(err)
    }
}

/// Handler for creating payment intents.
pub struct CreatePaymentIntentHandler {
    intents: Arc<dyn PaymentIntentLedger>,
    ledger: Arc<dyn LedgerStore>,
}

impl CreatePaymentIntentHandler {
    pub fn new(intents: Arc<dyn PaymentIntentLedger>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { intents, ledger }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, CreatePaymentIntentError> {
        // 1. Amount must be positive
        if cmd.amount <= Decimal::ZERO {
            return Err(DomainError::validation("amount", "Amount must be positive").into());
        }

        // 2. Fee record must exist within the tenant
        let fee = self
            .ledger
            .find_fee_record(cmd.tenant_id, cmd.fee_record_id)
            .await?
            .ok_or(CreatePaymentIntentError::FeeRecordNotFound(cmd.fee_record_id))?;

        // 3. Clamp to the outstanding balance
        let outstanding = fee.outstanding();
        if cmd.amount > outstanding {
            return Err(CreatePaymentIntentError::AmountExceedsBalance {
                requested: cmd.amount,
                outstanding,
            });
        }

        // 4. Persist
        let intent = self
            .intents
            .create(
                cmd.tenant_id,
                cmd.fee_record_id,
                cmd.amount,
                cmd.currency,
                &cmd.order_ref,
            )
            .await
            .map_err(|e| match e.code {
                ErrorCode::DuplicateOrder => {
                    CreatePaymentIntentError::DuplicateOrder(cmd.order_ref.clone())
                }
                _ => CreatePaymentIntentError::Domain(e),
            })?;

        tracing::info!(
            tenant_id = %intent.tenant_id,
            fee_record_id = %intent.fee_record_id,
            order_ref = %intent.order_ref,
            amount = %intent.expected_amount,
            "Payment intent created"
        );

        Ok(CreatePaymentIntentResult {
            intent,
            outstanding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedger;
    use crate::domain::foundation::StudentId;
    use crate::domain::ledger::{FeeRecord, IntentStatus};

    fn rupees(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }

    async fn setup() -> (InMemoryLedger, CreatePaymentIntentHandler, FeeRecord) {
        let ledger = InMemoryLedger::new();
        let fee = FeeRecord::assign(FeeRecordId::new(), TenantId::new(), StudentId::new(), rupees(8_200_000))
            .unwrap();
        ledger.insert_fee_record(fee.clone()).await;
        let store = Arc::new(ledger.clone());
        let handler = CreatePaymentIntentHandler::new(store.clone(), store);
        (ledger, handler, fee)
    }

    fn command(fee: &FeeRecord, minor: i64, order_ref: &str) -> CreatePaymentIntentCommand {
        CreatePaymentIntentCommand {
            tenant_id: fee.tenant_id,
            fee_record_id: fee.id,
            amount: rupees(minor),
            currency: Currency::inr(),
            order_ref: order_ref.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_intent_for_partial_amount() {
        let (ledger, handler, fee) = setup().await;

        let result = handler.handle(command(&fee, 4_000_000, "order_1")).await.unwrap();

        assert_eq!(result.intent.status, IntentStatus::Created);
        assert_eq!(result.outstanding, rupees(8_200_000));
        let found = ledger.find_by_order_ref(fee.tenant_id, "order_1").await.unwrap();
        assert_eq!(found.map(|i| i.id), Some(result.intent.id));
    }

    #[tokio::test]
    async fn rejects_amount_above_outstanding() {
        let (_, handler, fee) = setup().await;

        let err = handler.handle(command(&fee, 8_200_001, "order_1")).await.unwrap_err();

        assert!(matches!(err, CreatePaymentIntentError::AmountExceedsBalance { .. }));
    }

    #[tokio::test]
    async fn rejects_zero_amount() {
        let (_, handler, fee) = setup().await;

        let err = handler.handle(command(&fee, 0, "order_1")).await.unwrap_err();

        match err {
            CreatePaymentIntentError::Domain(e) => assert_eq!(e.code, ErrorCode::ValidationFailed),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn rejects_fee_record_from_another_tenant() {
        let (_, handler, fee) = setup().await;
        let mut cmd = command(&fee, 100, "order_1");
        cmd.tenant_id = TenantId::new();

        let err = handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, CreatePaymentIntentError::FeeRecordNotFound(_)));
    }

    #[tokio::test]
    async fn rejects_duplicate_order_ref_in_same_tenant() {
        let (_, handler, fee) = setup().await;
        handler.handle(command(&fee, 100, "order_1")).await.unwrap();

        let err = handler.handle(command(&fee, 100, "order_1")).await.unwrap_err();

        assert!(matches!(err, CreatePaymentIntentError::DuplicateOrder(_)));
    }
}
