//! ReconcilePaymentHandler - Applies a gateway payment confirmation to the ledger.
//!
//! Both entry points (gateway webhook and client-side direct verification)
//! run this one pipeline:
//!
//! 1. parse and extract the order reference
//! 2. resolve the payment intent, which yields the tenant
//! 3. fetch the tenant's signing secret
//! 4. verify the signature over the exact signed bytes
//! 5. short-circuit if the transaction id is already recorded
//! 6. apply atomically under the fee record lock
//! 7. on failure, complete the audit entry as `failed` separately
//!
//! Every confirmation gets an audit entry before step 1, completed once at
//! its terminal state. After step 4 an authentic `payment.failed` report marks
//! the intent failed and stops; other unhandled events are acknowledged.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::audit::{AuditCompletion, ProcessingStatus, WebhookLogEntry};
use crate::domain::foundation::{
    DomainError, ErrorCode, FeeRecordId, PaymentIntentId, PaymentRecordId, StateMachine, TenantId,
    WebhookLogId,
};
use crate::domain::ledger::{FeeStatus, PaymentIntent, PaymentMethod, PaymentRecord};
use crate::domain::reconciliation::{
    ConfirmationSource, NotificationState, ParsedConfirmation, ReconciliationError,
    SignatureVerifier,
};
use crate::ports::{
    ApplyOutcome, AuditLog, CaptureApplication, CredentialVault, LedgerStore,
    PaymentIntentLedger, ServiceRole, VaultError,
};

/// Event names reconciled when no explicit list is configured.
pub const DEFAULT_HANDLED_EVENTS: &[&str] = &["payment.captured", "order.paid"];

/// Gateway event reporting a failed payment attempt.
pub const FAILED_ATTEMPT_EVENT: &str = "payment.failed";

/// Event name logged when the body could not be parsed.
const UNPARSEABLE_EVENT: &str = "unknown";

/// Command to reconcile one confirmation.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    pub source: ConfirmationSource,
}

/// Successful terminal outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    /// Payment recorded and balance updated.
    Applied {
        audit_id: WebhookLogId,
        tenant_id: TenantId,
        payment_id: PaymentRecordId,
        fee_record_id: FeeRecordId,
        amount: Decimal,
        amount_paid: Decimal,
        fee_status: FeeStatus,
    },
    /// The transaction was already applied; nothing changed.
    DuplicatePayment {
        audit_id: WebhookLogId,
        payment_id: PaymentRecordId,
        transaction_id: String,
    },
    /// Authentic failed-attempt report; the intent was marked failed.
    AttemptFailed {
        audit_id: WebhookLogId,
        intent_id: PaymentIntentId,
    },
    /// Authentic event of a kind the ledger does not reconcile.
    Ignored {
        audit_id: WebhookLogId,
        event: String,
    },
}

/// Capture fields resolved against the intent.
#[derive(Debug)]
struct Capture {
    transaction_id: String,
    amount: Decimal,
    method: PaymentMethod,
}

/// Per-request bookkeeping for the audit entry.
#[derive(Debug)]
struct Progress {
    audit_id: WebhookLogId,
    state: NotificationState,
    tenant_id: Option<TenantId>,
    signature_valid: bool,
    audit_completed: bool,
}

impl Progress {
    fn new(audit_id: WebhookLogId) -> Self {
        Self {
            audit_id,
            state: NotificationState::Received,
            tenant_id: None,
            signature_valid: false,
            audit_completed: false,
        }
    }

    fn advance(&mut self, target: NotificationState) {
        match self.state.transition_to(target) {
            Ok(next) => {
                tracing::debug!(audit_id = %self.audit_id, from = ?self.state, to = ?next, "Notification state");
                self.state = next;
            }
            Err(e) => {
                tracing::error!(audit_id = %self.audit_id, error = %e, "Invalid notification transition");
            }
        }
    }

    fn completion(&self, status: ProcessingStatus, error: Option<String>) -> AuditCompletion {
        AuditCompletion {
            id: self.audit_id,
            tenant_id: self.tenant_id,
            signature_valid: self.signature_valid,
            status,
            error_message: error,
        }
    }
}

/// Handler for the reconciliation pipeline.
pub struct ReconcilePaymentHandler {
    intents: Arc<dyn PaymentIntentLedger>,
    ledger: Arc<dyn LedgerStore>,
    vault: Arc<dyn CredentialVault>,
    audit: Arc<dyn AuditLog>,
    verifier: SignatureVerifier,
    role: ServiceRole,
    handled_events: HashSet<String>,
}

impl ReconcilePaymentHandler {
    pub fn new(
        intents: Arc<dyn PaymentIntentLedger>,
        ledger: Arc<dyn LedgerStore>,
        vault: Arc<dyn CredentialVault>,
        audit: Arc<dyn AuditLog>,
        role: ServiceRole,
    ) -> Self {
        Self {
            intents,
            ledger,
            vault,
            audit,
            verifier: SignatureVerifier::new(),
            role,
            handled_events: DEFAULT_HANDLED_EVENTS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replaces the set of webhook event names that are reconciled.
    pub fn with_handled_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handled_events = events.into_iter().map(Into::into).collect();
        self
    }

    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let source = cmd.source;
        let parsed = source.parse();

        let event_name = parsed
            .as_ref()
            .map(|p| p.event().to_string())
            .unwrap_or_else(|_| UNPARSEABLE_EVENT.to_string());
        let entry = WebhookLogEntry::received(event_name, source.audit_payload());
        self.audit.record(&entry).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to record audit entry");
            ReconciliationError::ApplyFailed(e.to_string())
        })?;

        let mut progress = Progress::new(entry.id);
        let result = self.process(&source, parsed, &mut progress).await;

        match result {
            Ok(outcome) => {
                if !progress.audit_completed {
                    let status = progress
                        .state
                        .processing_status()
                        .unwrap_or(ProcessingStatus::Processed);
                    self.complete_audit(&progress, status, None).await;
                }
                log_outcome(&outcome, &progress);
                Ok(outcome)
            }
            Err(err) => {
                let terminal = match err {
                    ReconciliationError::SignatureInvalid => NotificationState::Rejected,
                    _ => NotificationState::Failed,
                };
                progress.advance(terminal);
                let status = progress
                    .state
                    .processing_status()
                    .unwrap_or(ProcessingStatus::Failed);
                self.complete_audit(&progress, status, Some(err.to_string()))
                    .await;
                log_failure(&err, &progress);
                Err(err)
            }
        }
    }

    async fn process(
        &self,
        source: &ConfirmationSource,
        parsed: Result<ParsedConfirmation, ReconciliationError>,
        progress: &mut Progress,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        // 1. Order reference
        let parsed = parsed?;
        let order_ref = parsed.order_ref()?.to_string();

        // 2. Tenant comes from the intent, never from the payload
        let intent = self.resolve_intent(&order_ref).await?;
        progress.tenant_id = Some(intent.tenant_id);

        // 3. Tenant secret
        let secret = self
            .vault
            .get(&self.role, intent.tenant_id, source.signing_key())
            .await
            .map_err(|e| match e {
                VaultError::Storage(msg) => ReconciliationError::ApplyFailed(msg),
                other => ReconciliationError::ConfigurationError(other.to_string()),
            })?;

        // 4. Signature over the exact signed bytes
        let signature_valid = source
            .presented_signature()
            .map(|sig| self.verifier.verify(&source.signed_bytes(), sig, &secret))
            .unwrap_or(false);
        progress.advance(NotificationState::SignatureChecked);
        if !signature_valid {
            return Err(ReconciliationError::SignatureInvalid);
        }
        progress.signature_valid = true;

        if parsed.event() == FAILED_ATTEMPT_EVENT {
            let intent = self
                .intents
                .mark_failed(intent.id)
                .await
                .map_err(store_failure)?;
            progress.advance(NotificationState::Ignored);
            return Ok(ReconciliationOutcome::AttemptFailed {
                audit_id: progress.audit_id,
                intent_id: intent.id,
            });
        }

        if !self.is_handled(&parsed) {
            progress.advance(NotificationState::Ignored);
            return Ok(ReconciliationOutcome::Ignored {
                audit_id: progress.audit_id,
                event: parsed.event().to_string(),
            });
        }

        let capture = capture_for(&parsed, &intent)?;

        // 5. Idempotency gate
        let existing = self
            .ledger
            .find_payment_by_transaction_id(&self.role, &capture.transaction_id)
            .await
            .map_err(store_failure)?;
        if let Some(existing) = existing {
            return duplicate(existing, &intent, progress);
        }

        // 6. Atomic application; the audit entry commits with it
        let application = CaptureApplication {
            tenant_id: intent.tenant_id,
            fee_record_id: intent.fee_record_id,
            intent_id: intent.id,
            transaction_id: capture.transaction_id,
            amount: capture.amount,
            method: capture.method,
            audit: progress.completion(ProcessingStatus::Processed, None),
        };

        match self.ledger.apply_capture(application).await {
            Ok(ApplyOutcome::Applied(receipt)) => {
                progress.advance(NotificationState::Applied);
                progress.audit_completed = true;
                Ok(ReconciliationOutcome::Applied {
                    audit_id: progress.audit_id,
                    tenant_id: receipt.fee_record.tenant_id,
                    payment_id: receipt.payment.id,
                    fee_record_id: receipt.fee_record.id,
                    amount: receipt.payment.amount,
                    amount_paid: receipt.fee_record.amount_paid,
                    fee_status: receipt.fee_record.status,
                })
            }
            Ok(ApplyOutcome::Duplicate(existing)) => duplicate(existing, &intent, progress),
            Err(e) => Err(store_failure(e)),
        }
    }

    async fn resolve_intent(&self, order_ref: &str) -> Result<PaymentIntent, ReconciliationError> {
        match self.intents.resolve_order_ref(&self.role, order_ref).await {
            Ok(Some(intent)) => Ok(intent),
            Ok(None) => Err(ReconciliationError::IntentNotFound(order_ref.to_string())),
            Err(e) if e.code == ErrorCode::AmbiguousOrderRef => {
                tracing::warn!(order_ref = %order_ref, "Order reference matches several tenants");
                Err(ReconciliationError::IntentNotFound(order_ref.to_string()))
            }
            Err(e) => Err(store_failure(e)),
        }
    }

    fn is_handled(&self, parsed: &ParsedConfirmation) -> bool {
        match parsed {
            ParsedConfirmation::Webhook(n) => self.handled_events.contains(n.event()),
            ParsedConfirmation::Direct { .. } => true,
        }
    }

    /// Completes the audit entry in its own unit of work.
    ///
    /// A failure here cannot change the outcome already decided, so it is
    /// logged rather than returned.
    async fn complete_audit(
        &self,
        progress: &Progress,
        status: ProcessingStatus,
        error: Option<String>,
    ) {
        let completion = progress.completion(status, error);
        if let Err(e) = self.audit.complete(&completion).await {
            tracing::error!(
                audit_id = %progress.audit_id,
                error = %e,
                "Failed to complete audit entry"
            );
        }
    }
}

fn capture_for(
    parsed: &ParsedConfirmation,
    intent: &PaymentIntent,
) -> Result<Capture, ReconciliationError> {
    match parsed {
        ParsedConfirmation::Webhook(notification) => {
            let details = notification.capture()?;
            if details.currency != intent.currency {
                return Err(ReconciliationError::MalformedNotification(format!(
                    "currency {} does not match intent currency {}",
                    details.currency, intent.currency
                )));
            }
            let amount = details
                .currency
                .from_minor_units(details.amount_minor)
                .map_err(|e| ReconciliationError::MalformedNotification(e.to_string()))?;
            Ok(Capture {
                transaction_id: details.transaction_id,
                amount,
                method: details.method,
            })
        }
        ParsedConfirmation::Direct { payment_ref, .. } => Ok(Capture {
            transaction_id: payment_ref.clone(),
            amount: intent.expected_amount,
            method: PaymentMethod::Other("unknown".to_string()),
        }),
    }
}

fn duplicate(
    existing: PaymentRecord,
    intent: &PaymentIntent,
    progress: &mut Progress,
) -> Result<ReconciliationOutcome, ReconciliationError> {
    if existing.tenant_id != intent.tenant_id {
        return Err(ReconciliationError::ReadOnlyViolation(format!(
            "transaction {} is recorded under another tenant",
            existing.transaction_id
        )));
    }
    progress.advance(NotificationState::Duplicate);
    Ok(ReconciliationOutcome::DuplicatePayment {
        audit_id: progress.audit_id,
        payment_id: existing.id,
        transaction_id: existing.transaction_id,
    })
}

fn store_failure(e: DomainError) -> ReconciliationError {
    match e.code {
        ErrorCode::TenantMismatch => ReconciliationError::ReadOnlyViolation(e.message),
        _ => ReconciliationError::ApplyFailed(e.to_string()),
    }
}

fn log_outcome(outcome: &ReconciliationOutcome, progress: &Progress) {
    let tenant_id = progress.tenant_id.map(|t| t.to_string()).unwrap_or_default();
    match outcome {
        ReconciliationOutcome::Applied {
            payment_id,
            amount,
            amount_paid,
            fee_status,
            ..
        } => tracing::info!(
            tenant_id = %tenant_id,
            payment_id = %payment_id,
            amount = %amount,
            amount_paid = %amount_paid,
            fee_status = ?fee_status,
            "Payment applied"
        ),
        ReconciliationOutcome::DuplicatePayment { transaction_id, .. } => tracing::info!(
            tenant_id = %tenant_id,
            transaction_id = %transaction_id,
            "Duplicate payment acknowledged"
        ),
        ReconciliationOutcome::AttemptFailed { intent_id, .. } => tracing::info!(
            tenant_id = %tenant_id,
            intent_id = %intent_id,
            "Payment attempt reported failed"
        ),
        ReconciliationOutcome::Ignored { event, .. } => tracing::info!(
            tenant_id = %tenant_id,
            event = %event,
            "Event acknowledged without reconciliation"
        ),
    }
}

fn log_failure(err: &ReconciliationError, progress: &Progress) {
    let tenant_id = progress.tenant_id.map(|t| t.to_string()).unwrap_or_default();
    match err {
        ReconciliationError::ReadOnlyViolation(detail) => tracing::error!(
            target: "security",
            tenant_id = %tenant_id,
            audit_id = %progress.audit_id,
            detail = %detail,
            "Cross-tenant access attempted"
        ),
        ReconciliationError::SignatureInvalid => tracing::warn!(
            tenant_id = %tenant_id,
            audit_id = %progress.audit_id,
            "Rejected confirmation with invalid signature"
        ),
        ReconciliationError::ApplyFailed(detail) => tracing::error!(
            tenant_id = %tenant_id,
            audit_id = %progress.audit_id,
            error = %detail,
            "Payment apply failed, awaiting redelivery"
        ),
        other => tracing::warn!(
            tenant_id = %tenant_id,
            audit_id = %progress.audit_id,
            error = %other,
            "Confirmation failed"
        ),
    }
}
