//! Gateway capture notification payload.
//!
//! Expected shape:
//!
//! ```json
//! {
//!   "event": "payment.captured",
//!   "payload": {
//!     "payment": {
//!       "entity": {
//!         "id": "pay_29QQoUBi66xm2f",
//!         "order_id": "order_9A33XWu170gUtm",
//!         "amount": 4000000,
//!         "currency": "INR",
//!         "method": "upi"
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Fields are parsed leniently so the order reference can be extracted first.
//! The capture fields are checked only after the signature is verified.

use serde::Deserialize;

use super::errors::ReconciliationError;
use crate::domain::foundation::Currency;
use crate::domain::ledger::PaymentMethod;

#[derive(Debug, Clone, Default, Deserialize)]
struct RawNotification {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    payload: Option<RawPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawPayload {
    #[serde(default)]
    payment: Option<RawEntity<RawPayment>>,
    #[serde(default)]
    order: Option<RawEntity<RawOrder>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawEntity<T> {
    entity: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawPayment {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawOrder {
    #[serde(default)]
    id: Option<String>,
}

/// A parsed inbound notification, not yet verified.
#[derive(Debug, Clone)]
pub struct GatewayNotification {
    event: String,
    order_ref: Option<String>,
    payment: RawPayment,
}

/// Capture fields required to touch the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDetails {
    pub transaction_id: String,
    pub order_ref: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub method: PaymentMethod,
}

impl GatewayNotification {
    /// Parses the raw body without interpreting it further.
    pub fn parse(raw: &[u8]) -> Result<Self, ReconciliationError> {
        let parsed: RawNotification = serde_json::from_slice(raw)
            .map_err(|e| ReconciliationError::MalformedNotification(e.to_string()))?;

        let event = parsed
            .event
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ReconciliationError::MalformedNotification("missing event".into()))?;

        let payload = parsed.payload.unwrap_or_default();
        let payment = payload.payment.map(|p| p.entity).unwrap_or_default();

        let order_ref = payment
            .order_id
            .clone()
            .or_else(|| payload.order.and_then(|o| o.entity.id))
            .filter(|r| !r.trim().is_empty());

        Ok(Self {
            event,
            order_ref,
            payment,
        })
    }

    /// Gateway event name (`payment.captured`, `order.paid`, ...).
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Order reference, the only field trusted before verification.
    pub fn order_ref(&self) -> Result<&str, ReconciliationError> {
        self.order_ref
            .as_deref()
            .ok_or_else(|| ReconciliationError::MalformedNotification("missing order_id".into()))
    }

    /// Extracts the capture fields.
    pub fn capture(&self) -> Result<CaptureDetails, ReconciliationError> {
        let order_ref = self.order_ref()?.to_string();
        let transaction_id = self
            .payment
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ReconciliationError::MalformedNotification("missing payment id".into()))?;
        let amount_minor = self
            .payment
            .amount
            .filter(|a| *a > 0)
            .ok_or_else(|| {
                ReconciliationError::MalformedNotification("missing or non-positive amount".into())
            })?;
        let currency = self
            .payment
            .currency
            .as_deref()
            .ok_or_else(|| ReconciliationError::MalformedNotification("missing currency".into()))
            .and_then(|c| {
                Currency::new(c)
                    .map_err(|e| ReconciliationError::MalformedNotification(e.to_string()))
            })?;
        let method = self
            .payment
            .method
            .as_deref()
            .map(|m| m.parse().unwrap_or(PaymentMethod::Other(m.to_string())))
            .unwrap_or_else(|| PaymentMethod::Other("unknown".to_string()));

        Ok(CaptureDetails {
            transaction_id,
            order_ref,
            amount_minor,
            currency,
            method,
        })
    }
}
