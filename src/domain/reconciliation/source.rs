//! How a payment confirmation reached the engine.

use serde_json::json;

use super::errors::ReconciliationError;
use super::notification::GatewayNotification;
use crate::domain::credential::CredentialKey;

/// Event name recorded in the audit log for client-side confirmations.
pub const DIRECT_VERIFICATION_EVENT: &str = "payment.verified";

/// A confirmation to reconcile, from either entry point.
///
/// Both variants run the same pipeline. They differ only in which bytes were
/// signed, which tenant secret signs them, and where the capture fields come
/// from.
#[derive(Debug, Clone)]
pub enum ConfirmationSource {
    /// Gateway webhook: the raw body exactly as received.
    Webhook {
        raw_body: Vec<u8>,
        signature: Option<String>,
    },
    /// Client-side confirmation relayed after checkout.
    Direct {
        order_ref: String,
        payment_ref: String,
        signature: String,
    },
    /// Client-side confirmation whose body could not be read.
    ///
    /// Still audited with the raw body before being rejected.
    MalformedDirect { raw_body: Vec<u8>, reason: String },
}

impl ConfirmationSource {
    /// Tenant credential used to verify this confirmation.
    pub fn signing_key(&self) -> CredentialKey {
        match self {
            ConfirmationSource::Webhook { .. } => CredentialKey::WebhookSecret,
            ConfirmationSource::Direct { .. } | ConfirmationSource::MalformedDirect { .. } => {
                CredentialKey::GatewayKeySecret
            }
        }
    }

    /// Exact bytes covered by the presented signature.
    pub fn signed_bytes(&self) -> Vec<u8> {
        match self {
            ConfirmationSource::Webhook { raw_body, .. }
            | ConfirmationSource::MalformedDirect { raw_body, .. } => raw_body.clone(),
            ConfirmationSource::Direct {
                order_ref,
                payment_ref,
                ..
            } => direct_signing_payload(order_ref, payment_ref).into_bytes(),
        }
    }

    /// Signature as presented, if any.
    pub fn presented_signature(&self) -> Option<&str> {
        match self {
            ConfirmationSource::Webhook { signature, .. } => signature.as_deref(),
            ConfirmationSource::Direct { signature, .. } => Some(signature.as_str()),
            ConfirmationSource::MalformedDirect { .. } => None,
        }
    }

    /// Payload stored verbatim in the audit log.
    pub fn audit_payload(&self) -> String {
        match self {
            ConfirmationSource::Webhook { raw_body, .. }
            | ConfirmationSource::MalformedDirect { raw_body, .. } => {
                String::from_utf8_lossy(raw_body).into_owned()
            }
            ConfirmationSource::Direct {
                order_ref,
                payment_ref,
                ..
            } => json!({ "order_ref": order_ref, "payment_ref": payment_ref }).to_string(),
        }
    }

    /// Parses the confirmation into its event name and notification, if any.
    pub fn parse(&self) -> Result<ParsedConfirmation, ReconciliationError> {
        match self {
            ConfirmationSource::Webhook { raw_body, .. } => {
                Ok(ParsedConfirmation::Webhook(GatewayNotification::parse(raw_body)?))
            }
            ConfirmationSource::Direct {
                order_ref,
                payment_ref,
                ..
            } => {
                if order_ref.trim().is_empty() {
                    return Err(ReconciliationError::MalformedNotification(
                        "missing order_ref".into(),
                    ));
                }
                if payment_ref.trim().is_empty() {
                    return Err(ReconciliationError::MalformedNotification(
                        "missing payment_ref".into(),
                    ));
                }
                Ok(ParsedConfirmation::Direct {
                    order_ref: order_ref.clone(),
                    payment_ref: payment_ref.clone(),
                })
            }
            ConfirmationSource::MalformedDirect { reason, .. } => {
                Err(ReconciliationError::MalformedNotification(reason.clone()))
            }
        }
    }
}

/// A confirmation after structural parsing, before verification.
#[derive(Debug, Clone)]
pub enum ParsedConfirmation {
    Webhook(GatewayNotification),
    Direct {
        order_ref: String,
        payment_ref: String,
    },
}

impl ParsedConfirmation {
    pub fn event(&self) -> &str {
        match self {
            ParsedConfirmation::Webhook(n) => n.event(),
            ParsedConfirmation::Direct { .. } => DIRECT_VERIFICATION_EVENT,
        }
    }

    pub fn order_ref(&self) -> Result<&str, ReconciliationError> {
        match self {
            ParsedConfirmation::Webhook(n) => n.order_ref(),
            ParsedConfirmation::Direct { order_ref, .. } => Ok(order_ref),
        }
    }
}

/// Message signed for a direct confirmation: `"{order_ref}|{payment_ref}"`.
pub fn direct_signing_payload(order_ref: &str, payment_ref: &str) -> String {
    format!("{}|{}", order_ref, payment_ref)
}
