//! Immutable record of a captured payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    FeeRecordId, PaymentIntentId, PaymentRecordId, TenantId, Timestamp, ValidationError,
};

/// Instrument the payer used at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Netbanking,
    Wallet,
    Emi,
    /// Any method the gateway reports that the ledger does not model.
    Other(String),
}

impl PaymentMethod {
    /// Storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Netbanking => "netbanking",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Emi => "emi",
            PaymentMethod::Other(s) => s,
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "card" => PaymentMethod::Card,
            "upi" => PaymentMethod::Upi,
            "netbanking" => PaymentMethod::Netbanking,
            "wallet" => PaymentMethod::Wallet,
            "emi" => PaymentMethod::Emi,
            other => PaymentMethod::Other(other.to_string()),
        })
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One captured payment against a fee record.
///
/// Written once inside the reconciliation unit and never updated. The
/// gateway transaction id is globally unique across all tenants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentRecordId,
    pub tenant_id: TenantId,
    pub fee_record_id: FeeRecordId,
    pub intent_id: PaymentIntentId,
    pub transaction_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub captured_at: Timestamp,
}

impl PaymentRecord {
    pub fn capture(
        tenant_id: TenantId,
        fee_record_id: FeeRecordId,
        intent_id: PaymentIntentId,
        transaction_id: impl Into<String>,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<Self, ValidationError> {
        let transaction_id = transaction_id.into();
        if transaction_id.trim().is_empty() {
            return Err(ValidationError::empty_field("transaction_id"));
        }
        if amount <= Decimal::ZERO {
            return Err(ValidationError::not_positive("amount"));
        }
        Ok(Self {
            id: PaymentRecordId::new(),
            tenant_id,
            fee_record_id,
            intent_id,
            transaction_id,
            amount,
            method,
            captured_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_builds_record() {
        let record = PaymentRecord::capture(
            TenantId::new(),
            FeeRecordId::new(),
            PaymentIntentId::new(),
            "pay_29QQoUBi66xm2f",
            Decimal::new(4_000_000, 2),
            PaymentMethod::Upi,
        )
        .unwrap();

        assert_eq!(record.transaction_id, "pay_29QQoUBi66xm2f");
        assert_eq!(record.amount.to_string(), "40000.00");
    }

    #[test]
    fn capture_rejects_blank_transaction_id() {
        let result = PaymentRecord::capture(
            TenantId::new(),
            FeeRecordId::new(),
            PaymentIntentId::new(),
            "",
            Decimal::ONE,
            PaymentMethod::Card,
        );
        assert_eq!(result, Err(ValidationError::empty_field("transaction_id")));
    }

    #[test]
    fn unknown_method_is_preserved() {
        let method: PaymentMethod = "paylater".parse().unwrap();
        assert_eq!(method, PaymentMethod::Other("paylater".to_string()));
        assert_eq!(method.as_str(), "paylater");
    }

    #[test]
    fn known_methods_parse_case_insensitively() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
    }
}
