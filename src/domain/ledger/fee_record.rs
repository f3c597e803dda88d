//! Fee record aggregate and its payment-status invariant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FeeRecordId, StudentId, TenantId, Timestamp, ValidationError};

/// Collection status of a fee record.
///
/// Always derived from the balance, never set independently:
/// - `Paid` when `amount_paid >= total_due`
/// - `PartiallyPaid` when `0 < amount_paid < total_due`
/// - `Unpaid` otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl FeeStatus {
    /// Derives the status for a balance.
    pub fn derive(amount_paid: Decimal, total_due: Decimal) -> Self {
        if amount_paid >= total_due {
            FeeStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            FeeStatus::PartiallyPaid
        } else {
            FeeStatus::Unpaid
        }
    }
}

/// Amount owed by one student to one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub id: FeeRecordId,
    pub tenant_id: TenantId,
    pub student_id: StudentId,
    pub total_due: Decimal,
    pub amount_paid: Decimal,
    pub status: FeeStatus,
    pub updated_at: Timestamp,
}

impl FeeRecord {
    /// Initializes an unpaid fee record (bulk assignment entry point).
    pub fn assign(
        id: FeeRecordId,
        tenant_id: TenantId,
        student_id: StudentId,
        total_due: Decimal,
    ) -> Result<Self, ValidationError> {
        if total_due <= Decimal::ZERO {
            return Err(ValidationError::not_positive("total_due"));
        }
        Ok(Self {
            id,
            tenant_id,
            student_id,
            total_due,
            amount_paid: Decimal::ZERO,
            status: FeeStatus::Unpaid,
            updated_at: Timestamp::now(),
        })
    }

    /// Remaining balance, never negative.
    pub fn outstanding(&self) -> Decimal {
        (self.total_due - self.amount_paid).max(Decimal::ZERO)
    }

    /// Adds a captured amount to the balance and re-derives the status.
    ///
    /// The amount is not clamped to the outstanding balance; clamping happens
    /// when the intent is created, before the payer reaches the gateway.
    pub fn apply_payment(&mut self, amount: Decimal, at: Timestamp) -> Result<(), ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::not_positive("amount"));
        }
        self.amount_paid += amount;
        self.status = FeeStatus::derive(self.amount_paid, self.total_due);
        self.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rupees(minor: i64) -> Decimal {
        Decimal::new(minor, 2)
    }

    fn record(total_minor: i64) -> FeeRecord {
        FeeRecord::assign(
            FeeRecordId::new(),
            TenantId::new(),
            StudentId::new(),
            rupees(total_minor),
        )
        .unwrap()
    }

    #[test]
    fn new_record_is_unpaid() {
        let fee = record(8_200_000);
        assert_eq!(fee.status, FeeStatus::Unpaid);
        assert_eq!(fee.amount_paid, Decimal::ZERO);
        assert_eq!(fee.outstanding(), rupees(8_200_000));
    }

    #[test]
    fn assign_rejects_non_positive_total() {
        let result = FeeRecord::assign(
            FeeRecordId::new(),
            TenantId::new(),
            StudentId::new(),
            Decimal::ZERO,
        );
        assert!(result.is_err());
    }

    #[test]
    fn partial_then_full_payment() {
        let mut fee = record(8_200_000);

        fee.apply_payment(rupees(4_000_000), Timestamp::now()).unwrap();
        assert_eq!(fee.amount_paid, rupees(4_000_000));
        assert_eq!(fee.status, FeeStatus::PartiallyPaid);

        fee.apply_payment(rupees(4_200_000), Timestamp::now()).unwrap();
        assert_eq!(fee.amount_paid, rupees(8_200_000));
        assert_eq!(fee.status, FeeStatus::Paid);
        assert_eq!(fee.outstanding(), Decimal::ZERO);
    }

    #[test]
    fn one_paisa_short_is_partially_paid() {
        let mut fee = record(8_200_000);
        fee.apply_payment(rupees(8_199_999), Timestamp::now()).unwrap();
        assert_eq!(fee.status, FeeStatus::PartiallyPaid);
    }

    #[test]
    fn overpayment_is_not_clamped() {
        let mut fee = record(1_000);
        fee.apply_payment(rupees(1_500), Timestamp::now()).unwrap();
        assert_eq!(fee.amount_paid, rupees(1_500));
        assert_eq!(fee.status, FeeStatus::Paid);
        assert_eq!(fee.outstanding(), Decimal::ZERO);
    }

    #[test]
    fn zero_payment_is_rejected() {
        let mut fee = record(1_000);
        assert!(fee.apply_payment(Decimal::ZERO, Timestamp::now()).is_err());
        assert_eq!(fee.status, FeeStatus::Unpaid);
    }

    proptest! {
        #[test]
        fn status_matches_balance_invariant(total in 1i64..10_000_000, paid in 1i64..10_000_000) {
            prop_assume!(paid <= total);
            let mut fee = record(total);
            fee.apply_payment(rupees(paid), Timestamp::now()).unwrap();

            if paid == total {
                prop_assert_eq!(fee.status, FeeStatus::Paid);
            } else {
                prop_assert_eq!(fee.status, FeeStatus::PartiallyPaid);
            }
        }

        #[test]
        fn amount_paid_never_decreases(payments in proptest::collection::vec(1i64..100_000, 1..10)) {
            let mut fee = record(1_000_000);
            let mut previous = fee.amount_paid;
            for minor in payments {
                fee.apply_payment(rupees(minor), Timestamp::now()).unwrap();
                prop_assert!(fee.amount_paid > previous);
                previous = fee.amount_paid;
            }
        }
    }
}
