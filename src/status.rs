// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;

use crate::models::{Obligation, ObligationStatus};

/// Effective status of a receivable or payable as of `today`.
///
/// A recorded payment always wins. Cancellation is only ever set by hand and
/// is kept as-is. Otherwise the record is overdue once its due date has
/// passed, open before that (a record due today is still open).
pub fn resolve_status(ob: &Obligation, today: NaiveDate) -> ObligationStatus {
    if ob.paid_amount.is_some() {
        return ObligationStatus::Paid;
    }
    if ob.stored_status == ObligationStatus::Cancelled {
        return ObligationStatus::Cancelled;
    }
    if ob.due_date < today {
        ObligationStatus::Overdue
    } else {
        ObligationStatus::Open
    }
}

/// Whether a payment may still be recorded against the record.
pub fn is_payable(status: ObligationStatus) -> bool {
    matches!(status, ObligationStatus::Open | ObligationStatus::Overdue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ob(due: NaiveDate) -> Obligation {
        Obligation {
            id: 1,
            side: Side::Receivable,
            contract_id: None,
            party_id: 1,
            title: "1-1/12".into(),
            due_date: due,
            expected_amount: dec!(1000),
            paid_date: None,
            paid_amount: None,
            discount: Decimal::ZERO,
            penalty: Decimal::ZERO,
            interest: Decimal::ZERO,
            stored_status: ObligationStatus::Open,
            our_number: None,
            cost_center: None,
            note: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn paid_wins_over_due_date() {
        let mut o = ob(d(2024, 1, 10));
        o.paid_amount = Some(dec!(1000));
        assert_eq!(resolve_status(&o, d(2025, 1, 1)), ObligationStatus::Paid);
        assert_eq!(resolve_status(&o, d(2023, 1, 1)), ObligationStatus::Paid);
    }

    #[test]
    fn unpaid_is_overdue_after_due_date_and_open_before() {
        let o = ob(d(2025, 3, 10));
        assert_eq!(resolve_status(&o, d(2025, 3, 11)), ObligationStatus::Overdue);
        assert_eq!(resolve_status(&o, d(2025, 3, 10)), ObligationStatus::Open);
        assert_eq!(resolve_status(&o, d(2025, 3, 1)), ObligationStatus::Open);
    }

    #[test]
    fn cancelled_stays_cancelled() {
        let mut o = ob(d(2020, 1, 1));
        o.stored_status = ObligationStatus::Cancelled;
        assert_eq!(resolve_status(&o, d(2025, 1, 1)), ObligationStatus::Cancelled);
        assert!(!is_payable(resolve_status(&o, d(2025, 1, 1))));
    }

    #[test]
    fn stored_paid_without_amount_is_not_trusted() {
        let mut o = ob(d(2025, 1, 1));
        o.stored_status = ObligationStatus::Paid;
        assert_eq!(resolve_status(&o, d(2025, 2, 1)), ObligationStatus::Overdue);
    }
}
