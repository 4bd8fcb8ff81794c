// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::LedgerError;
use crate::models::{Adjustment, ContractStatus};
use crate::store;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `value * (1 + percentage / 100)`, rounded half away from zero to cents.
pub fn adjusted_value(value: Decimal, percentage: Decimal) -> Decimal {
    (value * (Decimal::ONE + percentage / HUNDRED))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a percentage adjustment to an active contract: stores the
/// adjustment row and rewrites the contract's installment value in one
/// transaction.
pub fn apply_adjustment(
    conn: &mut Connection,
    contract_id: i64,
    change_date: NaiveDate,
    percentage: Decimal,
    note: Option<&str>,
) -> Result<Adjustment> {
    let tx = conn.transaction()?;
    let contract = store::load_contract(&tx, contract_id)?;
    if contract.status != ContractStatus::Active {
        return Err(LedgerError::invalid_state(
            "contract",
            contract_id,
            contract.status,
            ContractStatus::Active,
        )
        .into());
    }

    let new_value = adjusted_value(contract.installment_value, percentage);
    tx.execute(
        "INSERT INTO adjustments(contract_id, change_date, percentage, resulting_value, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            contract_id,
            change_date.to_string(),
            percentage.to_string(),
            new_value.to_string(),
            note
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.execute(
        "UPDATE contracts SET installment_value=?1 WHERE id=?2",
        params![new_value.to_string(), contract_id],
    )?;
    tx.commit()
        .with_context(|| format!("Commit adjustment for contract {}", contract_id))?;

    tracing::info!(
        contract_id,
        %percentage,
        old = %contract.installment_value,
        new = %new_value,
        "contract adjusted"
    );
    Ok(Adjustment {
        id,
        contract_id,
        change_date,
        percentage,
        resulting_installment_value: new_value,
        note: note.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn five_percent_on_a_thousand() {
        assert_eq!(adjusted_value(dec!(1000.00), dec!(5.0)), dec!(1050.00));
    }

    #[test]
    fn zero_percent_is_identity() {
        for v in [dec!(0), dec!(1), dec!(999.99), dec!(1234.56)] {
            assert_eq!(adjusted_value(v, Decimal::ZERO), v);
        }
    }

    #[test]
    fn negative_percentage_lowers_value() {
        assert_eq!(adjusted_value(dec!(1000), dec!(-10)), dec!(900.00));
    }

    #[test]
    fn rounds_to_cents() {
        // 1234.56 * 1.0437 = 1288.51027...
        assert_eq!(adjusted_value(dec!(1234.56), dec!(4.37)), dec!(1288.51));
        // 100.05 * 1.5 = 150.075 -> away from zero
        assert_eq!(adjusted_value(dec!(100.05), dec!(50)), dec!(150.08));
    }

    #[test]
    fn adjusted_value_table() {
        let cases = [
            (dec!(1234.56), dec!(-3.5), dec!(1191.35)),
            (dec!(0.01), dec!(50), dec!(0.02)),
            (dec!(-200), dec!(5), dec!(-210.00)),
            (dec!(-0.01), dec!(50), dec!(-0.02)),
            (dec!(99.99), dec!(0.01), dec!(100.00)),
            (dec!(1000000000.00), dec!(12.345), dec!(1123450000.00)),
            (dec!(2500), dec!(-100), dec!(0.00)),
            (dec!(333.33), dec!(33.333), dec!(444.44)),
            (dec!(0.005), dec!(0), dec!(0.01)),
        ];
        for (value, pct, expected) in cases {
            let got = adjusted_value(value, pct);
            assert_eq!(got, expected, "{value} at {pct}%");
            assert!(got.scale() <= 2, "{got} has more than two decimals");
        }
    }
}
