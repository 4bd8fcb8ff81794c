// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::cashbook::recomputed_balance;
use crate::models::{ObligationStatus, Side};
use crate::store;
use crate::utils::{fmt_money, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

/// Integrity findings as `[issue, detail]` rows.
pub fn check(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Contract value out of step with its last adjustment
    for c in store::list_contracts(conn)? {
        if let Some(adj) = store::latest_adjustment(conn, c.id)? {
            if adj.resulting_installment_value != c.installment_value {
                rows.push(vec![
                    "contract_value_mismatch".into(),
                    format!(
                        "contract {}: {} vs adjustment {} ({})",
                        c.id,
                        fmt_money(&c.installment_value),
                        adj.id,
                        fmt_money(&adj.resulting_installment_value)
                    ),
                ]);
            }
        }
    }

    // 2) Payments on cancelled records
    for side in [Side::Receivable, Side::Payable] {
        for ob in store::list_obligations(conn, side, None)? {
            if ob.stored_status == ObligationStatus::Cancelled && ob.paid_amount.is_some() {
                rows.push(vec![
                    "paid_but_cancelled".into(),
                    format!("{} {} '{}'", side.entity(), ob.id, ob.title),
                ]);
            }
        }
    }

    // 3) Cached balance drift
    for a in store::list_accounts(conn)? {
        let expected = recomputed_balance(conn, a.id)?;
        if expected != a.current_balance {
            rows.push(vec![
                "balance_drift".into(),
                format!(
                    "{}: stored {} vs entries {}",
                    a.name,
                    fmt_money(&a.current_balance),
                    fmt_money(&expected)
                ),
            ]);
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = check(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        tracing::warn!(issues = rows.len(), "doctor found issues");
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
