// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::Side;
use crate::status::resolve_status;
use crate::store;
use crate::utils::{req_arg, today_arg};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let (side, sub) = match m.subcommand() {
        Some(("receivables", sub)) => (Side::Receivable, sub),
        Some(("payables", sub)) => (Side::Payable, sub),
        _ => return Ok(()),
    };
    let fmt = req_arg(sub, "format")?.to_lowercase();
    let out = req_arg(sub, "out")?;
    let n = export_obligations(conn, side, &fmt, Path::new(&out), today_arg(sub)?)?;
    println!("Exported {} {} to {}", n, side.table(), out);
    Ok(())
}

/// Writes one side's records with their effective status at `today`.
pub fn export_obligations(
    conn: &Connection,
    side: Side,
    fmt: &str,
    out: &Path,
    today: NaiveDate,
) -> Result<usize> {
    let parties: std::collections::HashMap<i64, String> = store::list_parties(conn)?
        .into_iter()
        .map(|p| (p.id, p.legal_name))
        .collect();
    let rows = store::list_obligations(conn, side, None)?;

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Create {}", out.display()))?;
            wtr.write_record([
                "id", "title", "party", "contract", "due_date", "expected", "paid_date", "paid",
                "discount", "penalty", "interest", "status",
            ])?;
            for o in &rows {
                wtr.write_record([
                    o.id.to_string(),
                    o.title.clone(),
                    parties.get(&o.party_id).cloned().unwrap_or_default(),
                    o.contract_id.map(|c| c.to_string()).unwrap_or_default(),
                    o.due_date.to_string(),
                    o.expected_amount.to_string(),
                    o.paid_date.map(|d| d.to_string()).unwrap_or_default(),
                    o.paid_amount.map(|a| a.to_string()).unwrap_or_default(),
                    o.discount.to_string(),
                    o.penalty.to_string(),
                    o.interest.to_string(),
                    resolve_status(o, today).to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|o| {
                    json!({
                        "id": o.id,
                        "title": o.title,
                        "party": parties.get(&o.party_id),
                        "contract": o.contract_id,
                        "due_date": o.due_date,
                        "expected": o.expected_amount.to_string(),
                        "paid_date": o.paid_date,
                        "paid": o.paid_amount.map(|a| a.to_string()),
                        "discount": o.discount.to_string(),
                        "penalty": o.penalty.to_string(),
                        "interest": o.interest.to_string(),
                        "status": resolve_status(o, today),
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
        other => {
            return Err(LedgerError::validation(format!("unknown format '{}' (use csv|json)", other)).into());
        }
    }
    tracing::info!(side = side.entity(), rows = rows.len(), path = %out.display(), "export written");
    Ok(rows.len())
}
