// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::adjustment::apply_adjustment;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, opt_arg, parse_date, parse_decimal, pretty_table, req_arg};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let contract_id = *sub.get_one::<i64>("contract").unwrap();
    let date = parse_date(&req_arg(sub, "date")?)?;
    let percent = parse_decimal(&req_arg(sub, "percent")?)?;
    let note = opt_arg(sub, "note");
    let adj = apply_adjustment(conn, contract_id, date, percent, note.as_deref())?;
    println!(
        "Contract {} adjusted by {}% on {}: new installment {}",
        contract_id,
        percent,
        date,
        fmt_money(&adj.resulting_installment_value)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let contract = sub.get_one::<i64>("contract").copied();
    let data = store::list_adjustments(conn, contract)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|a| {
                vec![
                    a.id.to_string(),
                    a.contract_id.to_string(),
                    a.change_date.to_string(),
                    format!("{}%", a.percentage),
                    fmt_money(&a.resulting_installment_value),
                    a.note.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Contract", "Date", "Percent", "New value", "Note"], rows)
        );
    }
    Ok(())
}
