// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryKind, ObligationStatus, Side};
use crate::status::resolve_status;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, pretty_table, today_arg};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => print_dashboard(conn, sub)?,
        Some(("cashflow", sub)) => print_cashflow(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub total: Decimal,
}

impl Bucket {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount;
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SideTotals {
    pub open: Bucket,
    pub overdue: Bucket,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub receivables: SideTotals,
    pub payables: SideTotals,
    pub balances: Vec<(String, Decimal)>,
}

fn side_totals(conn: &Connection, side: Side, today: NaiveDate) -> Result<SideTotals> {
    let mut totals = SideTotals::default();
    for ob in store::list_obligations(conn, side, None)? {
        match resolve_status(&ob, today) {
            ObligationStatus::Open => totals.open.add(ob.expected_amount),
            ObligationStatus::Overdue => totals.overdue.add(ob.expected_amount),
            _ => {}
        }
    }
    Ok(totals)
}

pub fn dashboard(conn: &Connection, today: NaiveDate) -> Result<Dashboard> {
    Ok(Dashboard {
        today,
        receivables: side_totals(conn, Side::Receivable, today)?,
        payables: side_totals(conn, Side::Payable, today)?,
        balances: store::list_accounts(conn)?
            .into_iter()
            .map(|a| (a.name, a.current_balance))
            .collect(),
    })
}

fn print_dashboard(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let d = dashboard(conn, today_arg(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    let line = |label: &str, b: &Bucket| vec![label.to_string(), b.count.to_string(), fmt_money(&b.total)];
    let rows = vec![
        line("Receivable open", &d.receivables.open),
        line("Receivable overdue", &d.receivables.overdue),
        line("Payable open", &d.payables.open),
        line("Payable overdue", &d.payables.overdue),
    ];
    println!("As of {}", d.today);
    println!("{}", pretty_table(&["Book", "Count", "Total"], rows));
    let rows = d
        .balances
        .iter()
        .map(|(name, bal)| vec![name.clone(), fmt_money(bal)])
        .collect();
    println!("{}", pretty_table(&["Account", "Balance"], rows));
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthFlow {
    pub month: String,
    pub inflow: Decimal,
    pub outflow: Decimal,
}

/// Inflow/outflow per month, newest first. Transfers move money between own
/// accounts and are left out.
pub fn cashflow(conn: &Connection, months: usize) -> Result<Vec<MonthFlow>> {
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for e in store::list_entries(conn, None)? {
        let slot = map
            .entry(e.date.format("%Y-%m").to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match e.kind {
            EntryKind::Inflow => slot.0 += e.amount,
            EntryKind::Outflow => slot.1 += e.amount,
            EntryKind::Transfer => {}
        }
    }
    Ok(map
        .into_iter()
        .rev()
        .take(months)
        .map(|(month, (inflow, outflow))| MonthFlow {
            month,
            inflow,
            outflow,
        })
        .collect())
}

fn print_cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
    let data = cashflow(conn, months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|m| {
                vec![
                    m.month.clone(),
                    fmt_money(&m.inflow),
                    fmt_money(&m.outflow),
                    fmt_money(&(m.inflow - m.outflow)),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Inflow", "Outflow", "Net"], rows));
    }
    Ok(())
}
