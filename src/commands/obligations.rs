// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::cashbook::{self, NewEntry};
use crate::error::LedgerError;
use crate::models::{Obligation, ObligationStatus, Side};
use crate::schedule::{self, Cadence};
use crate::status::{is_payable, resolve_status};
use crate::store::{self, NewObligation};
use crate::utils::{
    fmt_money, get_setting, id_for_account, id_for_party, maybe_print_json, opt_arg, opt_date,
    opt_decimal, parse_date, parse_decimal, parse_month, pretty_table, req_arg, today_arg,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

/// Setting naming the account used when `pay` gets no `--account`.
pub const DEFAULT_ACCOUNT_KEY: &str = "default_account";

pub fn handle(conn: &mut Connection, side: Side, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, side, sub)?,
        Some(("list", sub)) => list(conn, side, sub)?,
        Some(("show", sub)) => show(conn, side, sub)?,
        Some(("pay", sub)) => pay(conn, side, sub)?,
        Some(("reverse", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            reverse_payment(conn, side, id)?;
            println!("Reversed payment of {} {}", side.entity(), id);
        }
        Some(("cancel", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            cancel_obligation(conn, side, id, today_arg(sub)?)?;
            println!("Cancelled {} {}", side.entity(), id);
        }
        Some(("replicate", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let count = *sub.get_one::<u32>("count").unwrap();
            let cadence = Cadence::from_options(
                sub.get_one::<u32>("due_day").copied(),
                sub.get_one::<u32>("interval_days").copied(),
            )?;
            let ids = replicate_payable(conn, id, count, cadence)?;
            println!("Created {} copies of payable {}", ids.len(), id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, side: Side, sub: &clap::ArgMatches) -> Result<()> {
    let party_id = id_for_party(conn, &req_arg(sub, "party")?)?;
    let party = store::load_party(conn, party_id)?;
    let allowed = match side {
        Side::Receivable => party.role.is_client(),
        Side::Payable => party.role.is_vendor(),
    };
    if !allowed {
        return Err(LedgerError::validation(format!(
            "party {} is a {} and cannot hold a {}",
            party.id,
            party.role,
            side.entity()
        ))
        .into());
    }
    let contract_id = sub.get_one::<i64>("contract").copied();
    if let Some(cid) = contract_id {
        store::load_contract(conn, cid)?;
    }
    let amount = parse_decimal(&req_arg(sub, "amount")?)?;
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be positive").into());
    }
    let ob = NewObligation {
        contract_id,
        party_id,
        title: req_arg(sub, "title")?,
        due_date: parse_date(&req_arg(sub, "due")?)?,
        expected_amount: amount,
        cost_center: match side {
            Side::Payable => opt_arg(sub, "cost_center"),
            Side::Receivable => None,
        },
        note: opt_arg(sub, "note"),
    };
    let id = store::insert_obligation(conn, side, &ob)?;
    tracing::info!(id, side = side.entity(), title = %ob.title, "obligation registered");
    println!(
        "Added {} {} '{}' due {} for {}",
        side.entity(),
        id,
        ob.title,
        ob.due_date,
        fmt_money(&ob.expected_amount)
    );
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
struct ObligationView {
    #[serde(flatten)]
    obligation: Obligation,
    status: ObligationStatus,
}

fn list(conn: &Connection, side: Side, sub: &clap::ArgMatches) -> Result<()> {
    let today = today_arg(sub)?;
    let status = opt_arg(sub, "status")
        .map(|s| s.parse::<ObligationStatus>())
        .transpose()?;
    let party = opt_arg(sub, "party")
        .map(|p| id_for_party(conn, &p))
        .transpose()?;
    let month = opt_arg(sub, "month").map(|m| parse_month(&m)).transpose()?;
    let contract = sub.get_one::<i64>("contract").copied();

    let data: Vec<ObligationView> = store::list_obligations(conn, side, contract)?
        .into_iter()
        .filter(|o| party.is_none_or(|p| o.party_id == p))
        .filter(|o| {
            month
                .as_ref()
                .is_none_or(|m| o.due_date.format("%Y-%m").to_string() == *m)
        })
        .map(|o| ObligationView {
            status: resolve_status(&o, today),
            obligation: o,
        })
        .filter(|v| status.is_none_or(|s| v.status == s))
        .collect();

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|v| {
                let o = &v.obligation;
                vec![
                    o.id.to_string(),
                    o.title.clone(),
                    o.party_id.to_string(),
                    o.due_date.to_string(),
                    fmt_money(&o.expected_amount),
                    o.paid_date.map(|d| d.to_string()).unwrap_or_default(),
                    o.paid_amount.map(|a| fmt_money(&a)).unwrap_or_default(),
                    v.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Title", "Party", "Due", "Expected", "Paid on", "Paid", "Status"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, side: Side, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = today_arg(sub)?;
    let o = store::load_obligation(conn, side, id)?;
    let view = ObligationView {
        status: resolve_status(&o, today),
        obligation: o,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// What the caller knows about a payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub date: NaiveDate,
    pub amount: Option<Decimal>,
    pub discount: Decimal,
    pub penalty: Decimal,
    pub interest: Decimal,
    pub account_id: Option<i64>,
}

impl PaymentInput {
    pub fn on(date: NaiveDate) -> Self {
        PaymentInput {
            date,
            amount: None,
            discount: Decimal::ZERO,
            penalty: Decimal::ZERO,
            interest: Decimal::ZERO,
            account_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub paid_amount: Decimal,
    pub entry_id: Option<i64>,
}

fn default_account(conn: &Connection) -> Result<Option<i64>> {
    get_setting(conn, DEFAULT_ACCOUNT_KEY)?
        .map(|name| id_for_account(conn, &name))
        .transpose()
}

/// Settles an Open or Overdue obligation. When an account is given, or the
/// `default_account` setting names one, the money is posted to the cash book
/// as `paid + interest + penalty - discount`.
pub fn record_payment(
    conn: &mut Connection,
    side: Side,
    id: i64,
    today: NaiveDate,
    input: &PaymentInput,
) -> Result<PaymentOutcome> {
    for (label, v) in [
        ("discount", input.discount),
        ("penalty", input.penalty),
        ("interest", input.interest),
    ] {
        if v.is_sign_negative() {
            return Err(LedgerError::validation(format!("{} cannot be negative", label)).into());
        }
    }
    let tx = conn.transaction()?;
    let ob = store::load_obligation(&tx, side, id)?;
    let current = resolve_status(&ob, today);
    if !is_payable(current) {
        return Err(LedgerError::invalid_state(side.entity(), id, current, "open or overdue").into());
    }
    let paid = input.amount.unwrap_or(ob.expected_amount);
    if paid <= Decimal::ZERO {
        return Err(LedgerError::validation(format!("paid amount {} must be positive", paid)).into());
    }
    let total = paid + input.interest + input.penalty - input.discount;
    if total <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "discount {} leaves nothing to settle (net {})",
            input.discount, total
        ))
        .into());
    }
    let sql = format!(
        "UPDATE {} SET paid_date=?1, paid_amount=?2, discount=?3, penalty=?4, interest=?5, status=?6
         WHERE id=?7",
        side.table()
    );
    tx.execute(
        &sql,
        params![
            input.date.to_string(),
            paid.to_string(),
            input.discount.to_string(),
            input.penalty.to_string(),
            input.interest.to_string(),
            ObligationStatus::Paid.as_str(),
            id
        ],
    )?;

    let account_id = match input.account_id {
        Some(a) => Some(a),
        None => default_account(&tx)?,
    };
    let entry_id = match account_id {
        Some(account_id) => {
            let party = store::load_party(&tx, ob.party_id)?;
            let entry = NewEntry {
                date: input.date,
                kind: side.entry_kind(),
                account_id,
                dest_account_id: None,
                amount: total,
                category: Some(side.entity().to_string()),
                memo: Some(format!("{} - {}", ob.title, party.legal_name)),
                document: Some(side.document(id)),
            };
            Some(cashbook::post_entry(&tx, &entry)?)
        }
        None => None,
    };
    tx.commit()?;
    tracing::info!(id, side = side.entity(), paid = %paid, entry_id, "payment recorded");
    Ok(PaymentOutcome {
        paid_amount: paid,
        entry_id,
    })
}

fn pay(conn: &mut Connection, side: Side, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = today_arg(sub)?;
    let input = PaymentInput {
        date: opt_date(sub, "date")?.unwrap_or(today),
        amount: opt_decimal(sub, "amount")?,
        discount: opt_decimal(sub, "discount")?.unwrap_or(Decimal::ZERO),
        penalty: opt_decimal(sub, "penalty")?.unwrap_or(Decimal::ZERO),
        interest: opt_decimal(sub, "interest")?.unwrap_or(Decimal::ZERO),
        account_id: opt_arg(sub, "account")
            .map(|a| id_for_account(conn, &a))
            .transpose()?,
    };
    let outcome = record_payment(conn, side, id, today, &input)?;
    match outcome.entry_id {
        Some(entry) => println!(
            "Paid {} {}: {} (ledger entry {})",
            side.entity(),
            id,
            fmt_money(&outcome.paid_amount),
            entry
        ),
        None => println!(
            "Paid {} {}: {} (no ledger account)",
            side.entity(),
            id,
            fmt_money(&outcome.paid_amount)
        ),
    }
    Ok(())
}

/// Undoes a payment. The ledger entry carrying the obligation's document is
/// deleted with its balance effect, and the record goes back to `open`.
pub fn reverse_payment(conn: &mut Connection, side: Side, id: i64) -> Result<Option<i64>> {
    let tx = conn.transaction()?;
    let ob = store::load_obligation(&tx, side, id)?;
    if ob.paid_amount.is_none() {
        return Err(LedgerError::invalid_state(side.entity(), id, ob.stored_status, "paid").into());
    }
    let removed = match store::find_entry_by_document(&tx, &side.document(id))? {
        Some(entry) => {
            cashbook::delete_entry(&tx, entry.id)?;
            Some(entry.id)
        }
        None => None,
    };
    let sql = format!(
        "UPDATE {} SET paid_date=NULL, paid_amount=NULL, discount='0', penalty='0', interest='0',
                       status=?1
         WHERE id=?2",
        side.table()
    );
    tx.execute(&sql, params![ObligationStatus::Open.as_str(), id])?;
    tx.commit()?;
    tracing::info!(id, side = side.entity(), entry = removed, "payment reversed");
    Ok(removed)
}

pub fn cancel_obligation(conn: &Connection, side: Side, id: i64, today: NaiveDate) -> Result<()> {
    let ob = store::load_obligation(conn, side, id)?;
    let current = resolve_status(&ob, today);
    if !is_payable(current) {
        return Err(LedgerError::invalid_state(side.entity(), id, current, "open or overdue").into());
    }
    let sql = format!("UPDATE {} SET status=?1 WHERE id=?2", side.table());
    conn.execute(&sql, params![ObligationStatus::Cancelled.as_str(), id])?;
    tracing::info!(id, side = side.entity(), "obligation cancelled");
    Ok(())
}

/// Creates `count` follow-up copies of a payable, each with a renumbered
/// title and the next due date of `cadence`.
pub fn replicate_payable(
    conn: &mut Connection,
    id: i64,
    count: u32,
    cadence: Cadence,
) -> Result<Vec<i64>> {
    if count == 0 {
        return Err(LedgerError::validation("--count must be at least 1").into());
    }
    let tx = conn.transaction()?;
    let base = store::load_obligation(&tx, Side::Payable, id)?;
    let mut ids = Vec::with_capacity(count as usize);
    for offset in 1..=count {
        let copy = NewObligation {
            contract_id: base.contract_id,
            party_id: base.party_id,
            title: schedule::renumber_title(&base.title, offset),
            due_date: schedule::replicated_due_date(base.due_date, cadence, offset)?,
            expected_amount: base.expected_amount,
            cost_center: base.cost_center.clone(),
            note: base.note.clone(),
        };
        ids.push(store::insert_obligation(&tx, Side::Payable, &copy)?);
    }
    tx.commit()?;
    tracing::info!(id, copies = ids.len(), "payable replicated");
    Ok(ids)
}
