// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cnab;
use crate::error::LedgerError;
use crate::models::{AccountKind, EntryKind, LedgerEntry, ReconciliationStatus};
use crate::store;
use crate::utils::{
    dec_at, fmt_money, id_for_account, maybe_print_json, opt_arg, opt_date, opt_decimal,
    parse_date, parse_decimal, parse_enum_at, pretty_table, req_arg,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add-account", sub)) => add_account(conn, sub)?,
        Some(("accounts", sub)) => list_accounts(conn, sub)?,
        Some(("entry", sub)) => add_entry(conn, sub)?,
        Some(("edit", sub)) => edit_entry(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let tx = conn.transaction()?;
            delete_entry(&tx, id)?;
            tx.commit()?;
            println!("Deleted entry {}", id);
        }
        Some(("entries", sub)) => list_entries(conn, sub)?,
        Some(("positions", sub)) => print_positions(conn, sub)?,
        Some(("import", sub)) => import(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub name: String,
    pub kind: Option<AccountKind>,
    pub bank_code: Option<String>,
    pub agency: Option<String>,
    pub number: Option<String>,
    pub agreement: Option<String>,
    pub opening_balance: Decimal,
}

pub fn create_account(conn: &Connection, acct: &NewAccount) -> Result<i64> {
    let kind = acct
        .kind
        .ok_or_else(|| LedgerError::validation("account kind is required"))?;
    if kind == AccountKind::Cash && acct.bank_code.is_some() {
        return Err(LedgerError::validation("cash accounts have no bank code").into());
    }
    conn.execute(
        "INSERT INTO ledger_accounts(kind, name, bank_code, agency, number, agreement, opening_balance, current_balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            kind.as_str(),
            acct.name,
            acct.bank_code,
            acct.agency,
            acct.number,
            acct.agreement,
            acct.opening_balance.to_string()
        ],
    )
    .with_context(|| format!("Open account '{}'", acct.name))?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, name = %acct.name, %kind, "ledger account opened");
    Ok(id)
}

fn add_account(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let acct = NewAccount {
        name: req_arg(sub, "name")?,
        kind: Some(req_arg(sub, "kind")?.parse()?),
        bank_code: opt_arg(sub, "bank_code"),
        agency: opt_arg(sub, "agency"),
        number: opt_arg(sub, "number"),
        agreement: opt_arg(sub, "agreement"),
        opening_balance: opt_decimal(sub, "opening")?.unwrap_or(Decimal::ZERO),
    };
    create_account(conn, &acct)?;
    println!(
        "Opened account '{}' with balance {}",
        acct.name,
        fmt_money(&acct.opening_balance)
    );
    Ok(())
}

fn list_accounts(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let accounts = store::list_accounts(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
        let rows = accounts
            .iter()
            .map(|a| {
                vec![
                    a.name.clone(),
                    a.kind.to_string(),
                    a.bank_code.clone().unwrap_or_default(),
                    a.agency.clone().unwrap_or_default(),
                    a.number.clone().unwrap_or_default(),
                    fmt_money(&a.opening_balance),
                    fmt_money(&a.current_balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Kind", "Bank", "Agency", "Number", "Opening", "Balance"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub account_id: i64,
    pub dest_account_id: Option<i64>,
    pub amount: Decimal,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub document: Option<String>,
}

/// Per-account balance deltas of an entry.
pub fn balance_effects(
    kind: EntryKind,
    account_id: i64,
    dest_account_id: Option<i64>,
    amount: Decimal,
) -> Vec<(i64, Decimal)> {
    match kind {
        EntryKind::Inflow => vec![(account_id, amount)],
        EntryKind::Outflow => vec![(account_id, -amount)],
        EntryKind::Transfer => {
            let mut v = vec![(account_id, -amount)];
            if let Some(dest) = dest_account_id {
                v.push((dest, amount));
            }
            v
        }
    }
}

fn shift_balance(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let current: Option<String> = conn
        .query_row(
            "SELECT current_balance FROM ledger_accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    let current = current.ok_or_else(|| LedgerError::not_found("account", account_id))?;
    let current = current
        .parse::<Decimal>()
        .with_context(|| format!("Invalid balance '{}' on account {}", current, account_id))?;
    conn.execute(
        "UPDATE ledger_accounts SET current_balance=?1 WHERE id=?2",
        params![(current + delta).to_string(), account_id],
    )?;
    Ok(())
}

fn apply_effects(conn: &Connection, effects: &[(i64, Decimal)], sign: Decimal) -> Result<()> {
    for (account_id, delta) in effects {
        shift_balance(conn, *account_id, *delta * sign)?;
    }
    Ok(())
}

fn validate_entry(kind: EntryKind, account_id: i64, dest: Option<i64>, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!("entry amount {} must be positive", amount)).into());
    }
    match (kind, dest) {
        (EntryKind::Transfer, None) => {
            Err(LedgerError::validation("transfers need a destination account").into())
        }
        (EntryKind::Transfer, Some(d)) if d == account_id => {
            Err(LedgerError::validation("cannot transfer to the same account").into())
        }
        (EntryKind::Inflow | EntryKind::Outflow, Some(_)) => {
            Err(LedgerError::validation("only transfers have a destination account").into())
        }
        _ => Ok(()),
    }
}

/// Inserts an entry and moves the balances it touches. Callers wanting
/// atomicity pass a transaction.
pub fn post_entry(conn: &Connection, e: &NewEntry) -> Result<i64> {
    validate_entry(e.kind, e.account_id, e.dest_account_id, e.amount)?;
    conn.execute(
        "INSERT INTO ledger_entries(date, kind, account_id, dest_account_id, amount, category, memo, document)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            e.date.to_string(),
            e.kind.as_str(),
            e.account_id,
            e.dest_account_id,
            e.amount.to_string(),
            e.category,
            e.memo,
            e.document
        ],
    )?;
    let id = conn.last_insert_rowid();
    apply_effects(
        conn,
        &balance_effects(e.kind, e.account_id, e.dest_account_id, e.amount),
        Decimal::ONE,
    )?;
    tracing::info!(id, kind = %e.kind, amount = %e.amount, account_id = e.account_id, "ledger entry posted");
    Ok(id)
}

/// Deletes an entry and reverts its balance effect.
pub fn delete_entry(conn: &Connection, id: i64) -> Result<LedgerEntry> {
    let entry = store::load_entry(conn, id)?;
    apply_effects(
        conn,
        &balance_effects(entry.kind, entry.account_id, entry.dest_account_id, entry.amount),
        Decimal::NEGATIVE_ONE,
    )?;
    conn.execute("DELETE FROM ledger_entries WHERE id=?1", params![id])?;
    tracing::info!(id, amount = %entry.amount, "ledger entry deleted");
    Ok(entry)
}

#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub memo: Option<String>,
}

/// Rewrites an entry: the old balance effect is reverted before the new one
/// is applied.
pub fn update_entry(conn: &Connection, id: i64, changes: &EntryChanges) -> Result<LedgerEntry> {
    let old = store::load_entry(conn, id)?;
    let amount = changes.amount.unwrap_or(old.amount);
    validate_entry(old.kind, old.account_id, old.dest_account_id, amount)?;
    apply_effects(
        conn,
        &balance_effects(old.kind, old.account_id, old.dest_account_id, old.amount),
        Decimal::NEGATIVE_ONE,
    )?;
    let updated = LedgerEntry {
        date: changes.date.unwrap_or(old.date),
        amount,
        category: changes.category.clone().or(old.category.clone()),
        memo: changes.memo.clone().or(old.memo.clone()),
        ..old
    };
    conn.execute(
        "UPDATE ledger_entries SET date=?1, amount=?2, category=?3, memo=?4 WHERE id=?5",
        params![
            updated.date.to_string(),
            updated.amount.to_string(),
            updated.category,
            updated.memo,
            id
        ],
    )?;
    apply_effects(
        conn,
        &balance_effects(updated.kind, updated.account_id, updated.dest_account_id, updated.amount),
        Decimal::ONE,
    )?;
    tracing::info!(id, amount = %updated.amount, "ledger entry updated");
    Ok(updated)
}

fn add_entry(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let entry = NewEntry {
        date: parse_date(&req_arg(sub, "date")?)?,
        kind: req_arg(sub, "kind")?.parse()?,
        account_id: id_for_account(conn, &req_arg(sub, "account")?)?,
        dest_account_id: opt_arg(sub, "to")
            .map(|n| id_for_account(conn, &n))
            .transpose()?,
        amount: parse_decimal(&req_arg(sub, "amount")?)?,
        category: opt_arg(sub, "category"),
        memo: opt_arg(sub, "memo"),
        document: opt_arg(sub, "document"),
    };
    let tx = conn.transaction()?;
    let id = post_entry(&tx, &entry)?;
    tx.commit()?;
    println!(
        "Posted {} {} on {} (entry {})",
        entry.kind,
        fmt_money(&entry.amount),
        entry.date,
        id
    );
    Ok(())
}

fn edit_entry(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let changes = EntryChanges {
        date: opt_date(sub, "date")?,
        amount: opt_decimal(sub, "amount")?,
        category: opt_arg(sub, "category"),
        memo: opt_arg(sub, "memo"),
    };
    let tx = conn.transaction()?;
    let updated = update_entry(&tx, id, &changes)?;
    tx.commit()?;
    println!(
        "Entry {} now {} {} on {}",
        id,
        updated.kind,
        fmt_money(&updated.amount),
        updated.date
    );
    Ok(())
}

fn list_entries(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account = opt_arg(sub, "account")
        .map(|n| id_for_account(conn, &n))
        .transpose()?;
    let entries = store::list_entries(conn, account)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &entries)? {
        let names: BTreeMap<i64, String> = store::list_accounts(conn)?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let name = |id: i64| names.get(&id).cloned().unwrap_or_else(|| id.to_string());
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    e.kind.to_string(),
                    name(e.account_id),
                    e.dest_account_id.map(name).unwrap_or_default(),
                    fmt_money(&e.amount),
                    e.category.clone().unwrap_or_default(),
                    e.memo.clone().unwrap_or_default(),
                    e.document.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Account", "To", "Amount", "Category", "Memo", "Document"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub date: NaiveDate,
    pub balance: Decimal,
}

/// Closing balance of `account_id` for every day in `from..=to`, rebuilt
/// from the opening balance and the entries rather than the cached balance.
pub fn positions(
    conn: &Connection,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Position>> {
    if to < from {
        return Err(LedgerError::validation(format!("{} is before {}", to, from)).into());
    }
    let account = store::load_account(conn, account_id)?;
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut balance = account.opening_balance;
    for e in store::list_entries(conn, Some(account_id))? {
        let delta: Decimal = balance_effects(e.kind, e.account_id, e.dest_account_id, e.amount)
            .into_iter()
            .filter(|(id, _)| *id == account_id)
            .map(|(_, d)| d)
            .sum();
        if e.date < from {
            balance += delta;
        } else {
            *daily.entry(e.date).or_insert(Decimal::ZERO) += delta;
        }
    }
    let out = from
        .iter_days()
        .take_while(|day| *day <= to)
        .map(|day| {
            if let Some(d) = daily.get(&day) {
                balance += *d;
            }
            Position { date: day, balance }
        })
        .collect();
    Ok(out)
}

/// Balance implied by opening balance plus every entry, for doctor checks.
pub fn recomputed_balance(conn: &Connection, account_id: i64) -> Result<Decimal> {
    let account = store::load_account(conn, account_id)?;
    let mut balance = account.opening_balance;
    let mut stmt = conn.prepare(
        "SELECT kind, account_id, dest_account_id, amount FROM ledger_entries
         WHERE account_id=?1 OR dest_account_id=?1",
    )?;
    let rows = stmt.query_map(params![account_id], |r| {
        Ok((
            parse_enum_at::<EntryKind>(r, 0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, Option<i64>>(2)?,
            dec_at(r, 3)?,
        ))
    })?;
    for row in rows {
        let (kind, src, dest, amount) = row?;
        balance += balance_effects(kind, src, dest, amount)
            .into_iter()
            .filter(|(id, _)| *id == account_id)
            .map(|(_, d)| d)
            .sum::<Decimal>();
    }
    Ok(balance)
}

fn print_positions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, &req_arg(sub, "account")?)?;
    let from = parse_date(&req_arg(sub, "from")?)?;
    let to = match opt_date(sub, "to")? {
        Some(d) => d,
        None => {
            let last: Option<NaiveDate> = conn.query_row(
                "SELECT MAX(date) FROM ledger_entries WHERE account_id=?1 OR dest_account_id=?1",
                params![account_id],
                |r| r.get(0),
            )?;
            last.filter(|d| *d > from).unwrap_or(from)
        }
    };
    let data = positions(conn, account_id, from, to)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|p| vec![p.date.to_string(), fmt_money(&p.balance)])
            .collect();
        println!("{}", pretty_table(&["Date", "Balance"], rows));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementImport {
    pub matched: usize,
    pub created: usize,
}

/// Reconciles a CNAB240 statement against `account_id`. A statement line
/// matching an unreconciled entry of the account with the same date and
/// amount is reconciled; anything else becomes a new `CNAB` inflow.
pub fn import_statement(
    conn: &mut Connection,
    account_id: i64,
    content: &str,
    source: &str,
) -> Result<StatementImport> {
    store::load_account(conn, account_id)?;
    let lines = cnab::parse_statement(content);
    let tx = conn.transaction()?;
    let mut summary = StatementImport::default();
    for line in &lines {
        let existing: Option<i64> = tx
            .query_row(
                "SELECT e.id FROM ledger_entries e
                 WHERE e.account_id=?1 AND e.date=?2 AND CAST(e.amount AS REAL)=CAST(?3 AS REAL)
                   AND NOT EXISTS (SELECT 1 FROM reconciliations r
                                   WHERE r.entry_id=e.id AND r.status=?4)
                 ORDER BY e.id LIMIT 1",
                params![
                    account_id,
                    line.date.to_string(),
                    line.amount.to_string(),
                    ReconciliationStatus::Reconciled.as_str()
                ],
                |r| r.get(0),
            )
            .optional()?;
        let entry_id = match existing {
            Some(id) => {
                summary.matched += 1;
                id
            }
            None => {
                summary.created += 1;
                post_entry(
                    &tx,
                    &NewEntry {
                        date: line.date,
                        kind: EntryKind::Inflow,
                        account_id,
                        dest_account_id: None,
                        amount: line.amount,
                        category: Some("CNAB".into()),
                        memo: Some(line.memo.clone()).filter(|m| !m.is_empty()),
                        document: None,
                    },
                )?
            }
        };
        tx.execute(
            "INSERT INTO reconciliations(entry_id, source_file, status, reconciled_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![entry_id, source, ReconciliationStatus::Reconciled.as_str()],
        )?;
    }
    tx.commit()?;
    tracing::info!(
        account_id,
        source,
        matched = summary.matched,
        created = summary.created,
        "statement imported"
    );
    Ok(summary)
}

fn import(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, &req_arg(sub, "account")?)?;
    let path = req_arg(sub, "path")?;
    let bytes = std::fs::read(&path).with_context(|| format!("Read statement {}", path))?;
    let content = String::from_utf8_lossy(&bytes);
    let summary = import_statement(conn, account_id, &content, &path)?;
    println!(
        "Imported {}: {} matched, {} created",
        path, summary.matched, summary.created
    );
    Ok(())
}
