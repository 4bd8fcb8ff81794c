// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cnab::{self, Title};
use crate::commands::obligations::{PaymentInput, record_payment};
use crate::error::LedgerError;
use crate::models::{AccountKind, Side};
use crate::status::{is_payable, resolve_status};
use crate::store;
use crate::utils::{fmt_money, id_for_account, opt_arg, opt_date, pretty_table, req_arg};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::path::Path;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("remit", sub)) => {
            let ids: Vec<i64> = sub
                .get_many::<i64>("ids")
                .map(|v| v.copied().collect())
                .unwrap_or_default();
            let account_id = id_for_account(conn, &req_arg(sub, "account")?)?;
            let out = req_arg(sub, "out")?;
            let today = chrono::Local::now().date_naive();
            let titles = write_remittance_file(conn, &ids, account_id, today, Path::new(&out))?;
            println!("Wrote {} title(s) to {}", titles.len(), out);
        }
        Some(("return", sub)) => {
            let path = req_arg(sub, "path")?;
            let date = opt_date(sub, "date")?.unwrap_or_else(|| chrono::Local::now().date_naive());
            let account_id = opt_arg(sub, "account")
                .map(|a| id_for_account(conn, &a))
                .transpose()?;
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Read return file {}", path))?;
            let summary = settle_return(conn, &content, date, account_id)?;
            println!(
                "Settled {} receivable(s) totalling {}",
                summary.settled.len(),
                fmt_money(&summary.settled_total())
            );
            if !summary.errors.is_empty() {
                let rows = summary
                    .errors
                    .iter()
                    .map(|(n, e)| vec![n.clone(), e.clone()])
                    .collect();
                println!("{}", pretty_table(&["Our number", "Error"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Zero-padded id used as "our number" for receivables billed for the
/// first time.
pub fn our_number_for(id: i64) -> String {
    format!("{:010}", id)
}

/// Assigns our numbers where missing and renders the remittance for the
/// given receivables. Only payable receivables can be billed.
pub fn build_remittance(
    conn: &mut Connection,
    ids: &[i64],
    account_id: i64,
    today: NaiveDate,
) -> Result<(String, Vec<Title>)> {
    if ids.is_empty() {
        return Err(LedgerError::validation("no receivables selected").into());
    }
    let account = store::load_account(conn, account_id)?;
    let bank_code = match (account.kind, account.bank_code) {
        (AccountKind::Bank, Some(code)) => code,
        _ => {
            return Err(LedgerError::validation(format!(
                "account '{}' is not a bank account with a bank code",
                account.name
            ))
            .into());
        }
    };
    let tx = conn.transaction()?;
    let mut titles = Vec::with_capacity(ids.len());
    for &id in ids {
        let ob = store::load_obligation(&tx, Side::Receivable, id)?;
        let status = resolve_status(&ob, today);
        if !is_payable(status) {
            return Err(LedgerError::invalid_state("receivable", id, status, "open or overdue").into());
        }
        let our_number = match ob.our_number {
            Some(n) => n,
            None => {
                let n = our_number_for(id);
                tx.execute(
                    "UPDATE receivables SET our_number=?1 WHERE id=?2",
                    params![n, id],
                )?;
                n
            }
        };
        titles.push(Title {
            our_number,
            amount: ob.expected_amount,
        });
    }
    let content = cnab::write_remittance(&bank_code, &titles)?;
    tx.commit()?;
    tracing::info!(account = %account.name, titles = titles.len(), "remittance built");
    Ok((content, titles))
}

pub fn write_remittance_file(
    conn: &mut Connection,
    ids: &[i64],
    account_id: i64,
    today: NaiveDate,
    out: &Path,
) -> Result<Vec<Title>> {
    let (content, titles) = build_remittance(conn, ids, account_id, today)?;
    std::fs::write(out, content).with_context(|| format!("Write {}", out.display()))?;
    Ok(titles)
}

#[derive(Debug, Clone, Default)]
pub struct ReturnSummary {
    /// `(receivable id, amount)` of every settled title.
    pub settled: Vec<(i64, rust_decimal::Decimal)>,
    /// `(our number, message)` of titles that could not be settled.
    pub errors: Vec<(String, String)>,
}

impl ReturnSummary {
    pub fn settled_total(&self) -> rust_decimal::Decimal {
        self.settled.iter().map(|(_, a)| *a).sum()
    }
}

/// Settles receivables from a return file. Each title is paid on its own;
/// a failing title is reported and the rest still go through.
pub fn settle_return(
    conn: &mut Connection,
    content: &str,
    date: NaiveDate,
    account_id: Option<i64>,
) -> Result<ReturnSummary> {
    let titles = cnab::read_return(content)?;
    let mut summary = ReturnSummary::default();
    for title in titles {
        let ob = match store::find_receivable_by_our_number(conn, &title.our_number)? {
            Some(ob) => ob,
            None => {
                summary.errors.push((
                    title.our_number.clone(),
                    LedgerError::not_found("receivable", &title.our_number).to_string(),
                ));
                continue;
            }
        };
        let input = PaymentInput {
            amount: Some(title.amount),
            account_id,
            ..PaymentInput::on(date)
        };
        match record_payment(conn, Side::Receivable, ob.id, date, &input) {
            Ok(outcome) => summary.settled.push((ob.id, outcome.paid_amount)),
            Err(e) => {
                tracing::warn!(our_number = %title.our_number, error = %e, "return title skipped");
                summary.errors.push((title.our_number.clone(), e.to_string()));
            }
        }
    }
    tracing::info!(
        settled = summary.settled.len(),
        errors = summary.errors.len(),
        "return processed"
    );
    Ok(summary)
}
