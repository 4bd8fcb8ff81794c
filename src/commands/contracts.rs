// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::{ContractPurpose, ContractStatus, ObligationStatus, Side, TenantSnapshot};
use crate::schedule::{self, Cadence};
use crate::status::resolve_status;
use crate::store::{self, NewObligation};
use crate::utils::{
    fmt_money, id_for_party, maybe_print_json, opt_arg, opt_decimal, parse_date, pretty_table,
    req_arg, today_arg,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("activate", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            activate_contract(conn, id)?;
            println!("Contract {} is now active", id);
        }
        Some(("close", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let cancelled = close_contract(conn, id, today_arg(sub)?)?;
            println!("Closed contract {}; {} receivable(s) cancelled", id, cancelled);
        }
        _ => {}
    }
    Ok(())
}

/// Terms of a new contract before the tenant snapshot is taken.
#[derive(Debug, Clone)]
pub struct NewContract {
    pub property_id: i64,
    pub client_id: i64,
    pub purpose: ContractPurpose,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub installment_count: u32,
    pub installment_value: Decimal,
    pub cadence: Option<Cadence>,
    pub deposit_count: u32,
    pub deposit_value: Option<Decimal>,
    pub status: ContractStatus,
    pub note: Option<String>,
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let purpose: ContractPurpose = req_arg(sub, "purpose")?.parse()?;
    let cadence = if purpose == ContractPurpose::FreeLoan {
        None
    } else {
        Some(Cadence::from_options(
            sub.get_one::<u32>("due_day").copied(),
            sub.get_one::<u32>("interval_days").copied(),
        )?)
    };
    let input = NewContract {
        property_id: *sub.get_one::<i64>("property").unwrap(),
        client_id: id_for_party(conn, &req_arg(sub, "client")?)?,
        purpose,
        start_date: parse_date(&req_arg(sub, "start")?)?,
        end_date: parse_date(&req_arg(sub, "end")?)?,
        installment_count: sub.get_one::<u32>("count").copied().unwrap_or(0),
        installment_value: opt_decimal(sub, "value")?.unwrap_or(Decimal::ZERO),
        cadence,
        deposit_count: sub.get_one::<u32>("deposit_count").copied().unwrap_or(0),
        deposit_value: opt_decimal(sub, "deposit_value")?,
        status: req_arg(sub, "status")?.parse()?,
        note: opt_arg(sub, "note"),
    };
    let id = create_contract(conn, &input)?;
    let generated: i64 = conn.query_row(
        "SELECT COUNT(*) FROM receivables WHERE contract_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    println!(
        "Added contract {} ({} receivable(s) generated)",
        id, generated
    );
    Ok(())
}

/// Writes the contract with the client's tenant fields and, unless it is a
/// free loan, its rent and deposit receivables. Everything happens in one
/// transaction.
pub fn create_contract(conn: &mut Connection, input: &NewContract) -> Result<i64> {
    if input.end_date < input.start_date {
        return Err(LedgerError::validation(format!(
            "end date {} is before start date {}",
            input.end_date, input.start_date
        ))
        .into());
    }
    if input.status == ContractStatus::Closed {
        return Err(LedgerError::validation("a new contract cannot start closed").into());
    }
    let free_loan = input.purpose == ContractPurpose::FreeLoan;
    let (count, value, deposit_count, deposit_value) = if free_loan {
        (0, Decimal::ZERO, 0, None)
    } else {
        (
            input.installment_count,
            input.installment_value,
            input.deposit_count,
            input.deposit_value,
        )
    };
    if value.is_sign_negative() || deposit_value.is_some_and(|v| v.is_sign_negative()) {
        return Err(LedgerError::validation("installment values cannot be negative").into());
    }
    let cadence = match (free_loan, input.cadence) {
        (true, _) => None,
        (false, Some(c)) => Some(c),
        (false, None) => {
            return Err(LedgerError::validation(
                "give exactly one of --due-day or --interval-days",
            )
            .into());
        }
    };

    let tx = conn.transaction()?;
    store::load_property(&tx, input.property_id)?;
    let client = store::load_party(&tx, input.client_id)?;
    if !client.role.is_client() {
        return Err(LedgerError::validation(format!(
            "party {} is a {}, not a client",
            client.id, client.role
        ))
        .into());
    }
    check_capacity(&tx, input.property_id, input.status)?;

    let tenant = TenantSnapshot::from(&client);
    tx.execute(
        "INSERT INTO contracts(property_id, client_id, tenant_name, tenant_address, tenant_district,
                               tenant_city, tenant_state, tenant_zip, tenant_phone, purpose,
                               start_date, end_date, installment_count, installment_value,
                               deposit_count, deposit_value, status, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            input.property_id,
            client.id,
            tenant.name,
            tenant.address,
            tenant.district,
            tenant.city,
            tenant.state,
            tenant.zip,
            tenant.phone,
            input.purpose.as_str(),
            input.start_date.to_string(),
            input.end_date.to_string(),
            count,
            value.to_string(),
            deposit_count,
            deposit_value.map(|v| v.to_string()),
            input.status.as_str(),
            input.note
        ],
    )?;
    let id = tx.last_insert_rowid();

    if let Some(cadence) = cadence {
        let mut plan = schedule::rent_installments(id, input.start_date, cadence, count, value)?;
        if let Some(dv) = deposit_value {
            plan.extend(schedule::deposit_installments(
                id,
                input.start_date,
                deposit_count,
                dv,
            )?);
        }
        for inst in &plan {
            store::insert_obligation(
                &tx,
                Side::Receivable,
                &NewObligation {
                    contract_id: Some(id),
                    party_id: client.id,
                    title: inst.title.clone(),
                    due_date: inst.due_date,
                    expected_amount: inst.amount,
                    cost_center: None,
                    note: None,
                },
            )?;
        }
        tracing::debug!(contract_id = id, installments = plan.len(), "schedule generated");
    }
    tx.commit()
        .with_context(|| format!("Commit contract for property {}", input.property_id))?;
    tracing::info!(contract_id = id, client = %tenant.name, "contract written");
    Ok(id)
}

fn check_capacity(conn: &Connection, property_id: i64, status: ContractStatus) -> Result<()> {
    if status != ContractStatus::Active {
        return Ok(());
    }
    let property = store::load_property(conn, property_id)?;
    if let Some(max) = property.max_contracts {
        let active: i64 = conn.query_row(
            "SELECT COUNT(*) FROM contracts WHERE property_id=?1 AND status='active'",
            params![property_id],
            |r| r.get(0),
        )?;
        if active >= max {
            return Err(LedgerError::validation(format!(
                "property {} already has {} active contract(s) (max {})",
                property_id, active, max
            ))
            .into());
        }
    }
    Ok(())
}

pub fn activate_contract(conn: &Connection, id: i64) -> Result<()> {
    let contract = store::load_contract(conn, id)?;
    if contract.status != ContractStatus::Pending {
        return Err(LedgerError::invalid_state(
            "contract",
            id,
            contract.status,
            ContractStatus::Pending,
        )
        .into());
    }
    check_capacity(conn, contract.property_id, ContractStatus::Active)?;
    conn.execute(
        "UPDATE contracts SET status='active' WHERE id=?1",
        params![id],
    )?;
    tracing::info!(contract_id = id, "contract activated");
    Ok(())
}

/// Closes a contract. Receivables still open at `today` (unpaid, not
/// cancelled, not yet overdue) are cancelled; overdue ones stay collectable.
pub fn close_contract(conn: &mut Connection, id: i64, today: NaiveDate) -> Result<usize> {
    let tx = conn.transaction()?;
    let contract = store::load_contract(&tx, id)?;
    if contract.status == ContractStatus::Closed {
        return Err(LedgerError::invalid_state("contract", id, contract.status, "active or pending").into());
    }
    tx.execute("UPDATE contracts SET status='closed' WHERE id=?1", params![id])?;
    let mut cancelled = 0;
    for ob in store::list_obligations(&tx, Side::Receivable, Some(id))? {
        if resolve_status(&ob, today) == ObligationStatus::Open {
            tx.execute(
                "UPDATE receivables SET status='cancelled' WHERE id=?1",
                params![ob.id],
            )?;
            cancelled += 1;
        }
    }
    tx.commit()?;
    tracing::info!(contract_id = id, cancelled, "contract closed");
    Ok(cancelled)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let status = opt_arg(sub, "status")
        .map(|s| s.parse::<ContractStatus>())
        .transpose()?;
    let contracts: Vec<_> = store::list_contracts(conn)?
        .into_iter()
        .filter(|c| status.is_none_or(|s| c.status == s))
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &contracts)? {
        let rows = contracts
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.property_id.to_string(),
                    c.tenant.name.clone(),
                    c.purpose.to_string(),
                    c.start_date.to_string(),
                    c.end_date.to_string(),
                    c.installment_count.to_string(),
                    fmt_money(&c.installment_value),
                    c.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Property", "Tenant", "Purpose", "Start", "End", "Inst.", "Value", "Status"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let today = today_arg(sub)?;
    let c = store::load_contract(conn, id)?;
    println!(
        "Contract {} | property {} | {} ({}) | {} to {} | {} x {} | {}",
        c.id,
        c.property_id,
        c.tenant.name,
        c.purpose,
        c.start_date,
        c.end_date,
        c.installment_count,
        fmt_money(&c.installment_value),
        c.status
    );
    let adj_rows: Vec<Vec<String>> = store::list_adjustments(conn, Some(id))?
        .into_iter()
        .map(|a| {
            vec![
                a.change_date.to_string(),
                format!("{}%", a.percentage),
                fmt_money(&a.resulting_installment_value),
            ]
        })
        .collect();
    if !adj_rows.is_empty() {
        println!("{}", pretty_table(&["Date", "Percent", "New value"], adj_rows));
    }
    let rec_rows = store::list_obligations(conn, Side::Receivable, Some(id))?
        .into_iter()
        .map(|o| {
            vec![
                o.id.to_string(),
                o.title.clone(),
                o.due_date.to_string(),
                fmt_money(&o.expected_amount),
                o.paid_amount.map(|v| fmt_money(&v)).unwrap_or_default(),
                resolve_status(&o, today).to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Title", "Due", "Expected", "Paid", "Status"], rec_rows)
    );
    Ok(())
}
