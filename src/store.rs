// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row loaders shared by the command handlers.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::models::{
    Adjustment, Contract, LedgerAccount, LedgerEntry, Obligation, Party, Property, Side,
    TenantSnapshot,
};
use crate::utils::{dec_at, opt_dec_at, parse_enum_at};

const PARTY_COLS: &str = "id, document, legal_name, trade_name, address, district, city, state, zip, phone, note, role, status";

fn party_from_row(r: &Row<'_>) -> rusqlite::Result<Party> {
    Ok(Party {
        id: r.get(0)?,
        document: r.get(1)?,
        legal_name: r.get(2)?,
        trade_name: r.get(3)?,
        address: r.get(4)?,
        district: r.get(5)?,
        city: r.get(6)?,
        state: r.get(7)?,
        zip: r.get(8)?,
        phone: r.get(9)?,
        note: r.get(10)?,
        role: parse_enum_at(r, 11)?,
        status: parse_enum_at(r, 12)?,
    })
}

pub fn load_party(conn: &Connection, id: i64) -> Result<Party> {
    let sql = format!("SELECT {} FROM parties WHERE id=?1", PARTY_COLS);
    conn.query_row(&sql, params![id], party_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("party", id).into())
}

pub fn list_parties(conn: &Connection) -> Result<Vec<Party>> {
    let sql = format!("SELECT {} FROM parties ORDER BY legal_name", PARTY_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], party_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

const PROPERTY_COLS: &str = "id, kind, address, registry, enrollment, tax_id, latitude, longitude, acquired_on, market_value, rent_value, max_contracts, note";

fn property_from_row(r: &Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: r.get(0)?,
        kind: r.get(1)?,
        address: r.get(2)?,
        registry: r.get(3)?,
        enrollment: r.get(4)?,
        tax_id: r.get(5)?,
        latitude: r.get(6)?,
        longitude: r.get(7)?,
        acquired_on: r.get::<_, Option<NaiveDate>>(8)?,
        market_value: opt_dec_at(r, 9)?,
        rent_value: opt_dec_at(r, 10)?,
        max_contracts: r.get(11)?,
        note: r.get(12)?,
    })
}

pub fn load_property(conn: &Connection, id: i64) -> Result<Property> {
    let sql = format!("SELECT {} FROM properties WHERE id=?1", PROPERTY_COLS);
    conn.query_row(&sql, params![id], property_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("property", id).into())
}

pub fn list_properties(conn: &Connection) -> Result<Vec<Property>> {
    let sql = format!("SELECT {} FROM properties ORDER BY address", PROPERTY_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], property_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

const CONTRACT_COLS: &str = "id, property_id, client_id, tenant_name, tenant_address, tenant_district, tenant_city, tenant_state, tenant_zip, tenant_phone, purpose, start_date, end_date, installment_count, installment_value, deposit_count, deposit_value, status, note";

fn contract_from_row(r: &Row<'_>) -> rusqlite::Result<Contract> {
    Ok(Contract {
        id: r.get(0)?,
        property_id: r.get(1)?,
        client_id: r.get(2)?,
        tenant: TenantSnapshot {
            name: r.get(3)?,
            address: r.get(4)?,
            district: r.get(5)?,
            city: r.get(6)?,
            state: r.get(7)?,
            zip: r.get(8)?,
            phone: r.get(9)?,
        },
        purpose: parse_enum_at(r, 10)?,
        start_date: r.get(11)?,
        end_date: r.get(12)?,
        installment_count: r.get(13)?,
        installment_value: dec_at(r, 14)?,
        deposit_count: r.get(15)?,
        deposit_value: opt_dec_at(r, 16)?,
        status: parse_enum_at(r, 17)?,
        note: r.get(18)?,
    })
}

pub fn load_contract(conn: &Connection, id: i64) -> Result<Contract> {
    let sql = format!("SELECT {} FROM contracts WHERE id=?1", CONTRACT_COLS);
    conn.query_row(&sql, params![id], contract_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("contract", id).into())
}

pub fn list_contracts(conn: &Connection) -> Result<Vec<Contract>> {
    let sql = format!("SELECT {} FROM contracts ORDER BY id", CONTRACT_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], contract_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn adjustment_from_row(r: &Row<'_>) -> rusqlite::Result<Adjustment> {
    Ok(Adjustment {
        id: r.get(0)?,
        contract_id: r.get(1)?,
        change_date: r.get(2)?,
        percentage: dec_at(r, 3)?,
        resulting_installment_value: dec_at(r, 4)?,
        note: r.get(5)?,
    })
}

/// Adjustments in application order, optionally for a single contract.
pub fn list_adjustments(conn: &Connection, contract_id: Option<i64>) -> Result<Vec<Adjustment>> {
    let mut stmt = conn.prepare(
        "SELECT id, contract_id, change_date, percentage, resulting_value, note
         FROM adjustments
         WHERE ?1 IS NULL OR contract_id=?1
         ORDER BY contract_id, id",
    )?;
    let rows = stmt.query_map(params![contract_id], adjustment_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn latest_adjustment(conn: &Connection, contract_id: i64) -> Result<Option<Adjustment>> {
    Ok(conn
        .query_row(
            "SELECT id, contract_id, change_date, percentage, resulting_value, note
             FROM adjustments WHERE contract_id=?1 ORDER BY id DESC LIMIT 1",
            params![contract_id],
            adjustment_from_row,
        )
        .optional()?)
}

const OBLIGATION_COLS: &str = "id, contract_id, party_id, title, due_date, expected_amount, paid_date, paid_amount, discount, penalty, interest, status, our_number, cost_center, note";

fn obligation_from_row(side: Side) -> impl Fn(&Row<'_>) -> rusqlite::Result<Obligation> {
    move |r| {
        Ok(Obligation {
            id: r.get(0)?,
            side,
            contract_id: r.get(1)?,
            party_id: r.get(2)?,
            title: r.get(3)?,
            due_date: r.get(4)?,
            expected_amount: dec_at(r, 5)?,
            paid_date: r.get(6)?,
            paid_amount: opt_dec_at(r, 7)?,
            discount: dec_at(r, 8)?,
            penalty: dec_at(r, 9)?,
            interest: dec_at(r, 10)?,
            stored_status: parse_enum_at(r, 11)?,
            our_number: r.get(12)?,
            cost_center: r.get(13)?,
            note: r.get(14)?,
        })
    }
}

pub fn load_obligation(conn: &Connection, side: Side, id: i64) -> Result<Obligation> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id=?1",
        OBLIGATION_COLS,
        side.table()
    );
    conn.query_row(&sql, params![id], obligation_from_row(side))
        .optional()?
        .ok_or_else(|| LedgerError::not_found(side.entity(), id).into())
}

pub fn find_receivable_by_our_number(conn: &Connection, our_number: &str) -> Result<Option<Obligation>> {
    let sql = format!(
        "SELECT {} FROM receivables WHERE our_number=?1",
        OBLIGATION_COLS
    );
    Ok(conn
        .query_row(&sql, params![our_number], obligation_from_row(Side::Receivable))
        .optional()?)
}

/// Obligations of one side ordered by due date; optional contract filter.
pub fn list_obligations(
    conn: &Connection,
    side: Side,
    contract_id: Option<i64>,
) -> Result<Vec<Obligation>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE ?1 IS NULL OR contract_id=?1 ORDER BY due_date, id",
        OBLIGATION_COLS,
        side.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![contract_id], obligation_from_row(side))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Fields of an obligation about to be written.
#[derive(Debug, Clone)]
pub struct NewObligation {
    pub contract_id: Option<i64>,
    pub party_id: i64,
    pub title: String,
    pub due_date: NaiveDate,
    pub expected_amount: Decimal,
    pub cost_center: Option<String>,
    pub note: Option<String>,
}

pub fn insert_obligation(conn: &Connection, side: Side, ob: &NewObligation) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {}(contract_id, party_id, title, due_date, expected_amount, cost_center, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        side.table()
    );
    conn.execute(
        &sql,
        params![
            ob.contract_id,
            ob.party_id,
            ob.title,
            ob.due_date.to_string(),
            ob.expected_amount.to_string(),
            ob.cost_center,
            ob.note
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const ACCOUNT_COLS: &str =
    "id, kind, name, bank_code, agency, number, agreement, opening_balance, current_balance";

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<LedgerAccount> {
    Ok(LedgerAccount {
        id: r.get(0)?,
        kind: parse_enum_at(r, 1)?,
        name: r.get(2)?,
        bank_code: r.get(3)?,
        agency: r.get(4)?,
        number: r.get(5)?,
        agreement: r.get(6)?,
        opening_balance: dec_at(r, 7)?,
        current_balance: dec_at(r, 8)?,
    })
}

pub fn load_account(conn: &Connection, id: i64) -> Result<LedgerAccount> {
    let sql = format!("SELECT {} FROM ledger_accounts WHERE id=?1", ACCOUNT_COLS);
    conn.query_row(&sql, params![id], account_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("account", id).into())
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<LedgerAccount>> {
    let sql = format!("SELECT {} FROM ledger_accounts ORDER BY kind, name", ACCOUNT_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], account_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

const ENTRY_COLS: &str =
    "id, date, kind, account_id, dest_account_id, amount, category, memo, document";

fn entry_from_row(r: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: r.get(0)?,
        date: r.get(1)?,
        kind: parse_enum_at(r, 2)?,
        account_id: r.get(3)?,
        dest_account_id: r.get(4)?,
        amount: dec_at(r, 5)?,
        category: r.get(6)?,
        memo: r.get(7)?,
        document: r.get(8)?,
    })
}

pub fn load_entry(conn: &Connection, id: i64) -> Result<LedgerEntry> {
    let sql = format!("SELECT {} FROM ledger_entries WHERE id=?1", ENTRY_COLS);
    conn.query_row(&sql, params![id], entry_from_row)
        .optional()?
        .ok_or_else(|| LedgerError::not_found("ledger entry", id).into())
}

pub fn find_entry_by_document(conn: &Connection, document: &str) -> Result<Option<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM ledger_entries WHERE document=?1 ORDER BY id DESC LIMIT 1",
        ENTRY_COLS
    );
    Ok(conn
        .query_row(&sql, params![document], entry_from_row)
        .optional()?)
}

/// Entries touching `account_id` (as source or destination), oldest first.
pub fn list_entries(conn: &Connection, account_id: Option<i64>) -> Result<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM ledger_entries
         WHERE ?1 IS NULL OR account_id=?1 OR dest_account_id=?1
         ORDER BY date, id",
        ENTRY_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![account_id], entry_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
