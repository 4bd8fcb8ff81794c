// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Rentledger", "rentledger"));

/// Overrides the platform data dir when set.
pub const DB_ENV: &str = "RENTLEDGER_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("rentledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS parties(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document TEXT NOT NULL UNIQUE,
        legal_name TEXT NOT NULL,
        trade_name TEXT,
        address TEXT,
        district TEXT,
        city TEXT,
        state TEXT,
        zip TEXT,
        phone TEXT,
        note TEXT,
        role TEXT NOT NULL CHECK(role IN ('client','vendor','both')),
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','inactive')),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS properties(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        address TEXT NOT NULL,
        registry TEXT,
        enrollment TEXT,
        tax_id TEXT,
        latitude REAL,
        longitude REAL,
        acquired_on TEXT,
        market_value TEXT,
        rent_value TEXT,
        max_contracts INTEGER,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS property_attachments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL,
        file_name TEXT NOT NULL,
        stored_path TEXT NOT NULL,
        added_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(property_id) REFERENCES properties(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS contracts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL,
        client_id INTEGER NOT NULL,
        tenant_name TEXT NOT NULL,
        tenant_address TEXT,
        tenant_district TEXT,
        tenant_city TEXT,
        tenant_state TEXT,
        tenant_zip TEXT,
        tenant_phone TEXT,
        purpose TEXT NOT NULL CHECK(purpose IN ('residential','commercial','freeloan')),
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        installment_count INTEGER NOT NULL DEFAULT 0,
        installment_value TEXT NOT NULL DEFAULT '0',
        deposit_count INTEGER NOT NULL DEFAULT 0,
        deposit_value TEXT,
        status TEXT NOT NULL CHECK(status IN ('active','closed','pending')),
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(property_id) REFERENCES properties(id) ON DELETE RESTRICT,
        FOREIGN KEY(client_id) REFERENCES parties(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS adjustments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        contract_id INTEGER NOT NULL,
        change_date TEXT NOT NULL,
        percentage TEXT NOT NULL,
        resulting_value TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(contract_id) REFERENCES contracts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_adjustments_contract ON adjustments(contract_id);

    CREATE TABLE IF NOT EXISTS receivables(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        contract_id INTEGER,
        party_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        due_date TEXT NOT NULL,
        expected_amount TEXT NOT NULL,
        paid_date TEXT,
        paid_amount TEXT,
        discount TEXT NOT NULL DEFAULT '0',
        penalty TEXT NOT NULL DEFAULT '0',
        interest TEXT NOT NULL DEFAULT '0',
        status TEXT NOT NULL DEFAULT 'open' CHECK(status IN ('open','paid','cancelled')),
        our_number TEXT UNIQUE,
        cost_center TEXT,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(contract_id) REFERENCES contracts(id) ON DELETE CASCADE,
        FOREIGN KEY(party_id) REFERENCES parties(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_receivables_due ON receivables(due_date);

    CREATE TABLE IF NOT EXISTS payables(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        contract_id INTEGER,
        party_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        due_date TEXT NOT NULL,
        expected_amount TEXT NOT NULL,
        paid_date TEXT,
        paid_amount TEXT,
        discount TEXT NOT NULL DEFAULT '0',
        penalty TEXT NOT NULL DEFAULT '0',
        interest TEXT NOT NULL DEFAULT '0',
        status TEXT NOT NULL DEFAULT 'open' CHECK(status IN ('open','paid','cancelled')),
        our_number TEXT,
        cost_center TEXT,
        note TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(contract_id) REFERENCES contracts(id) ON DELETE SET NULL,
        FOREIGN KEY(party_id) REFERENCES parties(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_payables_due ON payables(due_date);

    CREATE TABLE IF NOT EXISTS ledger_accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL CHECK(kind IN ('cash','bank')),
        name TEXT NOT NULL UNIQUE,
        bank_code TEXT,
        agency TEXT,
        number TEXT,
        agreement TEXT,
        opening_balance TEXT NOT NULL DEFAULT '0',
        current_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS ledger_entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('inflow','outflow','transfer')),
        account_id INTEGER NOT NULL,
        dest_account_id INTEGER,
        amount TEXT NOT NULL,
        category TEXT,
        memo TEXT,
        document TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES ledger_accounts(id) ON DELETE RESTRICT,
        FOREIGN KEY(dest_account_id) REFERENCES ledger_accounts(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_ledger_entries_date ON ledger_entries(date);
    CREATE INDEX IF NOT EXISTS idx_ledger_entries_document ON ledger_entries(document);

    CREATE TABLE IF NOT EXISTS reconciliations(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entry_id INTEGER NOT NULL,
        source_file TEXT,
        status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending','reconciled','rejected')),
        reconciled_at TEXT,
        FOREIGN KEY(entry_id) REFERENCES ledger_entries(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
