// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::error::LedgerError;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| LedgerError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
        .map_err(Into::into)
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .map_err(|_| LedgerError::validation(format!("Invalid month '{}', expected YYYY-MM", s)))?;
    Ok(s.to_string())
}

/// Parses amounts typed the way they are printed on invoices: `1234.56`,
/// `1.234,56`, `R$ 1.234,56` or `1,234.56`. The rightmost of `,`/`.` is the
/// decimal separator when both are present.
pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let raw = s.trim();
    let invalid = || LedgerError::validation(format!("Invalid decimal '{}'", raw));
    let cleaned: String = raw
        .strip_prefix("R$")
        .unwrap_or(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty()
        || cleaned
            .chars()
            .any(|c| !(c.is_ascii_digit() || matches!(c, ',' | '.' | '-')))
        || cleaned.rfind('-').is_some_and(|i| i > 0)
    {
        return Err(invalid().into());
    }
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    normalized.parse::<Decimal>().map_err(|_| invalid().into())
}

/// Checks a CPF (11 digits) or CNPJ (14 digits) against its two check
/// digits. Punctuation is ignored.
pub fn validate_document(document: &str) -> Result<()> {
    let digits: Vec<u32> = document
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '/' | ' '))
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .ok_or_else(|| LedgerError::validation(format!("document '{}' must be numeric", document)))?;
    let valid = match digits.len() {
        11 => cpf_digits_match(&digits),
        14 => cnpj_digits_match(&digits),
        _ => {
            return Err(LedgerError::validation(format!(
                "document '{}' must be a CPF (11 digits) or CNPJ (14 digits)",
                document
            ))
            .into());
        }
    };
    // repeated digits pass the arithmetic but are never issued
    if !valid || digits.iter().all(|d| *d == digits[0]) {
        return Err(
            LedgerError::validation(format!("document '{}' has invalid check digits", document)).into(),
        );
    }
    Ok(())
}

fn cpf_digits_match(digits: &[u32]) -> bool {
    let check = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .zip((2..=len as u32 + 1).rev())
            .map(|(d, w)| d * w)
            .sum();
        (sum * 10 % 11) % 10
    };
    check(9) == digits[9] && check(10) == digits[10]
}

fn cnpj_digits_match(digits: &[u32]) -> bool {
    const WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let check = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .zip(&WEIGHTS[13 - len..])
            .map(|(d, w)| d * w)
            .sum();
        match sum % 11 {
            r if r < 2 => 0,
            r => 11 - r,
        }
    };
    check(12) == digits[12] && check(13) == digits[13]
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Trimmed string argument, `None` when absent or blank.
pub fn opt_arg(sub: &clap::ArgMatches, name: &str) -> Option<String> {
    sub.get_one::<String>(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn req_arg(sub: &clap::ArgMatches, name: &str) -> Result<String> {
    opt_arg(sub, name)
        .ok_or_else(|| LedgerError::validation(format!("--{} is required", name)).into())
}

pub fn opt_decimal(sub: &clap::ArgMatches, name: &str) -> Result<Option<Decimal>> {
    opt_arg(sub, name).map(|s| parse_decimal(&s)).transpose()
}

pub fn opt_date(sub: &clap::ArgMatches, name: &str) -> Result<Option<NaiveDate>> {
    opt_arg(sub, name).map(|s| parse_date(&s)).transpose()
}

/// Reference date for status resolution: `--today` when given, else the local date.
pub fn today_arg(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    let given = if sub.try_contains_id("today").unwrap_or(false) {
        opt_date(sub, "today")?
    } else {
        None
    };
    Ok(given.unwrap_or_else(|| chrono::Local::now().date_naive()))
}

/// Reads a decimal stored as TEXT inside a row mapper.
pub fn dec_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn opt_dec_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub fn parse_enum_at<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = LedgerError>,
{
    let s: String = row.get(idx)?;
    s.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Resolves a party by numeric id or by document (CPF/CNPJ).
pub fn id_for_party(conn: &Connection, key: &str) -> Result<i64> {
    let key = key.trim();
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM parties WHERE document=?1 OR CAST(id AS TEXT)=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    id.ok_or_else(|| LedgerError::not_found("party", key).into())
}

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim();
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM ledger_accounts WHERE name=?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    id.ok_or_else(|| LedgerError::not_found("account", name).into())
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()
        .with_context(|| format!("Read setting '{}'", key))?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}
