// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::Attachment;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, opt_arg, opt_date, opt_decimal, pretty_table, req_arg};
use anyhow::Result;
use rusqlite::{Connection, params};
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("attach", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let file = req_arg(sub, "file")?;
            let att_id = attach(conn, id, Path::new(&file))?;
            println!("Attached {} to property {} (attachment {})", file, id, att_id);
        }
        Some(("attachments", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let rows = attachments(conn, id)?
                .into_iter()
                .map(|a| vec![a.id.to_string(), a.file_name, a.stored_path, a.added_at])
                .collect();
            println!("{}", pretty_table(&["ID", "File", "Path", "Added"], rows));
        }
        Some(("detach", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute("DELETE FROM property_attachments WHERE id=?1", params![id])?;
            if n == 0 {
                return Err(LedgerError::not_found("attachment", id).into());
            }
            println!("Removed attachment {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind = req_arg(sub, "kind")?;
    let address = req_arg(sub, "address")?;
    let max_contracts = sub.get_one::<i64>("max_contracts").copied();
    if matches!(max_contracts, Some(n) if n < 1) {
        return Err(LedgerError::validation("--max-contracts must be at least 1").into());
    }
    conn.execute(
        "INSERT INTO properties(kind, address, registry, enrollment, tax_id, latitude, longitude,
                                acquired_on, market_value, rent_value, max_contracts, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            kind,
            address,
            opt_arg(sub, "registry"),
            opt_arg(sub, "enrollment"),
            opt_arg(sub, "tax_id"),
            sub.get_one::<f64>("lat").copied(),
            sub.get_one::<f64>("lon").copied(),
            opt_date(sub, "acquired_on")?.map(|d| d.to_string()),
            opt_decimal(sub, "value")?.map(|d| d.to_string()),
            opt_decimal(sub, "rent")?.map(|d| d.to_string()),
            max_contracts,
            opt_arg(sub, "note"),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, %address, "property registered");
    println!("Added property {} ({}) at {}", id, kind, address);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let props = store::list_properties(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &props)? {
        let rows = props
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.kind.clone(),
                    p.address.clone(),
                    p.enrollment.clone().unwrap_or_default(),
                    p.rent_value.map(|v| fmt_money(&v)).unwrap_or_default(),
                    p.max_contracts.map(|n| n.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Kind", "Address", "Enrollment", "Rent", "Max contracts"], rows)
        );
    }
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let contracts: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contracts WHERE property_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if contracts > 0 {
        return Err(LedgerError::validation(format!(
            "property {} has {} contract(s)",
            id, contracts
        ))
        .into());
    }
    let n = conn.execute("DELETE FROM properties WHERE id=?1", params![id])?;
    if n == 0 {
        return Err(LedgerError::not_found("property", id).into());
    }
    println!("Removed property {}", id);
    Ok(())
}

/// Records an existing file as an attachment of a property. Only the path
/// is kept; the file itself is not copied.
pub fn attach(conn: &Connection, property_id: i64, file: &Path) -> Result<i64> {
    store::load_property(conn, property_id)?;
    if !file.is_file() {
        return Err(LedgerError::not_found("file", file.display()).into());
    }
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LedgerError::validation(format!("'{}' has no file name", file.display())))?;
    let stored = file
        .canonicalize()
        .unwrap_or_else(|_| file.to_path_buf())
        .display()
        .to_string();
    conn.execute(
        "INSERT INTO property_attachments(property_id, file_name, stored_path) VALUES (?1, ?2, ?3)",
        params![property_id, file_name, stored],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(property_id, id, path = %stored, "attachment recorded");
    Ok(id)
}

pub fn attachments(conn: &Connection, property_id: i64) -> Result<Vec<Attachment>> {
    let mut stmt = conn.prepare(
        "SELECT id, property_id, file_name, stored_path, added_at
         FROM property_attachments WHERE property_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![property_id], |r| {
        Ok(Attachment {
            id: r.get(0)?,
            property_id: r.get(1)?,
            file_name: r.get(2)?,
            stored_path: r.get(3)?,
            added_at: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
