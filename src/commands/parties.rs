// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::{PartyRole, PartyStatus};
use crate::store;
use crate::utils::{id_for_party, maybe_print_json, opt_arg, pretty_table, req_arg, validate_document};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("status", sub)) => set_status(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let document = req_arg(sub, "document")?;
    validate_document(&document)?;
    let name = req_arg(sub, "name")?;
    let role: PartyRole = req_arg(sub, "role")?.parse()?;
    let state = opt_arg(sub, "state").map(|s| s.to_uppercase());
    if let Some(ref st) = state {
        if st.len() != 2 {
            return Err(LedgerError::validation(format!("state '{}' must have 2 letters", st)).into());
        }
    }
    conn.execute(
        "INSERT INTO parties(document, legal_name, trade_name, address, district, city, state, zip, phone, note, role)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            document,
            name,
            opt_arg(sub, "trade_name"),
            opt_arg(sub, "address"),
            opt_arg(sub, "district"),
            opt_arg(sub, "city"),
            state,
            opt_arg(sub, "zip"),
            opt_arg(sub, "phone"),
            opt_arg(sub, "note"),
            role.as_str()
        ],
    )
    .with_context(|| format!("Register party '{}' ({})", name, document))?;
    tracing::info!(id = conn.last_insert_rowid(), %document, "party registered");
    println!("Added {} '{}' ({})", role, name, document);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let role = opt_arg(sub, "role").map(|r| r.parse::<PartyRole>()).transpose()?;
    let parties: Vec<_> = store::list_parties(conn)?
        .into_iter()
        .filter(|p| match role {
            Some(PartyRole::Client) => p.role.is_client(),
            Some(PartyRole::Vendor) => p.role.is_vendor(),
            Some(PartyRole::Both) => p.role == PartyRole::Both,
            None => true,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &parties)? {
        let rows = parties
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.document.clone(),
                    p.legal_name.clone(),
                    p.role.to_string(),
                    p.city.clone().unwrap_or_default(),
                    p.phone.clone().unwrap_or_default(),
                    p.status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Document", "Name", "Role", "City", "Phone", "Status"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_for_party(conn, &req_arg(sub, "party")?)?;
    let p = store::load_party(conn, id)?;
    println!("{}", serde_json::to_string_pretty(&p)?);
    Ok(())
}

fn set_status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_for_party(conn, &req_arg(sub, "party")?)?;
    let status: PartyStatus = req_arg(sub, "status")?.parse()?;
    conn.execute(
        "UPDATE parties SET status=?1 WHERE id=?2",
        params![status.as_str(), id],
    )?;
    println!("Party {} is now {}", id, status);
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let key = req_arg(sub, "party")?;
    let id = id_for_party(conn, &key)?;
    let refs: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM contracts WHERE client_id=?1)
              + (SELECT COUNT(*) FROM receivables WHERE party_id=?1)
              + (SELECT COUNT(*) FROM payables WHERE party_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if refs > 0 {
        return Err(LedgerError::validation(format!(
            "party '{}' is referenced by {} contract(s) or entries",
            key, refs
        ))
        .into());
    }
    conn.execute("DELETE FROM parties WHERE id=?1", params![id])?;
    tracing::info!(id, "party removed");
    println!("Removed party '{}'", key);
    Ok(())
}
