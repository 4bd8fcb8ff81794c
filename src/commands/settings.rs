// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::utils::{get_setting, pretty_table, req_arg, set_setting};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = req_arg(sub, "key")?;
            let value = req_arg(sub, "value")?;
            set_setting(conn, &key, &value)?;
            tracing::info!(%key, "setting updated");
            println!("{} = {}", key, value);
        }
        Some(("get", sub)) => {
            let key = req_arg(sub, "key")?;
            let value = get_setting(conn, &key)?.ok_or_else(|| LedgerError::not_found("setting", &key))?;
            println!("{}", value);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
            let rows = stmt
                .query_map([], |r| Ok(vec![r.get::<_, String>(0)?, r.get::<_, String>(1)?]))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
