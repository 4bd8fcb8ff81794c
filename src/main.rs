// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use rentledger::models::Side;
use rentledger::{cli, commands, db};

fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    init_logging(matches.get_flag("verbose"));

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("party", sub)) => commands::parties::handle(&conn, sub)?,
        Some(("property", sub)) => commands::properties::handle(&conn, sub)?,
        Some(("contract", sub)) => commands::contracts::handle(&mut conn, sub)?,
        Some(("adjust", sub)) => commands::adjustments::handle(&mut conn, sub)?,
        Some(("receivable", sub)) => {
            commands::obligations::handle(&mut conn, Side::Receivable, sub)?
        }
        Some(("payable", sub)) => commands::obligations::handle(&mut conn, Side::Payable, sub)?,
        Some(("cash", sub)) => commands::cashbook::handle(&mut conn, sub)?,
        Some(("billing", sub)) => commands::billing::handle(&mut conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        Some(("settings", sub)) => commands::settings::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
