// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rentledger::commands::exporter::{self, export_obligations};
use rentledger::models::Side;
use rentledger::store::{self, NewObligation};
use rentledger::{cli, db};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn base_conn() -> Connection {
    let conn = db::open_in_memory().unwrap();
    conn.execute(
        "INSERT INTO parties(document, legal_name, role) VALUES ('529.982.247-25', 'Maria Souza', 'both')",
        [],
    )
    .unwrap();
    for (title, due) in [("1-1/2", "2025-02-10"), ("1-2/2", "2025-03-10")] {
        store::insert_obligation(
            &conn,
            Side::Receivable,
            &NewObligation {
                contract_id: None,
                party_id: 1,
                title: title.into(),
                due_date: d(due),
                expected_amount: dec!(1500.00),
                cost_center: None,
                note: None,
            },
        )
        .unwrap();
    }
    conn.execute(
        "UPDATE receivables SET paid_amount='1500.00', paid_date='2025-02-10', status='paid' WHERE id=1",
        [],
    )
    .unwrap();
    conn
}

#[test]
fn export_receivables_as_json_with_effective_status() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("receivables.json");
    let out_str = out_path.to_string_lossy().to_string();

    let matches = cli::build_cli().get_matches_from([
        "rentledger",
        "export",
        "receivables",
        "--format",
        "json",
        "--out",
        &out_str,
        "--today",
        "2025-03-20",
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["title"], "1-1/2");
    assert_eq!(rows[0]["party"], "Maria Souza");
    assert_eq!(rows[0]["paid"], "1500.00");
    assert_eq!(rows[0]["status"], "paid");
    assert_eq!(rows[1]["due_date"], "2025-03-10");
    assert_eq!(rows[1]["status"], "overdue");
    assert!(rows[1]["paid"].is_null());
}

#[test]
fn export_receivables_as_csv() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("receivables.csv");
    let n = export_obligations(&conn, Side::Receivable, "csv", &out_path, d("2025-03-01")).unwrap();
    assert_eq!(n, 2);

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[11], "status");
    let statuses: Vec<String> = rdr
        .records()
        .map(|r| r.unwrap()[11].to_string())
        .collect();
    assert_eq!(statuses, vec!["paid", "open"]);
}

#[test]
fn export_rejects_unknown_format() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    assert!(export_obligations(&conn, Side::Payable, "xml", &out_path, d("2025-03-01")).is_err());
    assert!(!out_path.exists());

    let res = cli::build_cli().try_get_matches_from([
        "rentledger",
        "export",
        "payables",
        "--format",
        "xml",
        "--out",
        "x",
    ]);
    assert!(res.is_err());
}
