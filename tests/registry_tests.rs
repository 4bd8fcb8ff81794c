// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rentledger::commands::{parties, properties};
use rentledger::error::LedgerError;
use rentledger::models::{PartyRole, PartyStatus};
use rentledger::{cli, db, store};
use rusqlite::Connection;
use tempfile::tempdir;

fn run_party(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["rentledger", "party"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("party", m)) => parties::handle(conn, m),
        _ => panic!("no party subcommand"),
    }
}

#[test]
fn party_lifecycle_through_cli() {
    let conn = db::open_in_memory().unwrap();
    run_party(
        &conn,
        &[
            "add", "--document", "529.982.247-25", "--name", "Maria Souza", "--role", "client",
            "--city", "Curitiba", "--state", "pr",
        ],
    )
    .unwrap();
    let p = store::load_party(&conn, 1).unwrap();
    assert_eq!(p.role, PartyRole::Client);
    assert_eq!(p.state.as_deref(), Some("PR"));
    assert_eq!(p.status, PartyStatus::Active);

    // duplicate document
    assert!(run_party(
        &conn,
        &["add", "--document", "529.982.247-25", "--name", "Other", "--role", "vendor"],
    )
    .is_err());

    run_party(&conn, &["status", "--party", "529.982.247-25", "--status", "inactive"]).unwrap();
    assert_eq!(
        store::load_party(&conn, 1).unwrap().status,
        PartyStatus::Inactive
    );

    run_party(&conn, &["rm", "--party", "1"]).unwrap();
    assert!(store::list_parties(&conn).unwrap().is_empty());
}

#[test]
fn referenced_party_cannot_be_removed() {
    let conn = db::open_in_memory().unwrap();
    run_party(
        &conn,
        &["add", "--document", "11.222.333/0001-81", "--name", "Ana", "--role", "both"],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO payables(party_id, title, due_date, expected_amount) VALUES (1, 'X', '2025-01-01', '10')",
        [],
    )
    .unwrap();
    let err = run_party(&conn, &["rm", "--party", "11.222.333/0001-81"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Validation(_))
    ));
}

#[test]
fn bad_state_is_rejected() {
    let conn = db::open_in_memory().unwrap();
    assert!(run_party(
        &conn,
        &["add", "--document", "529.982.247-25", "--name", "Ana", "--role", "client", "--state", "Parana"],
    )
    .is_err());
}

#[test]
fn property_attachments_track_existing_files() {
    let conn = db::open_in_memory().unwrap();
    conn.execute(
        "INSERT INTO properties(kind, address) VALUES ('store', 'Av. Brasil, 1')",
        [],
    )
    .unwrap();
    let dir = tempdir().unwrap();
    let deed = dir.path().join("escritura.pdf");
    std::fs::write(&deed, b"%PDF").unwrap();

    let id = properties::attach(&conn, 1, &deed).unwrap();
    let list = properties::attachments(&conn, 1).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, id);
    assert_eq!(list[0].file_name, "escritura.pdf");

    let missing = dir.path().join("missing.pdf");
    let err = properties::attach(&conn, 1, &missing).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::NotFound { .. })
    ));
    assert!(properties::attach(&conn, 2, &deed).is_err());
}

#[test]
fn document_with_wrong_check_digit_is_rejected() {
    let conn = db::open_in_memory().unwrap();
    let err = run_party(
        &conn,
        &["add", "--document", "529.982.247-26", "--name", "Ana", "--role", "client"],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Validation(_))
    ));
    assert!(store::list_parties(&conn).unwrap().is_empty());
}
