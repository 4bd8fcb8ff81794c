// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rentledger::adjustment::apply_adjustment;
use rentledger::commands::adjustments;
use rentledger::commands::contracts::{NewContract, close_contract, create_contract};
use rentledger::error::LedgerError;
use rentledger::models::{ContractPurpose, ContractStatus, Side};
use rentledger::schedule::Cadence;
use rentledger::{cli, db, store};
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup(status: ContractStatus) -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    conn.execute(
        "INSERT INTO parties(document, legal_name, role) VALUES ('529.982.247-25', 'Maria Souza', 'client')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO properties(kind, address) VALUES ('house', 'Rua C, 5')",
        [],
    )
    .unwrap();
    create_contract(
        &mut conn,
        &NewContract {
            property_id: 1,
            client_id: 1,
            purpose: ContractPurpose::Commercial,
            start_date: d("2025-01-01"),
            end_date: d("2026-12-31"),
            installment_count: 2,
            installment_value: dec!(1000.00),
            cadence: Some(Cadence::DueDay(5)),
            deposit_count: 0,
            deposit_value: None,
            status,
            note: None,
        },
    )
    .unwrap();
    conn
}

#[test]
fn adjustment_updates_contract_value() {
    let mut conn = setup(ContractStatus::Active);
    let adj = apply_adjustment(&mut conn, 1, d("2025-06-01"), dec!(5.0), Some("IGPM")).unwrap();
    assert_eq!(adj.resulting_installment_value, dec!(1050.00));
    assert_eq!(
        store::load_contract(&conn, 1).unwrap().installment_value,
        dec!(1050.00)
    );

    let adj = apply_adjustment(&mut conn, 1, d("2026-06-01"), dec!(-10), None).unwrap();
    assert_eq!(adj.resulting_installment_value, dec!(945.00));

    let history = store::list_adjustments(&conn, Some(1)).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].note.as_deref(), Some("IGPM"));
    assert_eq!(
        store::latest_adjustment(&conn, 1).unwrap().unwrap().id,
        history[1].id
    );
}

#[test]
fn adjustment_leaves_generated_receivables_alone() {
    let mut conn = setup(ContractStatus::Active);
    apply_adjustment(&mut conn, 1, d("2025-06-01"), dec!(5), None).unwrap();
    let recs = store::list_obligations(&conn, Side::Receivable, Some(1)).unwrap();
    assert!(recs.iter().all(|r| r.expected_amount == dec!(1000)));
}

#[test]
fn only_active_contracts_can_be_adjusted() {
    let mut conn = setup(ContractStatus::Pending);
    let err = apply_adjustment(&mut conn, 1, d("2025-06-01"), dec!(5), None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidState { .. })
    ));

    let mut conn = setup(ContractStatus::Active);
    close_contract(&mut conn, 1, d("2025-01-01")).unwrap();
    assert!(apply_adjustment(&mut conn, 1, d("2025-06-01"), dec!(5), None).is_err());
    assert!(store::list_adjustments(&conn, Some(1)).unwrap().is_empty());
    assert_eq!(
        store::load_contract(&conn, 1).unwrap().installment_value,
        dec!(1000)
    );
}

#[test]
fn unknown_contract_is_not_found() {
    let mut conn = setup(ContractStatus::Active);
    let err = apply_adjustment(&mut conn, 42, d("2025-06-01"), dec!(5), None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::NotFound { entity: "contract", .. })
    ));
}

#[test]
fn adjust_add_accepts_comma_percent() {
    let mut conn = setup(ContractStatus::Active);
    let matches = cli::build_cli().get_matches_from([
        "rentledger",
        "adjust",
        "add",
        "--contract",
        "1",
        "--date",
        "2025-06-01",
        "--percent",
        "4,5",
    ]);
    if let Some(("adjust", adj_m)) = matches.subcommand() {
        adjustments::handle(&mut conn, adj_m).unwrap();
    } else {
        panic!("no adjust subcommand");
    }
    assert_eq!(
        store::load_contract(&conn, 1).unwrap().installment_value,
        dec!(1045.00)
    );
}
