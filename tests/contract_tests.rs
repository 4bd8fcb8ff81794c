// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rentledger::commands::contracts::{
    NewContract, activate_contract, close_contract, create_contract,
};
use rentledger::db;
use rentledger::error::LedgerError;
use rentledger::models::{ContractPurpose, ContractStatus, ObligationStatus, Side};
use rentledger::schedule::Cadence;
use rentledger::status::resolve_status;
use rentledger::store;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    conn.execute(
        "INSERT INTO parties(document, legal_name, address, city, state, phone, role)
         VALUES ('529.982.247-25', 'Maria Souza', 'Rua A, 10', 'Curitiba', 'PR', '41 9999-0000', 'client')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO parties(document, legal_name, role) VALUES ('11.222.333/0001-81', 'Construtora Alfa', 'vendor')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO properties(kind, address, max_contracts) VALUES ('apartment', 'Rua B, 200', 1)",
        [],
    )
    .unwrap();
    conn
}

fn lease() -> NewContract {
    NewContract {
        property_id: 1,
        client_id: 1,
        purpose: ContractPurpose::Residential,
        start_date: d("2025-01-10"),
        end_date: d("2025-12-31"),
        installment_count: 3,
        installment_value: dec!(1500.00),
        cadence: Some(Cadence::DueDay(10)),
        deposit_count: 0,
        deposit_value: None,
        status: ContractStatus::Active,
        note: None,
    }
}

fn validation(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<LedgerError>(), Some(LedgerError::Validation(_)))
}

#[test]
fn contract_generates_schedule_and_snapshots_tenant() {
    let mut conn = setup();
    let id = create_contract(&mut conn, &lease()).unwrap();

    let c = store::load_contract(&conn, id).unwrap();
    assert_eq!(c.tenant.name, "Maria Souza");
    assert_eq!(c.tenant.city.as_deref(), Some("Curitiba"));
    assert_eq!(c.tenant.phone.as_deref(), Some("41 9999-0000"));

    let recs = store::list_obligations(&conn, Side::Receivable, Some(id)).unwrap();
    let titles: Vec<_> = recs.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["1-1/3", "1-2/3", "1-3/3"]);
    let dues: Vec<_> = recs.iter().map(|r| r.due_date).collect();
    assert_eq!(dues, vec![d("2025-02-10"), d("2025-03-10"), d("2025-04-10")]);
    assert!(recs.iter().all(|r| r.expected_amount == dec!(1500) && r.party_id == 1));
}

#[test]
fn tenant_snapshot_survives_party_edits() {
    let mut conn = setup();
    let id = create_contract(&mut conn, &lease()).unwrap();
    conn.execute("UPDATE parties SET city='Londrina' WHERE id=1", [])
        .unwrap();
    let c = store::load_contract(&conn, id).unwrap();
    assert_eq!(c.tenant.city.as_deref(), Some("Curitiba"));
}

#[test]
fn deposits_are_generated_alongside_rent() {
    let mut conn = setup();
    let mut input = lease();
    input.deposit_count = 2;
    input.deposit_value = Some(dec!(500));
    let id = create_contract(&mut conn, &input).unwrap();

    let recs = store::list_obligations(&conn, Side::Receivable, Some(id)).unwrap();
    assert_eq!(recs.len(), 5);
    let deposits: Vec<_> = recs.iter().filter(|r| r.title.starts_with('C')).collect();
    assert_eq!(deposits.len(), 2);
    assert_eq!(deposits[0].title, "C1-1/2");
    assert_eq!(deposits[0].due_date, d("2025-01-10"));
    assert_eq!(deposits[1].due_date, d("2025-02-09"));
}

#[test]
fn free_loan_has_no_receivables() {
    let mut conn = setup();
    let mut input = lease();
    input.purpose = ContractPurpose::FreeLoan;
    input.cadence = None;
    let id = create_contract(&mut conn, &input).unwrap();

    let c = store::load_contract(&conn, id).unwrap();
    assert_eq!(c.installment_value, Decimal::ZERO);
    assert!(store::list_obligations(&conn, Side::Receivable, Some(id))
        .unwrap()
        .is_empty());
}

#[test]
fn rejects_vendor_tenant_and_inverted_dates() {
    let mut conn = setup();
    let mut input = lease();
    input.client_id = 2;
    assert!(validation(&create_contract(&mut conn, &input).unwrap_err()));

    let mut input = lease();
    input.end_date = d("2024-12-31");
    assert!(validation(&create_contract(&mut conn, &input).unwrap_err()));

    let mut input = lease();
    input.cadence = None;
    assert!(validation(&create_contract(&mut conn, &input).unwrap_err()));

    let contracts: i64 = conn
        .query_row("SELECT COUNT(*) FROM contracts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(contracts, 0);
}

#[test]
fn schedule_past_the_calendar_is_rejected() {
    let mut conn = setup();
    let mut input = lease();
    input.installment_count = 2;
    input.cadence = Some(Cadence::IntervalDays(200_000_000));
    assert!(validation(&create_contract(&mut conn, &input).unwrap_err()));

    let contracts: i64 = conn
        .query_row("SELECT COUNT(*) FROM contracts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(contracts, 0);
}

#[test]
fn property_capacity_limits_active_contracts() {
    let mut conn = setup();
    create_contract(&mut conn, &lease()).unwrap();
    assert!(validation(&create_contract(&mut conn, &lease()).unwrap_err()));

    let mut pending = lease();
    pending.status = ContractStatus::Pending;
    let id = create_contract(&mut conn, &pending).unwrap();
    assert!(validation(&activate_contract(&conn, id).unwrap_err()));
}

#[test]
fn closing_cancels_only_future_receivables() {
    let mut conn = setup();
    let id = create_contract(&mut conn, &lease()).unwrap();
    let first = store::list_obligations(&conn, Side::Receivable, Some(id)).unwrap()[0].id;
    conn.execute(
        "UPDATE receivables SET paid_amount='1500.00', paid_date='2025-02-10', status='paid' WHERE id=?1",
        params![first],
    )
    .unwrap();

    let today = d("2025-03-15");
    let cancelled = close_contract(&mut conn, id, today).unwrap();
    assert_eq!(cancelled, 1);

    let statuses: Vec<_> = store::list_obligations(&conn, Side::Receivable, Some(id))
        .unwrap()
        .iter()
        .map(|r| resolve_status(r, today))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ObligationStatus::Paid,
            ObligationStatus::Overdue,
            ObligationStatus::Cancelled
        ]
    );
    assert_eq!(
        store::load_contract(&conn, id).unwrap().status,
        ContractStatus::Closed
    );

    let err = close_contract(&mut conn, id, today).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidState { .. })
    ));
}

#[test]
fn pending_contract_can_be_activated_once() {
    let mut conn = setup();
    let mut pending = lease();
    pending.status = ContractStatus::Pending;
    let id = create_contract(&mut conn, &pending).unwrap();
    activate_contract(&conn, id).unwrap();
    assert_eq!(
        store::load_contract(&conn, id).unwrap().status,
        ContractStatus::Active
    );
    assert!(activate_contract(&conn, id).is_err());
}
