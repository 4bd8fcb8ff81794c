// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rentledger::commands::cashbook::{NewAccount, NewEntry, create_account, post_entry};
use rentledger::commands::reports::{cashflow, dashboard};
use rentledger::models::{AccountKind, EntryKind, Side};
use rentledger::store::{self, NewObligation};
use rentledger::db;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rusqlite::Connection;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    conn.execute(
        "INSERT INTO parties(document, legal_name, role) VALUES ('1', 'Maria Souza', 'both')",
        [],
    )
    .unwrap();
    for name in ["Caixa", "Itau"] {
        create_account(
            &conn,
            &NewAccount {
                name: name.into(),
                kind: Some(AccountKind::Cash),
                ..Default::default()
            },
        )
        .unwrap();
    }
    conn
}

fn obligation(conn: &Connection, side: Side, due: &str, amount: Decimal) {
    store::insert_obligation(
        conn,
        side,
        &NewObligation {
            contract_id: None,
            party_id: 1,
            title: format!("T-{}", due),
            due_date: d(due),
            expected_amount: amount,
            cost_center: None,
            note: None,
        },
    )
    .unwrap();
}

fn post(conn: &Connection, date: &str, kind: EntryKind, amount: Decimal) {
    post_entry(
        conn,
        &NewEntry {
            date: d(date),
            kind,
            account_id: 1,
            dest_account_id: (kind == EntryKind::Transfer).then_some(2),
            amount,
            category: None,
            memo: None,
            document: None,
        },
    )
    .unwrap();
}

#[test]
fn dashboard_splits_open_and_overdue() {
    let conn = setup();
    obligation(&conn, Side::Receivable, "2025-01-10", dec!(1000));
    obligation(&conn, Side::Receivable, "2025-02-10", dec!(1000));
    obligation(&conn, Side::Receivable, "2025-03-10", dec!(1200));
    obligation(&conn, Side::Payable, "2025-01-20", dec!(80));
    conn.execute("UPDATE receivables SET status='cancelled' WHERE id=1", [])
        .unwrap();

    let dash = dashboard(&conn, d("2025-02-15")).unwrap();
    assert_eq!(dash.receivables.overdue.count, 1);
    assert_eq!(dash.receivables.overdue.total, dec!(1000));
    assert_eq!(dash.receivables.open.count, 1);
    assert_eq!(dash.receivables.open.total, dec!(1200));
    assert_eq!(dash.payables.overdue.total, dec!(80));
    assert_eq!(dash.payables.open.count, 0);
    assert_eq!(dash.balances.len(), 2);
}

#[test]
fn cashflow_groups_by_month_and_skips_transfers() {
    let conn = setup();
    post(&conn, "2025-01-05", EntryKind::Inflow, dec!(1000));
    post(&conn, "2025-01-20", EntryKind::Outflow, dec!(300));
    post(&conn, "2025-01-21", EntryKind::Transfer, dec!(200));
    post(&conn, "2025-02-05", EntryKind::Inflow, dec!(1000));

    let flows = cashflow(&conn, 12).unwrap();
    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0].month, "2025-02");
    assert_eq!(flows[1].month, "2025-01");
    assert_eq!(flows[1].inflow, dec!(1000));
    assert_eq!(flows[1].outflow, dec!(300));

    assert_eq!(cashflow(&conn, 1).unwrap().len(), 1);
}
