// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

// Enums persisted as lowercase TEXT columns.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(LedgerError::validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum!(PartyRole { Client => "client", Vendor => "vendor", Both => "both" });
text_enum!(PartyStatus { Active => "active", Inactive => "inactive" });
text_enum!(ContractStatus { Active => "active", Closed => "closed", Pending => "pending" });
text_enum!(ContractPurpose {
    Residential => "residential",
    Commercial => "commercial",
    FreeLoan => "freeloan",
});
text_enum!(ObligationStatus {
    Open => "open",
    Paid => "paid",
    Overdue => "overdue",
    Cancelled => "cancelled",
});
text_enum!(AccountKind { Cash => "cash", Bank => "bank" });
text_enum!(EntryKind { Inflow => "inflow", Outflow => "outflow", Transfer => "transfer" });
text_enum!(ReconciliationStatus {
    Pending => "pending",
    Reconciled => "reconciled",
    Rejected => "rejected",
});

impl PartyRole {
    pub fn is_client(&self) -> bool {
        matches!(self, PartyRole::Client | PartyRole::Both)
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self, PartyRole::Vendor | PartyRole::Both)
    }
}

/// Which book an obligation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Receivable,
    Payable,
}

impl Side {
    pub fn table(&self) -> &'static str {
        match self {
            Side::Receivable => "receivables",
            Side::Payable => "payables",
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            Side::Receivable => "receivable",
            Side::Payable => "payable",
        }
    }

    /// Document tag of the ledger entry posted when the obligation is paid.
    pub fn document(&self, id: i64) -> String {
        match self {
            Side::Receivable => format!("CR-{}", id),
            Side::Payable => format!("CP-{}", id),
        }
    }

    pub fn entry_kind(&self) -> EntryKind {
        match self {
            Side::Receivable => EntryKind::Inflow,
            Side::Payable => EntryKind::Outflow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: i64,
    pub document: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub note: Option<String>,
    pub role: PartyRole,
    pub status: PartyStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub kind: String,
    pub address: String,
    pub registry: Option<String>,
    pub enrollment: Option<String>,
    pub tax_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub acquired_on: Option<NaiveDate>,
    pub market_value: Option<Decimal>,
    pub rent_value: Option<Decimal>,
    pub max_contracts: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub property_id: i64,
    pub file_name: String,
    pub stored_path: String,
    pub added_at: String,
}

/// Tenant fields copied from the client party when the contract is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantSnapshot {
    pub name: String,
    pub address: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
}

impl From<&Party> for TenantSnapshot {
    fn from(p: &Party) -> Self {
        TenantSnapshot {
            name: p.legal_name.clone(),
            address: p.address.clone(),
            district: p.district.clone(),
            city: p.city.clone(),
            state: p.state.clone(),
            zip: p.zip.clone(),
            phone: p.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub property_id: i64,
    pub client_id: i64,
    pub tenant: TenantSnapshot,
    pub purpose: ContractPurpose,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub installment_count: i64,
    pub installment_value: Decimal,
    pub deposit_count: i64,
    pub deposit_value: Option<Decimal>,
    pub status: ContractStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: i64,
    pub contract_id: i64,
    pub change_date: NaiveDate,
    pub percentage: Decimal,
    pub resulting_installment_value: Decimal,
    pub note: Option<String>,
}

/// A receivable or payable row. `stored_status` is what the table holds
/// (`open`, `paid` or `cancelled`); the effective status comes from
/// [`crate::status::resolve_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: i64,
    pub side: Side,
    pub contract_id: Option<i64>,
    pub party_id: i64,
    pub title: String,
    pub due_date: NaiveDate,
    pub expected_amount: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
    pub discount: Decimal,
    pub penalty: Decimal,
    pub interest: Decimal,
    pub stored_status: ObligationStatus,
    pub our_number: Option<String>,
    pub cost_center: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: i64,
    pub kind: AccountKind,
    pub name: String,
    pub bank_code: Option<String>,
    pub agency: Option<String>,
    pub number: Option<String>,
    pub agreement: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub account_id: i64,
    pub dest_account_id: Option<i64>,
    pub amount: Decimal,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub document: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_enums_parse_case_insensitively() {
        assert_eq!("Active".parse::<ContractStatus>().unwrap(), ContractStatus::Active);
        assert_eq!(" BANK ".parse::<AccountKind>().unwrap(), AccountKind::Bank);
        assert!("archived".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn side_documents() {
        assert_eq!(Side::Receivable.document(7), "CR-7");
        assert_eq!(Side::Payable.document(7), "CP-7");
        assert_eq!(Side::Payable.entry_kind(), EntryKind::Outflow);
    }
}
