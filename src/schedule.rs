// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Due-date arithmetic for contract installments and payable replication.

use chrono::{Datelike, Days, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::LedgerError;

/// How successive due dates are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Same day every month, clamped to the month's last day.
    DueDay(u32),
    /// Fixed number of days between installments.
    IntervalDays(u32),
}

impl Cadence {
    /// Exactly one of the two knobs must be set.
    pub fn from_options(due_day: Option<u32>, interval_days: Option<u32>) -> Result<Self, LedgerError> {
        match (due_day, interval_days) {
            (Some(d), None) if (1..=31).contains(&d) => Ok(Cadence::DueDay(d)),
            (Some(d), None) => Err(LedgerError::validation(format!(
                "due day {} must be between 1 and 31",
                d
            ))),
            (None, Some(n)) if n > 0 => Ok(Cadence::IntervalDays(n)),
            (None, Some(_)) => Err(LedgerError::validation("interval days must be positive")),
            _ => Err(LedgerError::validation(
                "give exactly one of --due-day or --interval-days",
            )),
        }
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let first_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

fn out_of_range(date: NaiveDate) -> LedgerError {
    LedgerError::validation(format!("schedule from {} runs past the last supported date", date))
}

/// `date` shifted by `months`, day clamped to the target month's length.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, LedgerError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| out_of_range(date))
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate, LedgerError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn with_clamped_day(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.min(last_day_of_month(date.year(), date.month()));
    date.with_day(day).unwrap_or(date)
}

/// Due date of installment `n` (1-based) counted from `start`.
pub fn due_date(start: NaiveDate, cadence: Cadence, n: u32) -> Result<NaiveDate, LedgerError> {
    match cadence {
        Cadence::DueDay(day) => Ok(with_clamped_day(add_months(start, n)?, day)),
        Cadence::IntervalDays(days) => add_days(start, u64::from(days) * u64::from(n)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installment {
    pub title: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

/// Rent installments `{contract}-{n}/{count}`.
pub fn rent_installments(
    contract_id: i64,
    start: NaiveDate,
    cadence: Cadence,
    count: u32,
    amount: Decimal,
) -> Result<Vec<Installment>, LedgerError> {
    (1..=count)
        .map(|n| {
            Ok(Installment {
                title: format!("{}-{}/{}", contract_id, n, count),
                due_date: due_date(start, cadence, n)?,
                amount,
            })
        })
        .collect()
}

/// Security-deposit installments `C{contract}-{n}/{count}`, the first due on
/// the start date and then every 30 days.
pub fn deposit_installments(
    contract_id: i64,
    start: NaiveDate,
    count: u32,
    amount: Decimal,
) -> Result<Vec<Installment>, LedgerError> {
    (1..=count)
        .map(|n| {
            Ok(Installment {
                title: format!("C{}-{}/{}", contract_id, n, count),
                due_date: add_days(start, 30 * u64::from(n - 1))?,
                amount,
            })
        })
        .collect()
}

static NUMBERED_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)-(\s*)(\d+)\s*/\s*(\d+)$").expect("numbered title pattern")
});

/// Title of the `offset`-th copy of a payable: `RENT-3/12` becomes
/// `RENT-(3+offset)/12`; anything else gets `-offset` appended.
pub fn renumber_title(title: &str, offset: u32) -> String {
    if let Some(caps) = NUMBERED_TITLE.captures(title) {
        if let Ok(n) = caps[3].parse::<u64>() {
            return format!(
                "{}-{}{}/{}",
                &caps[1],
                &caps[2],
                n + u64::from(offset),
                &caps[4]
            );
        }
    }
    format!("{}-{}", title, offset)
}

/// Due date of the `offset`-th copy of a payable due on `base`.
pub fn replicated_due_date(
    base: NaiveDate,
    cadence: Cadence,
    offset: u32,
) -> Result<NaiveDate, LedgerError> {
    match cadence {
        Cadence::DueDay(day) => add_months(with_clamped_day(base, day), offset),
        Cadence::IntervalDays(_) => due_date(base, cadence, offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn due_day_clamps_to_short_months() {
        let start = d(2025, 1, 15);
        assert_eq!(due_date(start, Cadence::DueDay(31), 1).unwrap(), d(2025, 2, 28));
        assert_eq!(due_date(start, Cadence::DueDay(31), 2).unwrap(), d(2025, 3, 31));
        assert_eq!(due_date(d(2023, 12, 10), Cadence::DueDay(30), 2).unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn interval_days_accumulate() {
        let start = d(2025, 1, 1);
        assert_eq!(due_date(start, Cadence::IntervalDays(30), 1).unwrap(), d(2025, 1, 31));
        assert_eq!(due_date(start, Cadence::IntervalDays(30), 3).unwrap(), d(2025, 4, 1));
    }

    #[test]
    fn dates_past_the_calendar_are_rejected() {
        let start = d(2025, 1, 1);
        let err = due_date(start, Cadence::IntervalDays(200_000_000), 2).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(due_date(start, Cadence::DueDay(10), u32::MAX).is_err());
        assert!(replicated_due_date(start, Cadence::DueDay(10), u32::MAX).is_err());
        assert!(deposit_installments(1, NaiveDate::MAX, 2, dec!(10)).is_err());
    }

    #[test]
    fn cadence_requires_exactly_one_knob() {
        assert!(Cadence::from_options(None, None).is_err());
        assert!(Cadence::from_options(Some(5), Some(30)).is_err());
        assert!(Cadence::from_options(Some(32), None).is_err());
        assert_eq!(Cadence::from_options(Some(5), None).unwrap(), Cadence::DueDay(5));
    }

    #[test]
    fn rent_and_deposit_titles() {
        let start = d(2025, 1, 10);
        let rent = rent_installments(7, start, Cadence::DueDay(10), 3, dec!(1500)).unwrap();
        assert_eq!(rent.len(), 3);
        assert_eq!(rent[0].title, "7-1/3");
        assert_eq!(rent[0].due_date, d(2025, 2, 10));
        assert_eq!(rent[2].title, "7-3/3");

        let dep = deposit_installments(7, start, 2, dec!(500)).unwrap();
        assert_eq!(dep[0].title, "C7-1/2");
        assert_eq!(dep[0].due_date, start);
        assert_eq!(dep[1].due_date, d(2025, 2, 9));
    }

    #[test]
    fn renumbers_numbered_titles() {
        assert_eq!(renumber_title("IPTU-1/10", 2), "IPTU-3/10");
        assert_eq!(renumber_title("IPTU- 4 / 10", 1), "IPTU- 5/10");
        assert_eq!(renumber_title("Condominio", 3), "Condominio-3");
    }

    #[test]
    fn last_day_of_february() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2025, 2), 28);
        assert_eq!(last_day_of_month(2025, 12), 31);
    }
}
