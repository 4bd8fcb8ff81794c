// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Simplified CNAB240 fixed-width files: billing remittance, billing return
//! and bank statements.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::LedgerError;

pub const LINE_WIDTH: usize = 240;
const MIN_STATEMENT_LINE: usize = 160;

/// One billed title in a remittance or return file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub our_number: String,
    pub amount: Decimal,
}

/// One movement read from a bank statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementLine {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub memo: String,
}

fn to_cents(amount: Decimal) -> Result<u64, LedgerError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_u64()
        .ok_or_else(|| LedgerError::validation(format!("amount {} cannot be billed", amount)))
}

fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn pad(line: String) -> String {
    format!("{:<width$}", line, width = LINE_WIDTH)
}

/// Writes a remittance file: header, one `T` detail per title, trailer.
pub fn write_remittance(bank_code: &str, titles: &[Title]) -> Result<String, LedgerError> {
    let bank = bank_code.trim();
    if bank.is_empty() || bank.len() > 3 || !bank.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::validation(format!(
            "bank code '{}' must be up to 3 digits",
            bank_code
        )));
    }
    let mut lines = Vec::with_capacity(titles.len() + 2);
    lines.push(pad(format!("{:0>3}0000HEADER", bank)));
    let mut seq = 1usize;
    for t in titles {
        if t.our_number.len() > 20 {
            return Err(LedgerError::validation(format!(
                "our number '{}' longer than 20 characters",
                t.our_number
            )));
        }
        let cents = to_cents(t.amount)?;
        lines.push(pad(format!(
            "{:0>3}T{:>20}{:0>13}{:0>6}",
            bank, t.our_number, cents, seq
        )));
        seq += 1;
    }
    lines.push(pad(format!("{:0>3}9999TRAILER{:0>6}", bank, seq)));
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Reads the paid titles of a return file. Header and trailer are skipped,
/// as are detail lines of any segment other than `T`.
pub fn read_return(content: &str) -> Result<Vec<Title>, LedgerError> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 2 {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for (idx, line) in lines[1..lines.len() - 1].iter().enumerate() {
        if line.get(3..4) != Some("T") {
            continue;
        }
        let line_no = idx + 2;
        let our_number = line
            .get(4..24)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LedgerError::validation(format!("line {}: missing our number", line_no)))?;
        let cents = line
            .get(24..37)
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| LedgerError::validation(format!("line {}: invalid amount", line_no)))?;
        out.push(Title {
            our_number: our_number.to_string(),
            amount: from_cents(cents),
        });
    }
    Ok(out)
}

/// Parses a bank statement. Columns count characters, so accented memos
/// keep later fields aligned. Lines too short, with a malformed date or
/// amount, or moving no money are skipped.
pub fn parse_statement(content: &str) -> Vec<StatementLine> {
    content
        .lines()
        .map(|l| l.chars().collect::<Vec<char>>())
        .filter(|chars| chars.len() >= MIN_STATEMENT_LINE)
        .filter_map(|chars| {
            let field = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
            let date = NaiveDate::parse_from_str(&field(143, 151), "%Y%m%d").ok()?;
            let cents = field(152, 167).trim().parse::<i64>().ok().filter(|c| *c > 0)?;
            Some(StatementLine {
                date,
                amount: from_cents(cents),
                memo: field(70, 90).trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn statement_line(date: &str, cents: i64, memo: &str) -> String {
        let mut line = " ".repeat(70);
        line.push_str(&format!("{:<20}", memo));
        line.push_str(&" ".repeat(143 - 90));
        line.push_str(date);
        line.push(' ');
        line.push_str(&format!("{:0>15}", cents));
        format!("{:<240}", line)
    }

    #[test]
    fn remittance_layout() {
        let titles = vec![
            Title { our_number: "0000000001".into(), amount: dec!(1500.00) },
            Title { our_number: "0000000002".into(), amount: dec!(99.9) },
        ];
        let out = write_remittance("1", &titles).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.len() == LINE_WIDTH));
        assert!(lines[0].starts_with("0010000HEADER"));
        assert_eq!(&lines[1][..4], "001T");
        assert_eq!(&lines[1][4..24], "          0000000001");
        assert_eq!(&lines[1][24..37], "0000000150000");
        assert_eq!(&lines[1][37..43], "000001");
        assert_eq!(&lines[2][24..37], "0000000009990");
        assert!(lines[3].starts_with("0019999TRAILER000003"));
    }

    #[test]
    fn return_reads_what_remittance_wrote() {
        let titles = vec![Title { our_number: "0000000042".into(), amount: dec!(1234.56) }];
        let out = write_remittance("341", &titles).unwrap();
        assert_eq!(read_return(&out).unwrap(), titles);
    }

    #[test]
    fn rejects_bad_bank_code_and_negative_amount() {
        assert!(write_remittance("12a", &[]).is_err());
        let neg = vec![Title { our_number: "1".into(), amount: dec!(-1) }];
        assert!(write_remittance("001", &neg).is_err());
    }

    #[test]
    fn return_reports_malformed_amount() {
        let content = format!(
            "{}\n{}\n{}\n",
            pad("0010000HEADER".into()),
            pad(format!("001T{:>20}ABCDEFGHIJKLM000001", "7")),
            pad("0019999TRAILER000002".into())
        );
        let err = read_return(&content).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(m) if m.contains("line 2")));
    }

    #[test]
    fn statement_skips_short_and_malformed_lines() {
        let content = [
            statement_line("20250105", 15000, "PIX ALUGUEL"),
            "short line".to_string(),
            statement_line("2025XX05", 100, "BROKEN"),
            statement_line("20250106", 2550, "TED"),
        ]
        .join("\n");
        let parsed = parse_statement(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(parsed[0].amount, dec!(150.00));
        assert_eq!(parsed[0].memo, "PIX ALUGUEL");
        assert_eq!(parsed[1].amount, dec!(25.50));
    }

    #[test]
    fn statement_columns_count_characters() {
        let content = [
            statement_line("20250105", 15000, "PIX ALUGUEL"),
            statement_line("20250106", 120000, "PIX JOÃO ALUGUEL"),
        ]
        .join("\n");
        let parsed = parse_statement(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].memo, "PIX JOÃO ALUGUEL");
        assert_eq!(parsed[1].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(parsed[1].amount, dec!(1200.00));
    }

    #[test]
    fn statement_skips_lines_without_money() {
        let content = [
            statement_line("20250105", 15000, "PIX"),
            statement_line("20250105", 0, "TARIFA"),
        ]
        .join("\n");
        let parsed = parse_statement(&content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].memo, "PIX");
    }
}
