//! `:61:` statement line grammar:
//! `YYMMDD [MMDD] <mark> [sub type] <amount>` where amount uses `,` as the
//! decimal separator.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{IngestError, Result};
use crate::types::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub value_date: NaiveDate,
    pub entry_date: Option<NaiveDate>,
    pub direction: Direction,
    pub sub_type: Option<String>,
    /// Already signed by direction
    pub amount: Decimal,
}

pub struct DetailParser {
    line_re: Regex,
    century_window_start: i32,
}

impl DetailParser {
    pub fn new(century_window_start: i32) -> Result<Self> {
        let line_re = Regex::new(concat!(
            r"^(?P<date>[0-9]{6})",
            r"(?P<entry>[0-9]{4})?",
            r"(?P<mark>[A-Z])",
            r"(?P<sub>[A-Z]{1,2})?",
            r"(?P<amount>[0-9]+,[0-9]*)?"
        ))?;

        Ok(Self {
            line_re,
            century_window_start,
        })
    }

    pub fn parse(&self, raw: &str) -> Result<DetailLine> {
        let caps = self
            .line_re
            .captures(raw.trim_start())
            .ok_or_else(|| IngestError::malformed(raw, "does not match YYMMDD[MMDD]<mark>[sub]<amount>"))?;

        let value_date = parse_yymmdd(&caps["date"], self.century_window_start)
            .ok_or_else(|| IngestError::malformed(raw, "invalid value date"))?;

        let entry_date = caps
            .name("entry")
            .and_then(|m| parse_entry_date(value_date, m.as_str()));

        let direction = caps["mark"]
            .chars()
            .next()
            .map(Direction::from_mark)
            .ok_or_else(|| IngestError::malformed(raw, "missing direction mark"))?;

        let amount_raw = caps
            .name("amount")
            .ok_or_else(|| IngestError::malformed(raw, "missing amount"))?;
        let amount = parse_comma_decimal(amount_raw.as_str())
            .ok_or_else(|| IngestError::malformed(raw, "amount out of range"))?;

        Ok(DetailLine {
            value_date,
            entry_date,
            direction,
            sub_type: caps.name("sub").map(|m| m.as_str().to_string()),
            amount: match direction {
                Direction::Debit => -amount,
                Direction::Credit => amount,
            },
        })
    }
}

/// Map a two-digit year into the hundred-year window starting at `window_start`.
///
/// With the default window of 1950, `50..=99` become 1950–1999 and `00..=49`
/// become 2000–2049.
pub fn expand_two_digit_year(yy: i32, window_start: i32) -> i32 {
    window_start + (yy - window_start).rem_euclid(100)
}

fn parse_yymmdd(s: &str, window_start: i32) -> Option<NaiveDate> {
    let yy: i32 = s.get(0..2)?.parse().ok()?;
    let m: u32 = s.get(2..4)?.parse().ok()?;
    let d: u32 = s.get(4..6)?.parse().ok()?;
    NaiveDate::from_ymd_opt(expand_two_digit_year(yy, window_start), m, d)
}

/// Booking date `MMDD`, taking its year from the value date. A booking in
/// January for a December value date belongs to the next year, and the reverse.
fn parse_entry_date(value_date: NaiveDate, mmdd: &str) -> Option<NaiveDate> {
    let m: u32 = mmdd.get(0..2)?.parse().ok()?;
    let d: u32 = mmdd.get(2..4)?.parse().ok()?;
    let year = match (value_date.month(), m) {
        (12, 1) => value_date.year() + 1,
        (1, 12) => value_date.year() - 1,
        _ => value_date.year(),
    };
    NaiveDate::from_ymd_opt(year, m, d)
}

fn parse_comma_decimal(s: &str) -> Option<Decimal> {
    let (int, frac) = s.split_once(',')?;
    if frac.is_empty() {
        Decimal::from_str(int).ok()
    } else {
        Decimal::from_str(&format!("{int}.{frac}")).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DetailParser {
        DetailParser::new(1950).unwrap()
    }

    #[test]
    fn test_parse_debit_line() {
        let line = parser().parse("240115D0000123456,78").unwrap();
        assert_eq!(line.value_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(line.direction, Direction::Debit);
        assert_eq!(line.amount, Decimal::new(-12345678, 2));
        assert_eq!(line.entry_date, None);
        assert_eq!(line.sub_type, None);
    }

    #[test]
    fn test_parse_credit_with_entry_date_and_sub_type() {
        let line = parser().parse("2401160116CR100,NTRFNONREF\n").unwrap();
        assert_eq!(line.direction, Direction::Credit);
        assert_eq!(line.sub_type.as_deref(), Some("R"));
        assert_eq!(line.entry_date, NaiveDate::from_ymd_opt(2024, 1, 16));
        assert_eq!(line.amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_non_debit_marks_are_positive() {
        let line = parser().parse("240115R5,00").unwrap();
        assert_eq!(line.direction, Direction::Credit);
        assert!(!line.amount.is_sign_negative());
    }

    #[test]
    fn test_entry_date_year_rollover() {
        let line = parser().parse("2312310102D1,00").unwrap();
        assert_eq!(line.entry_date, NaiveDate::from_ymd_opt(2024, 1, 2));

        let line = parser().parse("2401021231C1,00").unwrap();
        assert_eq!(line.entry_date, NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn test_invalid_entry_date_degrades_to_none() {
        let line = parser().parse("2401151345D1,00").unwrap();
        assert_eq!(line.entry_date, None);
    }

    #[test]
    fn test_malformed_lines() {
        let p = parser();
        assert!(matches!(
            p.parse("ABCDEF"),
            Err(IngestError::MalformedDetailLine { .. })
        ));
        // no amount
        assert!(p.parse("240115D").is_err());
        // 30 February
        assert!(p.parse("240230C1,00").is_err());
    }

    #[test]
    fn test_century_window() {
        assert_eq!(expand_two_digit_year(24, 1950), 2024);
        assert_eq!(expand_two_digit_year(49, 1950), 2049);
        assert_eq!(expand_two_digit_year(50, 1950), 1950);
        assert_eq!(expand_two_digit_year(99, 1950), 1999);
        assert_eq!(expand_two_digit_year(99, 2000), 2099);

        let line = DetailParser::new(1900).unwrap().parse("240115C1,00").unwrap();
        assert_eq!(line.value_date, NaiveDate::from_ymd_opt(1924, 1, 15).unwrap());
    }
}
