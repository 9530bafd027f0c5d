//! Flat export of parsed transactions.
//!
//! Each record becomes `{transactionDate, transactionAmount, iban, description}`
//! where `iban` is the counterparty IBAN regardless of its role.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::types::ParsedTransaction;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord<'a> {
    pub transaction_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub transaction_amount: Decimal,
    pub iban: Option<&'a str>,
    pub description: &'a str,
}

impl<'a> From<&'a ParsedTransaction> for ExportRecord<'a> {
    fn from(txn: &'a ParsedTransaction) -> Self {
        Self {
            transaction_date: txn.value_date,
            transaction_amount: txn.amount,
            iban: txn.counterparty.iban.as_deref(),
            description: &txn.memo,
        }
    }
}

pub fn write_json<W: Write>(mut w: W, txns: &[ParsedTransaction], pretty: bool) -> Result<()> {
    let records: Vec<ExportRecord<'_>> = txns.iter().map(ExportRecord::from).collect();
    if pretty {
        serde_json::to_writer_pretty(&mut w, &records)?;
    } else {
        serde_json::to_writer(&mut w, &records)?;
    }
    w.write_all(b"\n")?;
    Ok(())
}

pub fn write_csv<W: Write>(w: W, txns: &[ParsedTransaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    for txn in txns {
        wtr.serialize(ExportRecord::from(txn))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Counterparty, Direction};

    fn sample() -> Vec<ParsedTransaction> {
        vec![
            ParsedTransaction {
                value_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                entry_date: None,
                amount: Decimal::new(-12345678, 2),
                direction: Direction::Debit,
                sub_type: None,
                counterparty: Counterparty {
                    iban: Some("DE89370400440532013000".to_string()),
                    name: Some("JohnDoe".to_string()),
                },
                memo: "InvoicePayment".to_string(),
                sepa_reference: None,
            },
            ParsedTransaction {
                value_date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
                entry_date: None,
                amount: Decimal::new(5000, 2),
                direction: Direction::Credit,
                sub_type: None,
                counterparty: Counterparty::default(),
                memo: "Cash, deposit".to_string(),
                sepa_reference: None,
            },
        ]
    }

    #[test]
    fn test_json_shape() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample(), false).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {
                    "transactionDate": "2024-01-15",
                    "transactionAmount": -123456.78,
                    "iban": "DE89370400440532013000",
                    "description": "InvoicePayment"
                },
                {
                    "transactionDate": "2024-01-16",
                    "transactionAmount": 50.0,
                    "iban": null,
                    "description": "Cash, deposit"
                }
            ])
        );
    }

    #[test]
    fn test_csv_shape() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "transactionDate,transactionAmount,iban,description");
        assert_eq!(lines[1], "2024-01-15,-123456.78,DE89370400440532013000,InvoicePayment");
        assert_eq!(lines[2], "2024-01-16,50.0,,\"Cash, deposit\"");
    }
}
