use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    /// `D` is a debit; every other direction letter counts as a credit.
    pub fn from_mark(mark: char) -> Self {
        if mark == 'D' {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }
}

/// The other side of a transaction as named in the `:86:` narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub iban: Option<String>,
    pub name: Option<String>,
}

impl Counterparty {
    pub fn is_empty(&self) -> bool {
        self.iban.is_none() && self.name.is_none()
    }
}

/// One decoded `:61:`/`:86:` pair.
///
/// The counterparty is the payer on credits and the recipient on debits;
/// use [`ParsedTransaction::payer`] and [`ParsedTransaction::recipient`]
/// rather than reading `counterparty` with a role in mind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub value_date: NaiveDate,
    /// Booking date from the optional MMDD group of the detail line
    pub entry_date: Option<NaiveDate>,
    /// Negative for debits, positive (or zero) for credits.
    pub amount: Decimal,
    pub direction: Direction,
    /// Funds code / sub-type letters following the direction mark
    pub sub_type: Option<String>,
    pub counterparty: Counterparty,
    pub memo: String,
    pub sepa_reference: Option<String>,
}

impl ParsedTransaction {
    pub fn payer(&self) -> Option<&Counterparty> {
        match self.direction {
            Direction::Credit => Some(&self.counterparty),
            Direction::Debit => None,
        }
    }

    pub fn recipient(&self) -> Option<&Counterparty> {
        match self.direction {
            Direction::Debit => Some(&self.counterparty),
            Direction::Credit => None,
        }
    }

    pub fn payer_iban(&self) -> Option<&str> {
        self.payer().and_then(|c| c.iban.as_deref())
    }

    pub fn payer_name(&self) -> Option<&str> {
        self.payer().and_then(|c| c.name.as_deref())
    }

    pub fn recipient_iban(&self) -> Option<&str> {
        self.recipient().and_then(|c| c.iban.as_deref())
    }

    pub fn recipient_name(&self) -> Option<&str> {
        self.recipient().and_then(|c| c.name.as_deref())
    }
}

/// A detail/narrative pair that was dropped because its `:61:` line did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Zero-based position of the pair in the statement
    pub index: usize,
    pub raw_detail: String,
    pub reason: String,
}

/// Result of parsing a whole statement: emitted records in input order plus
/// the pairs that were dropped along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementParse {
    pub transactions: Vec<ParsedTransaction>,
    pub skipped: Vec<SkippedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(direction: Direction) -> ParsedTransaction {
        ParsedTransaction {
            value_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entry_date: None,
            amount: Decimal::new(100, 0),
            direction,
            sub_type: None,
            counterparty: Counterparty {
                iban: Some("DE89370400440532013000".to_string()),
                name: Some("JohnDoe".to_string()),
            },
            memo: String::new(),
            sepa_reference: None,
        }
    }

    #[test]
    fn test_direction_from_mark() {
        assert_eq!(Direction::from_mark('D'), Direction::Debit);
        assert_eq!(Direction::from_mark('C'), Direction::Credit);
        assert_eq!(Direction::from_mark('R'), Direction::Credit);
    }

    #[test]
    fn test_counterparty_role_follows_direction() {
        let debit = txn(Direction::Debit);
        assert_eq!(debit.recipient_iban(), Some("DE89370400440532013000"));
        assert_eq!(debit.recipient_name(), Some("JohnDoe"));
        assert!(debit.payer().is_none());

        let credit = txn(Direction::Credit);
        assert_eq!(credit.payer_iban(), Some("DE89370400440532013000"));
        assert!(credit.recipient().is_none());
    }
}
