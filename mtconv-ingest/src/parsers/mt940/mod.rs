//! MT940 statement parser.
//!
//! Only the `:61:` statement line and the `:86:` narrative that follows it
//! are read. Header, balance and trailer tags just delimit segments.
//!
//!   :61:2401150115D0000123456,78NTRFNONREF
//!   :86:116?00SEPA-UEBERWEISUNG?20Invoice?21Payment?30COBADEFFXXX
//!   ?31DE89370400440532013000?32John?33Doe

pub mod detail;
pub mod narrative;
pub mod tags;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::types::{Counterparty, ParsedTransaction, SkippedRecord, StatementParse};
use detail::DetailParser;
use narrative::NarrativeDecoder;
use tags::{TagExtractor, TagKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// First year of the hundred-year window two-digit years fall into
    pub century_window_start: i32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            century_window_start: 1950,
        }
    }
}

pub struct Mt940Parser {
    tags: TagExtractor,
    detail: DetailParser,
    narrative: NarrativeDecoder,
}

impl Mt940Parser {
    pub fn new(options: ParseOptions) -> Result<Self> {
        Ok(Self {
            tags: TagExtractor::new()?,
            detail: DetailParser::new(options.century_window_start)?,
            narrative: NarrativeDecoder::new()?,
        })
    }

    /// Build one transaction from a `:61:` body and its `:86:` body.
    ///
    /// Fails only with [`IngestError::MalformedDetailLine`]; a narrative
    /// that yields nothing just leaves the optional fields empty.
    pub fn parse_record(&self, detail: &str, narrative: &str) -> Result<ParsedTransaction> {
        let line = self.detail.parse(detail)?;
        let decoded = self.narrative.decode(narrative);

        Ok(ParsedTransaction {
            value_date: line.value_date,
            entry_date: line.entry_date,
            amount: line.amount,
            direction: line.direction,
            sub_type: line.sub_type,
            counterparty: Counterparty {
                iban: decoded.iban,
                name: decoded.name,
            },
            memo: decoded.memo,
            sepa_reference: decoded.sepa_reference,
        })
    }

    /// Parse every detail/narrative pair in `text`, in input order.
    /// Pairs with a malformed detail line are logged and reported in
    /// [`StatementParse::skipped`].
    pub fn parse_text(&self, text: &str) -> StatementParse {
        let mut out = StatementParse::default();

        for (index, (detail, narrative)) in self.tags.pairs(text).into_iter().enumerate() {
            if detail.kind != TagKind::Detail || narrative.kind != TagKind::Narrative {
                warn!(
                    index,
                    detail_tag = ?detail.kind,
                    narrative_tag = ?narrative.kind,
                    "tag pair out of order"
                );
            }

            match self.parse_record(detail.body, narrative.body) {
                Ok(txn) => out.transactions.push(txn),
                Err(e) => {
                    warn!(index, raw = detail.body.trim_end(), error = %e, "skipping transaction");
                    out.skipped.push(SkippedRecord {
                        index,
                        raw_detail: detail.body.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            parsed = out.transactions.len(),
            skipped = out.skipped.len(),
            "parsed MT940 statement"
        );
        out
    }
}

pub fn parse_mt940_text(text: &str, options: ParseOptions) -> Result<StatementParse> {
    Ok(Mt940Parser::new(options)?.parse_text(text))
}

pub fn parse_mt940_file(path: impl AsRef<Path>, options: ParseOptions) -> Result<StatementParse> {
    let text = read_statement(path.as_ref())?;
    parse_mt940_text(&text, options)
}

/// Read a statement file. Files that are not valid UTF-8 are decoded as
/// ISO-8859-1.
pub fn read_statement(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(IngestError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            IngestError::InputNotFound {
                path: path.to_path_buf(),
            }
        }
        _ => IngestError::Io(e),
    })?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!(path = %path.display(), "statement is not UTF-8, reading as latin-1");
            Ok(e.into_bytes().into_iter().map(char::from).collect())
        }
    }
}
