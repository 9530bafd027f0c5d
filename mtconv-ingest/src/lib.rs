//! mtconv-ingest: MT940 statement ingestion, narrative decoding and flat export.

pub mod error;
pub mod export;
pub mod parsers;
pub mod types;

pub use error::{IngestError, Result};
pub use parsers::mt940::{Mt940Parser, ParseOptions, parse_mt940_file, parse_mt940_text};
pub use types::{Counterparty, Direction, ParsedTransaction, SkippedRecord, StatementParse};
