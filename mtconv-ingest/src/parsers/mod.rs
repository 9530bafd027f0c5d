//! Bank-format specific statement parsers.

pub mod mt940;
