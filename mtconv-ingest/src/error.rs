use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Malformed :61: detail line {raw:?}: {reason}")]
    MalformedDetailLine { raw: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl IngestError {
    pub fn malformed(raw: &str, reason: impl Into<String>) -> Self {
        IngestError::MalformedDetailLine {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
