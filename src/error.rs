use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("cleaning rules do not compile: {0}")]
    RulePattern(#[from] regex::Error),

    #[error("invalid cleaning rules: {0}")]
    InvalidRules(String),

    #[error("invalid page range: {0}")]
    InvalidPageRange(String),

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,
}
