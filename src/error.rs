use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("missing required organizational columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("no period label could be parsed: {0}")]
    NoPeriodMatch(NoPeriodMatchReason),

    #[error("no disease columns found (expected column names containing a disease case token)")]
    NoDiseaseColumns,

    #[error("no rows left after {stage}")]
    EmptyResult { stage: &'static str },

    #[error("invalid case count {value:?} in column '{column}' at row {row}")]
    InvalidCaseCount {
        column: String,
        row: usize,
        value: String,
    },

    #[error("upload row {row} has {found} fields, expected {expected}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid threshold table: {0}")]
    InvalidThresholds(String),

    #[error("unknown province '{0}'")]
    UnknownProvince(String),

    #[error("no threshold file for {province} (looked for {})", path.display())]
    ThresholdsNotFound { province: String, path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why the period parser could not produce a reporting week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoPeriodMatchReason {
    /// The upload has no period label column at all
    MissingColumn(String),
    /// None of the label patterns matched a single row
    NoPatternMatched,
    /// A pattern matched, but no row survived year/week coercion
    AllRowsDropped,
}

impl fmt::Display for NoPeriodMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "no '{column}' column"),
            Self::NoPatternMatched => write!(f, "no pattern matched the period labels"),
            Self::AllRowsDropped => write!(f, "no valid weeks parsed"),
        }
    }
}

impl AlertError {
    /// Short, stable label used for failure metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::NoPeriodMatch(_) => "no_period_match",
            Self::NoDiseaseColumns => "no_disease_columns",
            Self::EmptyResult { .. } => "empty_result",
            Self::InvalidCaseCount { .. } => "invalid_case_count",
            Self::MalformedRow { .. } => "malformed_row",
            Self::InvalidThresholds(_) => "invalid_thresholds",
            Self::UnknownProvince(_) => "unknown_province",
            Self::ThresholdsNotFound { .. } => "thresholds_not_found",
            Self::Csv(_) => "csv",
            Self::Json(_) => "json",
            Self::Toml(_) => "toml",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;
