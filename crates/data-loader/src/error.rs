//! Error types for the data-loader crate.
//!
//! Every variant here is fatal to loading: the caller never receives a
//! partially cleaned table.

use thiserror::Error;

/// Errors that can occur while reading and cleaning a nutrition table.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Dataset file does not exist
    #[error("Data file not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file could not be read as delimited tabular data
    #[error("Failed to parse tabular data in {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// The file is not delimited text (a workbook, other binary data, or
    /// text without any delimited row near the top)
    #[error("{path} is not a delimited text table: {reason}")]
    NotTabular { path: String, reason: String },

    /// No probed row contained every required column
    ///
    /// `similar` lists, per missing column, headers that look alike
    /// (case-insensitive containment) to help diagnose renamed columns.
    #[error(
        "Missing required columns {missing:?} in {path} (probed {probed_rows} header rows; similar headers: {similar:?})"
    )]
    SchemaError {
        path: String,
        missing: Vec<String>,
        probed_rows: usize,
        similar: Vec<(String, Vec<String>)>,
    },

    /// Every data row was dropped during cleaning
    #[error("No usable food rows in {path} ({dropped} rows dropped)")]
    EmptyDataset { path: String, dropped: usize },

    /// A cleaned record violated a table invariant
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
