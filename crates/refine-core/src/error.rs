//! Error types for refine-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in refine-core
#[derive(Debug, Error)]
pub enum Error {
    /// A required operation parameter is missing or malformed (validate-time)
    #[error("missing or invalid parameter: {0}")]
    MissingParameter(String),

    /// A named column no longer resolves (apply-time)
    #[error("no column named '{0}'")]
    ColumnNotFound(String),

    /// A column with this name already exists
    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    /// An operation kind has no registered decoder
    #[error("unknown operation kind '{0}'")]
    UnknownOperation(String),

    /// A recipe document was not shaped as expected
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    /// Undo with an empty past, or redo with an empty future
    #[error("nothing to {0}: history stack is empty")]
    EmptyHistory(&'static str),

    /// A change was asked to revert before it was ever applied
    #[error("change has no captured state to restore")]
    NothingToRevert,

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed CSV input
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
