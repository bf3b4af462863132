//! Error types for tripstats-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A statistic needs at least one record of the named table
    #[error("Empty input: no {0}")]
    EmptyInput(&'static str),

    /// Argument or configuration value out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed record in an input table
    #[error("Parse error in {}:{line}: {msg}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    /// Unsupported input file
    #[error("Unsupported table format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// JSON error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot encoding error
    #[error("Snapshot error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Timestamp could not be formatted
    #[error("Timestamp error: {0}")]
    Time(#[from] time::error::Format),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, msg: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            msg: msg.to_string(),
        }
    }
}
