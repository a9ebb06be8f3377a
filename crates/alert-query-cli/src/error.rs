//! CLI error types.

use std::fmt;

use alert_query::AlertQueryError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// Output formatting error.
    Format(String),
    /// Invalid input file contents.
    InvalidInput(String),
    /// The query engine rejected the request.
    Query(AlertQueryError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Query(e) => write!(f, "query error: {e}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

// Inner errors are already part of the `Display` text, so no `source()`.
impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<AlertQueryError> for CliError {
    fn from(err: AlertQueryError) -> Self {
        match err {
            AlertQueryError::Config(msg) => Self::Config(msg),
            other => Self::Query(other),
        }
    }
}
