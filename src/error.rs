//! Error types for extraction and reorganization

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a whole extraction or organize run
#[derive(Error, Debug)]
pub enum Error {
    /// The mbox file does not exist
    #[error("Mail store not found: {}", .0.display())]
    MailStoreNotFound(PathBuf),

    /// The directory to organize does not exist
    #[error("Directory {} does not exist", .0.display())]
    TargetNotFound(PathBuf),

    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a message structure
    #[error("Failed to parse message: {0}")]
    Parse(String),

    /// Invalid category rule table
    #[error("Invalid category rules: {0}")]
    Rules(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<mailparse::MailParseError> for Error {
    fn from(err: mailparse::MailParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, Error>;
