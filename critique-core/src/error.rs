//! Error types for critique

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for critique operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, used to decide how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file under review could not be used
    FileAccess,
    /// The remote completion service failed
    Upstream,
    /// Local configuration is invalid
    Config,
}

/// Error type for critique operations
#[derive(Error, Debug)]
pub enum Error {
    /// The source file is missing, a directory, or unreadable
    #[error("Cannot read '{}': {reason}", .path.display())]
    FileAccess { path: PathBuf, reason: String },

    /// The source file has no reviewable content
    #[error("The file '{}' is empty", .0.display())]
    EmptySource(PathBuf),

    /// The source file exceeds the configured size limit
    #[error("The file '{}' is {chars} characters, over the limit of {limit}", .path.display())]
    SourceTooLarge {
        path: PathBuf,
        chars: usize,
        limit: usize,
    },

    /// Missing or rejected API credential
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The provider refused the request due to rate limiting or quota
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other failure of the remote call
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileAccess { .. } | Error::EmptySource(_) | Error::SourceTooLarge { .. } => {
                ErrorKind::FileAccess
            }
            Error::Auth(_) | Error::RateLimited(_) | Error::Upstream(_) => ErrorKind::Upstream,
            Error::Config(_) | Error::Io(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn file_access(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::FileAccess {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Upstream(format!("request timed out: {}", err))
        } else if err.is_decode() {
            Error::Upstream(format!("malformed response: {}", err))
        } else {
            Error::Upstream(err.to_string())
        }
    }
}
