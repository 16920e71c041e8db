//! Application-level errors (wraps domain and store errors)

use thiserror::Error;

use crate::domain::{DomainError, ErrorKind};
use crate::infrastructure::StoreError;

/// Application errors wrap domain errors and add storage and config context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// Classify for callers that map errors to status signals.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Domain(e) => e.kind(),
            ApplicationError::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            ApplicationError::Store(_) | ApplicationError::Config { .. } => ErrorKind::Internal,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
