//! Infrastructure-level errors (storage backends)

use thiserror::Error;

use crate::domain::NodeId;

/// Errors raised by node stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Another writer holds the store; the whole operation may be retried.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("sqlite error: {context}")]
    Sqlite {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("record not found: {0}")]
    MissingRecord(NodeId),

    #[error("record already exists: {0}")]
    DuplicateRecord(NodeId),

    #[error("corrupt record {id}: {message}")]
    Corrupt { id: String, message: String },

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Wrap a rusqlite error; busy and locked databases become `Conflict`.
    pub fn sqlite(context: impl Into<String>, source: rusqlite::Error) -> Self {
        let context = context.into();
        match source.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                Self::Conflict(format!("{}: {}", context, source))
            }
            _ => Self::Sqlite { context, source },
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
