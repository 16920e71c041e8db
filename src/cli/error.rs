//! CLI-level errors (wraps application errors)

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::ErrorKind;
use crate::exitcode;
use crate::infrastructure::StoreError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    App(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("render JSON: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => exitcode::USAGE,
            CliError::Render(_) => exitcode::SOFTWARE,
            CliError::App(ApplicationError::Config { .. }) => exitcode::CONFIG,
            CliError::App(ApplicationError::Store(StoreError::Io { .. })) => exitcode::IOERR,
            CliError::App(ApplicationError::Store(StoreError::Sqlite { source, .. }))
                if is_io_failure(source) =>
            {
                exitcode::IOERR
            }
            CliError::App(e) => match e.kind() {
                ErrorKind::NotFound => exitcode::NOINPUT,
                ErrorKind::Validation | ErrorKind::InvalidOperation => exitcode::DATAERR,
                ErrorKind::Conflict => exitcode::TEMPFAIL,
                ErrorKind::Internal => exitcode::SOFTWARE,
            },
        }
    }
}

/// SQLite failures caused by the file system rather than by the data.
fn is_io_failure(error: &rusqlite::Error) -> bool {
    matches!(
        error.sqlite_error_code(),
        Some(ErrorCode::CannotOpen | ErrorCode::SystemIoFailure | ErrorCode::DiskFull)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, NodeId};
    use rstest::rstest;
    use rusqlite::ffi;

    fn sqlite_failure(code: std::os::raw::c_int) -> ApplicationError {
        StoreError::Sqlite {
            context: "open database".into(),
            source: rusqlite::Error::SqliteFailure(ffi::Error::new(code), None),
        }
        .into()
    }

    #[rstest]
    #[case(DomainError::NodeNotFound(NodeId::new()).into(), exitcode::NOINPUT)]
    #[case(DomainError::EmptyName.into(), exitcode::DATAERR)]
    #[case(DomainError::SelfParent(NodeId::new()).into(), exitcode::DATAERR)]
    #[case(StoreError::Conflict("busy".into()).into(), exitcode::TEMPFAIL)]
    #[case(ApplicationError::Config { message: "bad".into() }, exitcode::CONFIG)]
    #[case(sqlite_failure(ffi::SQLITE_CANTOPEN), exitcode::IOERR)]
    #[case(sqlite_failure(ffi::SQLITE_IOERR), exitcode::IOERR)]
    #[case(sqlite_failure(ffi::SQLITE_FULL), exitcode::IOERR)]
    #[case(sqlite_failure(ffi::SQLITE_CONSTRAINT), exitcode::SOFTWARE)]
    fn given_application_error_when_mapping_then_uses_sysexits_code(
        #[case] error: ApplicationError,
        #[case] expected: i32,
    ) {
        assert_eq!(CliError::App(error).exit_code(), expected);
    }
}
