use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::sync::parser::ParseMessageError;

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors surfaced by the database layer.
///
/// Every variant names what was being worked on so batch callers can report
/// the failing file or operation and move on to the next message.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("cannot create database at {path}: not a directory")]
    NotADirectory { path: PathBuf },
    #[error("cannot create database at {path}: {source}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot create directory {path}: {source}")]
    CreateMetadata {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot open database at {path}: metadata directory not found")]
    NotFound { path: PathBuf },
    #[error("engine exception during {operation}: {source}")]
    Engine {
        operation: &'static str,
        source: tantivy::TantivyError,
    },
    #[error("engine schema error: {0}")]
    Schema(String),
    #[error("out of memory while building {0}")]
    OutOfMemory(&'static str),
    #[error("error opening {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ParseMessageError,
    },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl DatabaseError {
    pub fn engine(operation: &'static str, source: tantivy::TantivyError) -> Self {
        DatabaseError::Engine { operation, source }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatabaseError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            DatabaseError::NotADirectory { .. } => Status::NotADirectory,
            DatabaseError::Stat { .. } | DatabaseError::CreateMetadata { .. } => Status::FileError,
            DatabaseError::NotFound { .. } => Status::NotFound,
            DatabaseError::Engine { .. } | DatabaseError::Schema(_) => Status::EngineException,
            DatabaseError::OutOfMemory(_) => Status::OutOfMemory,
            DatabaseError::Io { .. } => Status::FileError,
            DatabaseError::Parse { .. } => Status::FileNotEmail,
            DatabaseError::InvalidQuery(_) => Status::InvalidQuery,
        }
    }

    /// Whether a batch import may skip this message and continue.
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            DatabaseError::Io { .. } | DatabaseError::Parse { .. } | DatabaseError::OutOfMemory(_)
        )
    }
}

/// Coarse status codes reported to callers that only need to branch on the
/// kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    OutOfMemory,
    EngineException,
    FileError,
    FileNotEmail,
    NotADirectory,
    NotFound,
    InvalidQuery,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Success => "no error occurred",
            Status::OutOfMemory => "out of memory",
            Status::EngineException => "a search engine exception occurred",
            Status::FileError => "something went wrong trying to read or write a file",
            Status::FileNotEmail => "file is not an email",
            Status::NotADirectory => "path is not a directory",
            Status::NotFound => "database not found",
            Status::InvalidQuery => "invalid query",
        })
    }
}

impl<T> From<&DatabaseResult<T>> for Status {
    fn from(result: &DatabaseResult<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(err) => err.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_engine_failures() {
        let err = DatabaseError::engine(
            "commit",
            tantivy::TantivyError::InvalidArgument("boom".to_string()),
        );
        assert_eq!(err.status(), Status::EngineException);
        assert!(!err.is_per_message());
        assert!(err.to_string().contains("commit"));
    }

    #[test]
    fn io_errors_are_per_message() {
        let err = DatabaseError::io(
            "/tmp/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.status(), Status::FileError);
        assert!(err.is_per_message());
        assert!(err.to_string().contains("/tmp/missing"));
    }

    #[test]
    fn status_from_result() {
        let ok: DatabaseResult<u64> = Ok(1);
        assert_eq!(Status::from(&ok), Status::Success);
        let err: DatabaseResult<u64> = Err(DatabaseError::InvalidQuery("x".into()));
        assert_eq!(Status::from(&err), Status::InvalidQuery);
    }
}
