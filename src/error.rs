//! Error types for date resolution and snapshot I/O.
//!
//! Neither type ever reaches a classifier's caller: `DateError` is folded into
//! "no due date" by the normalizer, and `SnapshotError` only surfaces at the
//! file boundary used by the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Why a due-date value could not be turned into an instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("empty date text")]
    Empty,

    #[error("unrecognised date text: {0:?}")]
    Unparseable(String),

    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),

    #[error("local time {0} does not exist in the reference timezone")]
    NonexistentLocalTime(String),

    #[error("unsupported date value: {0}")]
    Unsupported(String),

    #[error("conversion failed: {0}")]
    Conversion(String),
}

/// Failures reading or writing task snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialise report: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("No task found matching '{0}'")]
    TaskNotFound(String),

    #[error("Multiple tasks match '{query}': {ids}. Use the ID instead.")]
    AmbiguousTask { query: String, ids: String },
}

impl SnapshotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io { path: path.into(), source }
    }

    /// Exit code the CLI uses when this error ends a command.
    pub fn exit_code(&self) -> i32 {
        match self {
            SnapshotError::TaskNotFound(_) | SnapshotError::AmbiguousTask { .. } => 2,
            _ => 1,
        }
    }
}
