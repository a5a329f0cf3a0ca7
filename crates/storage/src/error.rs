//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! The relocation engine reports outcomes a download can recover from
//! ([`Conflict`](ErrorKind::Conflict), a sidecar that would not move) without
//! failing the session. These kinds only say what happened to *one* file.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// File already exists (for operations that never overwrite)
    #[display("file already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// The file system holding the path is full
    #[display("no space left on device: {}", _0.display())]
    StorageFull(#[error(not(source))] PathBuf),
    /// Path contains invalid characters or escapes its root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The destination is taken and the conflict policy forbids renaming.
    #[display("destination already exists: {}", path.display())]
    Conflict { path: PathBuf, modified: Option<time::UtcDateTime> },
    /// Every unique identifier up to the ceiling was already taken.
    #[display("no unique name found for {} after {attempts} attempts", path.display())]
    IdentifiersExhausted { path: PathBuf, attempts: u32 },
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::StorageFull(_))
    }

    /// Whether the error is about the destination being taken, rather than
    /// the file system failing.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::IdentifiersExhausted { .. } | Self::AlreadyExists(_))
    }
}
