//! Download Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Very little in a download session is an error: anything that goes wrong
//! with a single file becomes a [`Problem`](ferry_naming::Problem) on its
//! result. These kinds cover the collaborators and the request stream itself.

use derive_more::{Display, Error};

/// A download error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for download operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The metadata service could not read the file.
    #[display("could not load metadata")]
    Metadata,
    /// The thumbnail service failed for a placed file.
    #[display("could not create thumbnail")]
    Thumbnail,
    /// A request could not be understood, or arrived in the wrong state.
    #[display("protocol error: {_0}")]
    Protocol(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Metadata | Self::Thumbnail)
    }
}
