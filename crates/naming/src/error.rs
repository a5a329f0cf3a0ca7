//! Naming Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Generation itself never fails: missing data degrades to empty strings and
//! is reported through [`Problems`](crate::Problems). These errors cover the
//! preference side of things, where a bad token list should be rejected
//! before any file is named with it.

use crate::token::{ListKind, NameContext};
use derive_more::{Display, Error};

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A preference triple names a category, field or subfield that does not exist.
    #[display("unknown token: {_0}")]
    UnknownToken(#[error(not(source))] String),
    /// The token exists, but may not be used in this context.
    #[display("token `{token}` at position {position} is not allowed in a {context}")]
    InvalidToken { position: usize, token: String, context: NameContext },
    /// A filename list was supplied where a subfolder list was expected (or vice versa).
    #[display("{found} token list supplied where a {expected} list is required")]
    InvalidTokenList { expected: ListKind, found: ListKind },
    /// The start of the day could not be interpreted as a time of day.
    #[display("invalid start of day: {_0}")]
    InvalidDayStart(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::UnknownToken("Colour".to_string()).to_string(), "unknown token: Colour");
        let kind = ErrorKind::InvalidTokenList {
            expected: ListKind::Subfolder,
            found: ListKind::Filename,
        };
        assert_eq!(kind.to_string(), "filename token list supplied where a subfolder list is required");
    }
}
