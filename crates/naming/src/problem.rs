//! Per-file problems.
//!
//! A problem is anything worth telling the user about a single file. Most
//! are recoverable and only downgrade the file's status to "downloaded with
//! warning"; the caller decides which ones are fatal.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Metadata could not be loaded, or a referenced value was absent.
    #[display("metadata unavailable")]
    MetadataUnavailable,
    /// A name references the job code, but none was supplied.
    #[display("no job code")]
    MissingJobCode,
    /// A name references the device's image number, but the file name has none.
    #[display("no image number")]
    MissingImageNumber,
    /// A matched sequence number was referenced without a matched value available.
    #[display("matched sequence number unavailable")]
    MatchedSequenceFallback,
    /// A subfolder begins or ends with a separator. Harmless.
    #[display("redundant subfolder separator")]
    RedundantSeparator,
    /// A token list is not valid for the file it was applied to.
    #[display("invalid naming preferences")]
    InvalidTokens,
    /// The generated subfolder and/or filename is empty.
    #[display("error generating name")]
    NameGenerationFailed,
    /// The destination exists and the conflict policy forbids adding an identifier.
    #[display("file already exists")]
    FileAlreadyExists,
    /// The destination existed, so a unique identifier was added to the name.
    #[display("unique identifier added")]
    UniqueIdentifierAdded,
    /// This exact file was already downloaded during the session.
    #[display("file already downloaded")]
    AlreadyDownloaded,
    /// The file could not be moved into place.
    #[display("filesystem error")]
    FilesystemError,
    /// A thumbnail, audio or metadata sidecar could not be moved.
    #[display("sidecar not moved")]
    SidecarMoveFailed,
    /// Same name as an earlier photo, but taken at a different time.
    #[display("same name, different capture time")]
    TimeMismatch,
}

impl ProblemKind {
    /// Notices are reported, but do not make a download "with warning".
    pub fn is_notice(&self) -> bool {
        matches!(self, ProblemKind::RedundantSeparator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub kind: ProblemKind,
    pub detail: String,
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Ordered accumulator of the problems met while processing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Problems(Vec<Problem>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ProblemKind, detail: impl Into<String>) {
        self.0.push(Problem { kind, detail: detail.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.0.iter()
    }

    pub fn contains(&self, kind: ProblemKind) -> bool {
        self.0.iter().any(|p| p.kind == kind)
    }

    /// Whether any problem (other than a notice) was recorded.
    pub fn has_warnings(&self) -> bool {
        self.0.iter().any(|p| !p.kind.is_notice())
    }

    pub fn into_vec(self) -> Vec<Problem> {
        self.0
    }
}

impl Extend<Problem> for Problems {
    fn extend<T: IntoIterator<Item = Problem>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
