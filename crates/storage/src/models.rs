use std::path::PathBuf;
use time::UtcDateTime;

/// What a backend knows about a file already on disk. Reported back when a
/// destination is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Bytes.
    pub size: u64,
    pub modified: UtcDateTime,
}

impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }
}
