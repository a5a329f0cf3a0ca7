//! Storage backend trait and implementations.
//!
//! Placing a downloaded file only needs a handful of file system operations.
//! They live behind [`StorageBackend`] so the relocation engine can be
//! exercised against an in-memory backend that fails on demand.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{Failure, MockBackend};
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for storage backends.
///
/// Paths are absolute. Destination paths must be built from a download folder
/// and components checked by [`validate_path`](crate::validate_path) and
/// [`validate_file_name`](crate::validate_file_name).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ferry_storage::{backend::StorageBackend, error::Result};
///
/// async fn place_if_free(backend: &dyn StorageBackend, from: &Path, to: &Path) -> Result<bool> {
///     if backend.exists(to).await? {
///         return Ok(false);
///     }
///     backend.rename(from, to).await?;
///     Ok(true)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a directory and all of its parents. A directory that already
    /// exists (including one created concurrently) is not an error.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Move a file, never overwriting.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if
    /// `to` exists, and [`NotFound`](crate::error::ErrorKind::NotFound) if
    /// `from` does not.
    ///
    /// # Notes
    /// - The parent of `to` must already exist.
    /// - Moves across file systems are not atomic: the file is copied, and
    ///   the source removed afterwards. Failing to remove the source is logged
    ///   but not an error.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
