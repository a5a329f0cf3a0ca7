//! Local filesystem storage backend.
//!
//! Uses `tokio::fs` for async I/O. A rename between file systems falls back
//! to copying the file and deleting the original.

use crate::error::{ErrorKind, Result};
use crate::{FileInfo, StorageBackend};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use ferry_storage::backend::{LocalBackend, StorageBackend};
/// use std::path::Path;
///
/// # async fn example() -> ferry_storage::error::Result<()> {
/// let backend = LocalBackend::new("local");
/// backend.create_dir_all(Path::new("/home/me/Pictures/2024")).await?;
/// backend.rename(Path::new("/tmp/ferry/IMG_0001.CR2"), Path::new("/home/me/Pictures/2024/IMG_0001.CR2")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
}
impl LocalBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem => {
                ErrorKind::PermissionDenied(path.to_path_buf())
            },
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path.to_path_buf()),
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
                ErrorKind::StorageFull(path.to_path_buf())
            },
            _ => ErrorKind::Io(e),
        }
    }

    /// Copies `from` to a new file at `to`, then removes `from`. A partial
    /// copy is removed again before the error is returned.
    async fn copy_then_delete(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::debug!(from = %from.display(), to = %to.display(), "Moving across file systems");
        let mut source = fs::File::open(from).await.map_err(|e| Self::map_io_error(e, from))?;
        let mut target = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(to)
            .await
            .map_err(|e| Self::map_io_error(e, to))?;
        let copied: std::io::Result<()> = async {
            tokio::io::copy(&mut source, &mut target).await?;
            target.sync_all().await
        }
        .await;
        if let Err(e) = copied {
            drop(target);
            if let Err(cleanup) = fs::remove_file(to).await {
                tracing::warn!(path = %to.display(), error = %cleanup, "Could not remove partial copy");
            }
            exn::bail!(Self::map_io_error(e, to));
        }
        if let Err(e) = fs::remove_file(from).await {
            tracing::warn!(path = %from.display(), error = %e, "Copied file, but could not remove the original");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(fs::try_exists(path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(fs::create_dir_all(path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        // Not atomic with the rename itself, but nothing else places files
        // into the destination while a session runs.
        if fs::try_exists(to).await.map_err(|e| Self::map_io_error(e, to))? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => self.copy_then_delete(from, to).await,
            Err(e) => {
                let path = match e.kind() {
                    std::io::ErrorKind::NotFound => from,
                    _ => to,
                };
                exn::bail!(Self::map_io_error(e, path))
            },
        }
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        Ok(fs::remove_file(path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let metadata = fs::metadata(path).await.map_err(|e| Self::map_io_error(e, path))?;
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileInfo::new(path, metadata.len(), modified))
    }
}
