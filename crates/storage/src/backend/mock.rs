//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// A failure the mock backend can be told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    PermissionDenied,
    StorageFull,
    Io,
}
impl Failure {
    fn error(&self, path: &Path) -> exn::Exn<ErrorKind> {
        let kind = match self {
            Failure::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            Failure::StorageFull => ErrorKind::StorageFull(path.to_path_buf()),
            Failure::Io => ErrorKind::Io(std::io::Error::other("injected failure")),
        };
        exn::Exn::from(kind)
    }
}

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Directories are
/// implicit. Operations touching a path registered with
/// [`fail_on`](Self::fail_on) fail with the given [`Failure`].
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, (UtcDateTime, Vec<u8>)>>,
    failures: HashMap<PathBuf, Failure>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path is relative. If test setup is wrong, then test
    /// should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = UtcDateTime::now();
        for (path, data) in files {
            let path = path.into();
            if !path.is_absolute() {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: relative path {}", path.display());
            }
            map.insert(path, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            failures: HashMap::new(),
        }
    }

    /// Make every operation on `path` fail.
    pub fn fail_on(mut self, path: impl Into<PathBuf>, failure: Failure) -> Self {
        self.failures.insert(path.into(), failure);
        self
    }

    /// Contents of a stored file, if it exists.
    pub async fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.storage.read().await.get(path.as_ref()).map(|(_, data)| data.clone())
    }

    /// All stored paths, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.storage.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn check(&self, path: &Path) -> Result<()> {
        match self.failures.get(path) {
            Some(failure) => Err(failure.error(path)),
            None => Ok(()),
        }
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.storage.read().await.contains_key(path))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check(path)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check(from)?;
        self.check(to)?;
        let mut guard = self.storage.write().await;
        if guard.contains_key(to) {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        let data = guard.remove(from).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(from.to_path_buf())))?;
        guard.insert(to.to_path_buf(), data);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        self.check(path)?;
        self.storage
            .write()
            .await
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.to_path_buf())))
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let guard = self.storage.read().await;
        let (inserted, data) =
            guard.get(path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.to_path_buf())))?;
        Ok(FileInfo::new(path, data.len() as u64, *inserted))
    }
}
