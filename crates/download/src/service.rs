//! Collaborators the daemon calls out to.

use crate::error::Result;
use async_trait::async_trait;
use ferry_naming::{FileKind, MetadataBundle};
use std::path::Path;

/// Reads capture metadata from a downloaded file.
///
/// Only consulted for file requests that do not carry their metadata inline.
#[async_trait]
pub trait MetadataLoader: Send + Sync {
    async fn load(&self, path: &Path, kind: FileKind) -> Result<MetadataBundle>;
}

/// Creates thumbnails for files once they are in place.
///
/// Failures are logged and never change the outcome of a download.
#[async_trait]
pub trait ThumbnailService: Send + Sync {
    async fn placed(&self, path: &Path, kind: FileKind) -> Result<()>;
}
