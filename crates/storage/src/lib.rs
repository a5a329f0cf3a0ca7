//! Moving downloaded files into their final place.
//!
//! [`Relocator`] takes a temp file plus the generated subfolder and name, and
//! puts it (and its sidecars) in the download folder without ever
//! overwriting an existing file. File system access goes through a
//! [`StorageBackend`].

pub mod backend;
pub mod error;
mod models;
mod path;
mod relocate;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::{validate as validate_path, validate_file_name};
pub use crate::relocate::{
    ConflictResolution, PlacedSidecar, Placement, Relocation, Relocator, Sidecar, SidecarFailure, SidecarKind,
};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
