//! The relocation engine.
//!
//! Moves a downloaded temp file to its generated destination, then moves its
//! sidecars next to it:
//!
//! ```text
//! /tmp/ferry/a1b2.cr2  ->  ~/Pictures/2024/20240309/IMG_0001.CR2
//! /tmp/ferry/a1b2.thm  ->  ~/Pictures/2024/20240309/IMG_0001.thm
//! ```
//!
//! When the destination is taken, the [`ConflictResolution`] policy either
//! gives up on the file, or appends `_1`, `_2`, ... to the stem until a free
//! name is found. Sidecars always follow the *final* name.

use crate::BackendHandle;
use crate::error::{ErrorKind, Result};
use crate::path::{validate as validate_path, validate_file_name};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// What to do when a file's destination already exists.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Leave the file where it is and report it.
    #[display("skip")]
    Skip,
    /// Append a unique identifier to the name.
    #[default]
    #[display("add unique identifier")]
    AddIdentifier,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarKind {
    #[display("thumbnail")]
    Thumbnail,
    #[display("audio")]
    Audio,
    #[display("XMP")]
    Xmp,
}

/// A secondary file that travels with the primary one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub kind: SidecarKind,
    pub source: PathBuf,
    /// Extension for the moved sidecar, including the dot (e.g. `.THM`).
    pub extension: String,
}

/// Where one file (and its sidecars) should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// The downloaded temp file.
    pub source: PathBuf,
    pub download_folder: PathBuf,
    /// Generated subfolder, relative to `download_folder`. May be empty.
    pub subfolder: String,
    /// Generated file name.
    pub name: String,
    pub sidecars: Vec<Sidecar>,
}

impl Relocation {
    /// The validated subfolder, normalised (`2024/../0309` is `0309`). Empty
    /// when files go straight into the download folder.
    pub fn subfolder_path(&self) -> Result<PathBuf> {
        match self.subfolder.is_empty() {
            true => Ok(PathBuf::new()),
            false => validate_path(&self.subfolder),
        }
    }

    /// The validated destination folder.
    pub fn destination_folder(&self) -> Result<PathBuf> {
        Ok(self.download_folder.join(self.subfolder_path()?))
    }

    /// The validated destination, before any identifier is added.
    pub fn destination(&self) -> Result<PathBuf> {
        Ok(self.destination_folder()?.join(validate_file_name(&self.name)?))
    }
}

/// A sidecar that was moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedSidecar {
    pub kind: SidecarKind,
    pub path: PathBuf,
}

/// A sidecar that could not be moved. The primary placement still stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarFailure {
    pub kind: SidecarKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub reason: String,
}

/// The outcome of (successfully) placing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub folder: PathBuf,
    /// `folder`, relative to the download folder.
    pub subfolder: PathBuf,
    /// Final file name, including any identifier.
    pub name: String,
    /// The unique identifier that had to be added to the name, if any.
    pub identifier: Option<u32>,
    pub sidecars: Vec<PlacedSidecar>,
    pub sidecar_failures: Vec<SidecarFailure>,
}

impl Placement {
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.name)
    }
}

/// Splits a name into its stem and its extension (including the dot).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

/// Places files for one session.
///
/// Remembers the last identifier handed out for each destination, so a
/// name that keeps colliding does not re-probe identifiers it has already
/// used.
pub struct Relocator {
    backend: BackendHandle,
    policy: ConflictResolution,
    max_identifier: u32,
    identifiers: HashMap<PathBuf, u32>,
}

impl Relocator {
    pub fn new(backend: BackendHandle, policy: ConflictResolution, max_identifier: u32) -> Self {
        Self {
            backend,
            policy,
            max_identifier,
            identifiers: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Moves a file into place.
    ///
    /// # Errors
    /// - [`ErrorKind::InvalidPath`] if the generated subfolder or name is unusable.
    /// - [`ErrorKind::Conflict`] if the destination exists and the policy is
    ///   [`ConflictResolution::Skip`].
    /// - [`ErrorKind::IdentifiersExhausted`] if no free name was found.
    /// - Any backend error from creating the folder or moving the file. The
    ///   temp file is left where it was.
    #[instrument(skip_all, fields(source = %relocation.source.display(), name = %relocation.name))]
    pub async fn place(&mut self, relocation: &Relocation) -> Result<Placement> {
        let subfolder = relocation.subfolder_path()?;
        let folder = relocation.download_folder.join(&subfolder);
        let destination = relocation.destination()?;
        self.backend.create_dir_all(&folder).await?;

        tracing::debug!(backend = self.backend.name(), destination = %destination.display(), "Moving file");
        let (name, identifier) = match self.backend.rename(&relocation.source, &destination).await {
            Ok(()) => (relocation.name.clone(), None),
            Err(e) if matches!(e.deref(), ErrorKind::AlreadyExists(_)) => match self.policy {
                ConflictResolution::Skip => {
                    let modified = self.backend.stat(&destination).await.ok().map(|info| info.modified);
                    return Err(e.raise(ErrorKind::Conflict { path: destination, modified }));
                },
                ConflictResolution::AddIdentifier => {
                    self.place_with_identifier(&relocation.source, &folder, &relocation.name, &destination).await?
                },
            },
            Err(e) => return Err(e),
        };

        let (stem, _) = split_extension(&name);
        let mut sidecars = Vec::new();
        let mut sidecar_failures = Vec::new();
        for sidecar in &relocation.sidecars {
            let target = folder.join(format!("{stem}{}", sidecar.extension));
            match self.backend.rename(&sidecar.source, &target).await {
                Ok(()) => sidecars.push(PlacedSidecar { kind: sidecar.kind, path: target }),
                Err(e) => {
                    let reason = e.deref().to_string();
                    tracing::warn!(kind = %sidecar.kind, source = %sidecar.source.display(), %reason, "Could not move sidecar");
                    sidecar_failures.push(SidecarFailure {
                        kind: sidecar.kind,
                        source: sidecar.source.clone(),
                        destination: target,
                        reason,
                    });
                },
            }
        }

        Ok(Placement { folder, subfolder, name, identifier, sidecars, sidecar_failures })
    }

    async fn place_with_identifier(
        &mut self,
        source: &Path,
        folder: &Path,
        name: &str,
        original: &Path,
    ) -> Result<(String, Option<u32>)> {
        let (stem, extension) = split_extension(name);
        let mut identifier = self.identifiers.get(original).copied().unwrap_or(0);
        loop {
            if identifier >= self.max_identifier {
                exn::bail!(ErrorKind::IdentifiersExhausted {
                    path: original.to_path_buf(),
                    attempts: self.max_identifier,
                });
            }
            identifier += 1;
            self.identifiers.insert(original.to_path_buf(), identifier);
            let candidate = format!("{stem}_{identifier}{extension}");
            let path = folder.join(&candidate);
            match self.backend.rename(source, &path).await {
                Ok(()) => {
                    tracing::warn!(original = %original.display(), name = %candidate, "Destination existed; unique identifier added");
                    return Ok((candidate, Some(identifier)));
                },
                Err(e) if matches!(e.deref(), ErrorKind::AlreadyExists(_)) => {
                    tracing::debug!(path = %path.display(), "Destination with identifier also exists");
                },
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Failure, LocalBackend, MockBackend, StorageBackend};
    use rstest::rstest;
    use std::sync::Arc;

    fn relocation(source: &str, subfolder: &str, name: &str) -> Relocation {
        Relocation {
            source: PathBuf::from(source),
            download_folder: PathBuf::from("/dest"),
            subfolder: subfolder.to_string(),
            name: name.to_string(),
            sidecars: vec![],
        }
    }

    fn relocator(backend: MockBackend, policy: ConflictResolution) -> (Arc<MockBackend>, Relocator) {
        let backend = Arc::new(backend);
        (backend.clone(), Relocator::new(backend, policy, 100))
    }

    #[rstest]
    #[case("IMG_0001.JPG", ("IMG_0001", ".JPG"))]
    #[case("archive.tar.gz", ("archive.tar", ".gz"))]
    #[case("README", ("README", ""))]
    #[case(".hidden", (".hidden", ""))]
    fn test_split_extension(#[case] name: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_extension(name), expected);
    }

    #[tokio::test]
    async fn test_place() {
        let (backend, mut relocator) =
            relocator(MockBackend::with_files([("/tmp/a.jpg", Vec::from(*b"a"))]), ConflictResolution::AddIdentifier);
        let placement = relocator.place(&relocation("/tmp/a.jpg", "2024/20240309", "IMG_0001.JPG")).await.unwrap();
        assert_eq!(placement.path(), Path::new("/dest/2024/20240309/IMG_0001.JPG"));
        assert_eq!(placement.identifier, None);
        assert_eq!(backend.paths().await, [PathBuf::from("/dest/2024/20240309/IMG_0001.JPG")]);
    }

    #[rstest]
    #[case("2024/../20240309/", "20240309")]
    #[case("2024/./03", "2024/03")]
    #[case("", "")]
    #[tokio::test]
    async fn test_placement_reports_normalised_subfolder(#[case] subfolder: &str, #[case] expected: &str) {
        let (_, mut relocator) =
            relocator(MockBackend::with_files([("/tmp/a.jpg", Vec::from(*b"a"))]), ConflictResolution::AddIdentifier);
        let placement = relocator.place(&relocation("/tmp/a.jpg", subfolder, "IMG_0001.JPG")).await.unwrap();
        assert_eq!(placement.subfolder, Path::new(expected));
        assert_eq!(placement.folder, Path::new("/dest").join(expected));
    }

    #[tokio::test]
    async fn test_existing_destination_gets_identifier() {
        let (backend, mut relocator) = relocator(
            MockBackend::with_files([("/tmp/a.jpg", Vec::from(*b"new")), ("/dest/IMG_0001.JPG", Vec::from(*b"old"))]),
            ConflictResolution::AddIdentifier,
        );
        let placement = relocator.place(&relocation("/tmp/a.jpg", "", "IMG_0001.JPG")).await.unwrap();
        assert_eq!(placement.name, "IMG_0001_1.JPG");
        assert_eq!(placement.identifier, Some(1));
        assert_eq!(backend.contents("/dest/IMG_0001.JPG").await.unwrap(), b"old");
        assert_eq!(backend.contents("/dest/IMG_0001_1.JPG").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_identifiers_increase_per_destination() {
        let (_, mut relocator) = relocator(
            MockBackend::with_files([
                ("/tmp/a.jpg", Vec::from(*b"a")),
                ("/tmp/b.jpg", Vec::from(*b"b")),
                ("/tmp/c.jpg", Vec::from(*b"c")),
                ("/tmp/d.jpg", Vec::from(*b"d")),
            ]),
            ConflictResolution::AddIdentifier,
        );
        let mut names = vec![];
        for source in ["/tmp/a.jpg", "/tmp/b.jpg", "/tmp/c.jpg"] {
            names.push(relocator.place(&relocation(source, "", "IMG.JPG")).await.unwrap().name);
        }
        assert_eq!(names, ["IMG.JPG", "IMG_1.JPG", "IMG_2.JPG"]);
        // A different destination has its own counter.
        let other = relocator.place(&relocation("/tmp/d.jpg", "other", "IMG.JPG")).await.unwrap();
        assert_eq!(other.name, "IMG.JPG");
    }

    #[tokio::test]
    async fn test_identifier_skips_names_taken_on_disk() {
        let (_, mut relocator) = relocator(
            MockBackend::with_files([
                ("/tmp/a.jpg", Vec::from(*b"a")),
                ("/dest/IMG.JPG", Vec::from(*b"x")),
                ("/dest/IMG_1.JPG", Vec::from(*b"y")),
            ]),
            ConflictResolution::AddIdentifier,
        );
        let placement = relocator.place(&relocation("/tmp/a.jpg", "", "IMG.JPG")).await.unwrap();
        assert_eq!(placement.name, "IMG_2.JPG");
    }

    #[tokio::test]
    async fn test_identifiers_exhausted() {
        let backend = Arc::new(MockBackend::with_files([
            ("/tmp/a.jpg", Vec::from(*b"a")),
            ("/dest/IMG.JPG", Vec::from(*b"x")),
            ("/dest/IMG_1.JPG", Vec::from(*b"y")),
            ("/dest/IMG_2.JPG", Vec::from(*b"z")),
        ]));
        let mut relocator = Relocator::new(backend.clone(), ConflictResolution::AddIdentifier, 2);
        let err = relocator.place(&relocation("/tmp/a.jpg", "", "IMG.JPG")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::IdentifiersExhausted { attempts: 2, .. }));
        assert!(backend.exists(Path::new("/tmp/a.jpg")).await.unwrap());
    }

    #[tokio::test]
    async fn test_skip_policy_reports_conflict() {
        let (backend, mut relocator) = relocator(
            MockBackend::with_files([("/tmp/a.jpg", Vec::from(*b"new")), ("/dest/IMG.JPG", Vec::from(*b"old"))]),
            ConflictResolution::Skip,
        );
        let err = relocator.place(&relocation("/tmp/a.jpg", "", "IMG.JPG")).await.unwrap_err();
        match &*err {
            ErrorKind::Conflict { path, modified } => {
                assert_eq!(path, Path::new("/dest/IMG.JPG"));
                assert!(modified.is_some());
            },
            other => panic!("unexpected error: {other}"),
        }
        assert!(backend.exists(Path::new("/tmp/a.jpg")).await.unwrap());
    }

    #[rstest]
    #[case("../escape", "IMG.JPG")]
    #[case("/abs", "IMG.JPG")]
    #[case("2024", "a/IMG.JPG")]
    #[case("2024", "")]
    #[tokio::test]
    async fn test_invalid_destination(#[case] subfolder: &str, #[case] name: &str) {
        let (backend, mut relocator) =
            relocator(MockBackend::with_files([("/tmp/a.jpg", Vec::from(*b"a"))]), ConflictResolution::AddIdentifier);
        let err = relocator.place(&relocation("/tmp/a.jpg", subfolder, name)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert_eq!(backend.paths().await, [PathBuf::from("/tmp/a.jpg")]);
    }

    #[rstest]
    #[case(Failure::PermissionDenied)]
    #[case(Failure::StorageFull)]
    #[case(Failure::Io)]
    #[tokio::test]
    async fn test_filesystem_errors_leave_temp_file(#[case] failure: Failure) {
        let (backend, mut relocator) = relocator(
            MockBackend::with_files([("/tmp/a.jpg", Vec::from(*b"a"))]).fail_on("/dest/IMG.JPG", failure),
            ConflictResolution::AddIdentifier,
        );
        let err = relocator.place(&relocation("/tmp/a.jpg", "", "IMG.JPG")).await.unwrap_err();
        assert!(!err.is_conflict());
        assert!(backend.exists(Path::new("/tmp/a.jpg")).await.unwrap());
    }

    #[tokio::test]
    async fn test_sidecars_follow_final_name() {
        let (backend, mut relocator) = relocator(
            MockBackend::with_files([
                ("/tmp/a.cr2", Vec::from(*b"raw")),
                ("/tmp/a.thm", Vec::from(*b"thumb")),
                ("/tmp/a.wav", Vec::from(*b"audio")),
                ("/dest/IMG_0001.CR2", Vec::from(*b"old")),
            ])
            .fail_on("/tmp/a.wav", Failure::PermissionDenied),
            ConflictResolution::AddIdentifier,
        );
        let mut request = relocation("/tmp/a.cr2", "", "IMG_0001.CR2");
        request.sidecars = vec![
            Sidecar {
                kind: SidecarKind::Thumbnail,
                source: PathBuf::from("/tmp/a.thm"),
                extension: ".THM".to_string(),
            },
            Sidecar {
                kind: SidecarKind::Audio,
                source: PathBuf::from("/tmp/a.wav"),
                extension: ".WAV".to_string(),
            },
        ];
        let placement = relocator.place(&request).await.unwrap();
        assert_eq!(placement.name, "IMG_0001_1.CR2");
        assert_eq!(
            placement.sidecars,
            [PlacedSidecar {
                kind: SidecarKind::Thumbnail,
                path: PathBuf::from("/dest/IMG_0001_1.THM"),
            }]
        );
        assert_eq!(placement.sidecar_failures.len(), 1);
        assert_eq!(placement.sidecar_failures[0].kind, SidecarKind::Audio);
        assert_eq!(placement.sidecar_failures[0].destination, Path::new("/dest/IMG_0001_1.WAV"));
        assert_eq!(backend.contents("/dest/IMG_0001_1.THM").await.unwrap(), b"thumb");
    }

    #[tokio::test]
    async fn test_local_backend_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("tmp");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&temp).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("IMG_0001.JPG"), b"existing").unwrap();
        std::fs::write(temp.join("a1b2.jpg"), b"downloaded").unwrap();

        let mut relocator = Relocator::new(Arc::new(LocalBackend::new("local")), ConflictResolution::AddIdentifier, 100);
        let placement = relocator
            .place(&Relocation {
                source: temp.join("a1b2.jpg"),
                download_folder: dest.clone(),
                subfolder: String::new(),
                name: "IMG_0001.JPG".to_string(),
                sidecars: vec![],
            })
            .await
            .unwrap();
        assert_eq!(placement.path(), dest.join("IMG_0001_1.JPG"));
        assert_eq!(std::fs::read(dest.join("IMG_0001_1.JPG")).unwrap(), b"downloaded");
        assert_eq!(std::fs::read(dest.join("IMG_0001.JPG")).unwrap(), b"existing");
    }
}
