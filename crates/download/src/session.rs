//! One download session.
//!
//! A [`Session`] owns everything that must only change one file at a time:
//! the sequence counters, the pairing tracker and the relocator with its
//! unique-identifier counters. Each file goes through:
//!
//! 1. Token list validation for the file's kind.
//! 2. RAW+JPEG pairing (photos, when enabled).
//! 3. Subfolder and name generation.
//! 4. Placement, including sidecars.
//! 5. Counter updates, only if the file was placed.
//!
//! Whatever goes wrong ends up as a [`Problem`](ferry_naming::Problem) on the
//! [`FileResult`]. Nothing that happens to one file ends the session.

use crate::message::{DownloadStatus, FileRequest, FileResult, SessionResult, SessionStarted};
use crate::pairing::{CaptureTime, PairStatus, PairingTracker, split_base_name};
use ferry_naming::{
    FileContext, FileKind, MetadataBundle, NameContext, ProblemKind, Problems, SequenceKind, SequenceState,
    TokenConfig, TokenList, generate,
};
use ferry_storage::error::ErrorKind as StorageErrorKind;
use ferry_storage::{BackendHandle, ConflictResolution, Relocation, Relocator, Sidecar};
use std::ops::Deref;
use time::PrimitiveDateTime;
use tracing::instrument;

pub struct Session {
    sequences: SequenceState,
    pairing: PairingTracker,
    relocator: Relocator,
    conflict_resolution: ConflictResolution,
    synchronize_raw_jpeg: bool,
    strip_characters: bool,
    placed: u32,
    failed: u32,
}

impl Session {
    /// Restores the persisted counters, rolling `downloads_today` over if a
    /// new day has started since they were saved.
    pub fn start(request: &SessionStarted, backend: BackendHandle, now: PrimitiveDateTime) -> Self {
        let mut sequences = SequenceState::new(request.downloads_today, request.stored_sequence_no);
        sequences.roll_downloads_today(now, request.day_start);
        Self {
            sequences,
            pairing: PairingTracker::new(),
            relocator: Relocator::new(backend, request.conflict_resolution, request.max_unique_identifier),
            conflict_resolution: request.conflict_resolution,
            synchronize_raw_jpeg: request.synchronize_raw_jpeg,
            strip_characters: request.strip_characters,
            placed: 0,
            failed: 0,
        }
    }

    pub fn sequences(&self) -> &SequenceState {
        &self.sequences
    }

    pub fn pairing(&self) -> &PairingTracker {
        &self.pairing
    }

    /// The counters to hand back for persisting.
    pub fn finish(self) -> SessionResult {
        SessionResult {
            stored_sequence_no: self.sequences.stored_sequence_no(),
            downloads_today: self.sequences.downloads_today(),
            placed: self.placed,
            failed: self.failed,
        }
    }

    /// Names and places one file.
    ///
    /// `metadata` is `None` when it could not be loaded; generation then
    /// carries on with empty values.
    #[instrument(skip_all, fields(id = request.id, source = %request.source_name))]
    pub async fn process(
        &mut self,
        request: &FileRequest,
        metadata: Option<&MetadataBundle>,
        download_time: PrimitiveDateTime,
    ) -> FileResult {
        let result = self.process_inner(request, metadata, download_time).await;
        // A matched value belongs to exactly one file.
        self.sequences.consume_matched();
        match result.success {
            true => self.placed = self.placed.saturating_add(1),
            false => self.failed = self.failed.saturating_add(1),
        }
        result
    }

    async fn process_inner(
        &mut self,
        request: &FileRequest,
        metadata: Option<&MetadataBundle>,
        download_time: PrimitiveDateTime,
    ) -> FileResult {
        let mut problems = Problems::new();
        if !request.download_succeeded {
            tracing::debug!("File was not downloaded; nothing to place");
            problems.push(
                ProblemKind::FilesystemError,
                format!("{} was not downloaded from the device", request.source_name),
            );
            return FileResult::failed(request.id, problems.into_vec());
        }

        let subfolder_list = TokenList::subfolder(request.subfolder.iter().cloned());
        let name_list = TokenList::filename(request.name.iter().cloned());
        for list in [&subfolder_list, &name_list] {
            let config = TokenConfig::for_context(NameContext::new(request.kind, list.kind()));
            if let Err(e) = config.validate(list) {
                problems.push(ProblemKind::InvalidTokens, e.deref().to_string());
                return self.fail(request, problems).await;
            }
        }

        if metadata.is_none() {
            problems.push(
                ProblemKind::MetadataUnavailable,
                format!("could not read metadata from {}", request.source_name),
            );
        }

        let (base_name, extension) = split_base_name(&request.source_name);
        let capture = match (request.kind, self.synchronize_raw_jpeg) {
            (FileKind::Photo, true) => metadata.and_then(CaptureTime::from_metadata),
            _ => None,
        };
        if self.synchronize_raw_jpeg && request.kind == FileKind::Photo && capture.is_none() {
            tracing::debug!("No capture time; photo cannot be paired");
        }
        // Set when this photo is named with the sequence values of an earlier one.
        let mut reused = false;
        if let Some(capture) = &capture {
            match self.pairing.check(base_name, extension, capture) {
                PairStatus::NoMatch => self.sequences.set_matched(self.sequences.current()),
                PairStatus::MatchingPair(values) => {
                    tracing::debug!(session = values.session, "Matched RAW+JPEG pair");
                    self.sequences.set_matched(values);
                    reused = true;
                },
                PairStatus::AlreadyDownloaded(values) => match self.conflict_resolution {
                    ConflictResolution::Skip => {
                        problems.push(
                            ProblemKind::AlreadyDownloaded,
                            format!("{} was already downloaded in this session", request.source_name),
                        );
                        return self.fail(request, problems).await;
                    },
                    ConflictResolution::AddIdentifier => {
                        self.sequences.set_matched(values);
                        reused = true;
                    },
                },
                PairStatus::TimeMismatch { extension: earlier_extension, capture: earlier } => {
                    tracing::warn!(%earlier, current = %capture, "Photos share a name but were taken at different times");
                    problems.push(
                        ProblemKind::TimeMismatch,
                        format!(
                            "{base_name}{earlier_extension} was taken at {earlier}, but {} was taken at {capture}",
                            request.source_name
                        ),
                    );
                    self.sequences.set_matched(self.sequences.current());
                },
            }
        }

        let ctx = FileContext {
            source_name: &request.source_name,
            kind: request.kind,
            metadata,
            job_code: request.job_code.as_deref(),
            extension_case: request.extension_case,
            strip_characters: self.strip_characters,
            sequences: &self.sequences,
            download_time,
        };
        let subfolder = generate(&subfolder_list, &ctx, &mut problems);
        let name = generate(&name_list, &ctx, &mut problems);
        let empty = match (subfolder.is_empty(), name.is_empty()) {
            (true, true) => Some("subfolder and filename"),
            (true, false) => Some("subfolder"),
            (false, true) => Some("filename"),
            (false, false) => None,
        };
        if let Some(empty) = empty {
            problems.push(
                ProblemKind::NameGenerationFailed,
                format!("the generated {empty} for {} is empty", request.source_name),
            );
            return self.fail(request, problems).await;
        }
        tracing::debug!(subfolder = %subfolder.value, name = %name.value, "Generated destination");

        let primary_extension = name.value.rsplit_once('.').map_or("", |(_, extension)| extension);
        let relocation = Relocation {
            source: request.source.clone(),
            download_folder: request.download_folder.clone(),
            subfolder: subfolder.value,
            name: name.value.clone(),
            sidecars: request
                .sidecars
                .iter()
                .map(|sidecar| Sidecar {
                    kind: sidecar.kind,
                    source: sidecar.source.clone(),
                    extension: request.extension_case.sidecar_extension(&sidecar.extension, primary_extension),
                })
                .collect(),
        };
        let placement = match self.relocator.place(&relocation).await {
            Ok(placement) => placement,
            Err(e) => {
                let (kind, detail) = placement_problem(&e, &relocation);
                problems.push(kind, detail);
                return self.fail(request, problems).await;
            },
        };

        if let Some(identifier) = placement.identifier {
            problems.push(
                ProblemKind::UniqueIdentifierAdded,
                format!("{} already existed, so identifier {identifier} was added: {}", name.value, placement.name),
            );
        }
        for failure in &placement.sidecar_failures {
            problems.push(
                ProblemKind::SidecarMoveFailed,
                format!(
                    "{} file {} could not be moved to {}: {}",
                    failure.kind,
                    failure.source.display(),
                    failure.destination.display(),
                    failure.reason
                ),
            );
        }

        if let Some(capture) = capture {
            self.pairing.record(base_name, extension, capture, self.sequences.values());
        }
        if !reused {
            let uses = |kind| name_list.uses_sequence(kind) || subfolder_list.uses_sequence(kind);
            // Matched numbers are drawn from the session number.
            let advances_session = uses(SequenceKind::Session) || uses(SequenceKind::Matched);
            self.sequences.increment(advances_session, uses(SequenceKind::Letter));
            self.sequences.bump_stored(uses(SequenceKind::Stored));
            self.sequences.increment_downloads_today();
        }

        let status = match problems.has_warnings() {
            true => DownloadStatus::PlacedWithWarning,
            false => DownloadStatus::Placed,
        };
        let path = placement.path();
        tracing::debug!(path = %path.display(), ?status, "Placed file");
        FileResult {
            id: request.id,
            success: true,
            status,
            destination_subfolder: Some(placement.subfolder.to_string_lossy().into_owned()),
            destination_name: Some(placement.name),
            destination_path: Some(path),
            sidecars: placement.sidecars,
            problems: problems.into_vec(),
        }
    }

    /// Gives up on a file. The temp file is removed, since nothing else will.
    async fn fail(&self, request: &FileRequest, problems: Problems) -> FileResult {
        let summary: Vec<String> = problems.iter().map(ToString::to_string).collect();
        tracing::error!(problems = %summary.join("; "), "Could not place file");
        match self.relocator.backend().delete(&request.source).await {
            Ok(()) => {},
            Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => {},
            Err(e) => {
                tracing::warn!(path = %request.source.display(), error = %e.deref(), "Could not remove temp file");
            },
        }
        FileResult::failed(request.id, problems.into_vec())
    }
}

fn placement_problem(error: &StorageErrorKind, relocation: &Relocation) -> (ProblemKind, String) {
    let destination = relocation.download_folder.join(&relocation.subfolder).join(&relocation.name);
    match error {
        StorageErrorKind::Conflict { path, modified: Some(modified) } => (
            ProblemKind::FileAlreadyExists,
            format!("{} already exists (last modified {modified})", path.display()),
        ),
        StorageErrorKind::Conflict { path, modified: None } => {
            (ProblemKind::FileAlreadyExists, format!("{} already exists", path.display()))
        },
        StorageErrorKind::IdentifiersExhausted { path, attempts } => (
            ProblemKind::FileAlreadyExists,
            format!("{} already exists, and so do all {attempts} alternatives", path.display()),
        ),
        StorageErrorKind::InvalidPath(path) => (
            ProblemKind::NameGenerationFailed,
            format!("{} is not a valid destination", path.display()),
        ),
        other => (
            ProblemKind::FilesystemError,
            format!("could not move {} to {}: {other}", relocation.source.display(), destination.display()),
        ),
    }
}
