//! Requests into, and responses out of, the daemon.
//!
//! Both are tagged by a `type` field:
//!
//! ```json
//! {"type":"session_started","day_start":"03:00","downloads_today":{"date":"2024-03-09","count":2},"stored_sequence_no":41}
//! {"type":"file","id":1,"source":"/tmp/ferry/a1b2.cr2","source_name":"IMG_0001.CR2","kind":"photo",...}
//! {"type":"session_finished"}
//! ```

use ferry_naming::{DownloadsToday, ExtensionCase, FileKind, MetadataBundle, Problem, Token};
use ferry_storage::{ConflictResolution, PlacedSidecar, Sidecar};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Time;

const DEFAULT_MAX_UNIQUE_IDENTIFIER: u32 = 100;

fn default_true() -> bool {
    true
}

fn default_max_unique_identifier() -> u32 {
    DEFAULT_MAX_UNIQUE_IDENTIFIER
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    SessionStarted(SessionStarted),
    File(Box<FileRequest>),
    SessionFinished,
    /// Stop once the current request has been handled.
    Terminate,
}

/// Opens a session, carrying the persisted counters and session-wide policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStarted {
    #[serde(with = "ferry_naming::day_start")]
    pub day_start: Time,
    pub downloads_today: DownloadsToday,
    pub stored_sequence_no: u32,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default)]
    pub synchronize_raw_jpeg: bool,
    #[serde(default = "default_true")]
    pub strip_characters: bool,
    #[serde(default = "default_max_unique_identifier")]
    pub max_unique_identifier: u32,
}

/// One downloaded file, waiting in its temp location to be named and moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRequest {
    /// Echoed back on the result.
    pub id: u64,
    /// `false` if copying from the device already failed; nothing is moved.
    #[serde(default = "default_true")]
    pub download_succeeded: bool,
    /// The temp file.
    pub source: PathBuf,
    /// The file's name on the device.
    pub source_name: String,
    pub kind: FileKind,
    pub download_folder: PathBuf,
    pub subfolder: Vec<Token>,
    pub name: Vec<Token>,
    /// When absent, the daemon asks its metadata loader.
    #[serde(default)]
    pub metadata: Option<MetadataBundle>,
    #[serde(default)]
    pub job_code: Option<String>,
    #[serde(default)]
    pub extension_case: ExtensionCase,
    /// Sidecars in their temp location. Extensions are as found on the
    /// device; they are cased to match the generated name.
    #[serde(default)]
    pub sidecars: Vec<Sidecar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    File(FileResult),
    Session(SessionResult),
    /// The request was malformed, or not valid in the daemon's state.
    Rejected { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Placed,
    PlacedWithWarning,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub id: u64,
    pub success: bool,
    pub status: DownloadStatus,
    /// Generated subfolder, relative to the download folder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_subfolder: Option<String>,
    /// Final name, including any unique identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidecars: Vec<PlacedSidecar>,
    pub problems: Vec<Problem>,
}

impl FileResult {
    pub(crate) fn failed(id: u64, problems: Vec<Problem>) -> Self {
        Self {
            id,
            success: false,
            status: DownloadStatus::Failed,
            destination_subfolder: None,
            destination_name: None,
            destination_path: None,
            sidecars: vec![],
            problems,
        }
    }
}

/// The counters to persist once a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub stored_sequence_no: u32,
    pub downloads_today: DownloadsToday,
    pub placed: u32,
    pub failed: u32,
}
