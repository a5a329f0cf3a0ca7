//! Layered configuration.
//!
//! Values are merged, later sources winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: the one passed explicitly, or `config.toml`
//!    (`.yaml`, `.yml`, `.json`) in the platform configuration directory.
//! 3. `FERRY_`-prefixed environment variables, nested keys split on `__`
//!    (e.g. `FERRY_PHOTO__DOWNLOAD_FOLDER=/mnt/photos`).
//!
//! ```toml
//! day_start = "04:00"
//! conflict_resolution = "skip"
//! synchronize_raw_jpeg = true
//!
//! [photo]
//! download_folder = "/home/me/Pictures"
//! subfolder = [["Date time", "Image date", "YYYY"], ["Separator", "", ""], ["Date time", "Image date", "YYYYMMDD"]]
//! name = [["Filename", "Name + extension", "Original Case"]]
//! ```
//!
//! Every token list is checked against its context's allow-list when the
//! configuration is loaded, so a bad list fails at startup rather than on
//! the first file.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::{ProjectDirs, UserDirs};
use exn::ResultExt;
use ferry_naming::{ExtensionCase, FileKind, ListKind, NameContext, Token, TokenConfig, TokenList, preset};
use ferry_storage::ConflictResolution;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::Time;

const ENV_PREFIX: &str = "FERRY_";
const CONFIG_FILES: [&str; 4] = ["config.toml", "config.yaml", "config.yml", "config.json"];

/// Where and how one kind of file is downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub download_folder: PathBuf,
    pub subfolder: Vec<Token>,
    pub name: Vec<Token>,
}

impl Profile {
    /// The user's pictures or videos folder, and the first built-in presets.
    fn default_for(kind: FileKind) -> Self {
        let first = |presets: Vec<preset::Preset>| {
            presets.into_iter().next().map(|preset| preset.tokens.tokens().to_vec()).unwrap_or_default()
        };
        Self {
            download_folder: default_download_folder(kind),
            subfolder: first(preset::subfolders(kind)),
            name: first(preset::names(kind)),
        }
    }

    pub fn subfolder_list(&self) -> TokenList {
        TokenList::subfolder(self.subfolder.iter().cloned())
    }

    pub fn name_list(&self) -> TokenList {
        TokenList::filename(self.name.iter().cloned())
    }

    fn validate(&self, kind: FileKind) -> Result<()> {
        if !self.download_folder.is_absolute() {
            exn::bail!(ErrorKind::Validation(format!(
                "{} download folder must be an absolute path, not {:?}",
                kind.as_str(),
                self.download_folder
            )));
        }
        for list in [self.subfolder_list(), self.name_list()] {
            let context = NameContext::new(kind, list.kind());
            TokenConfig::for_context(context)
                .validate(&list)
                .or_raise(|| ErrorKind::Validation(format!("{context} tokens")))?;
        }
        Ok(())
    }
}

fn default_download_folder(kind: FileKind) -> PathBuf {
    let Some(dirs) = UserDirs::new() else {
        return PathBuf::new();
    };
    let (special, fallback) = match kind {
        FileKind::Photo => (dirs.picture_dir(), "Pictures"),
        FileKind::Video => (dirs.video_dir(), "Videos"),
    };
    special.map_or_else(|| dirs.home_dir().join(fallback), Path::to_path_buf)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// When a new day starts for the downloads-today counter, as `HH:MM`.
    pub day_start: String,
    pub conflict_resolution: ConflictResolution,
    pub synchronize_raw_jpeg: bool,
    /// Strip characters that Windows and FAT file systems reject.
    pub strip_characters: bool,
    pub extension_case: ExtensionCase,
    pub job_code: Option<String>,
    /// Highest unique identifier tried before giving up on a file.
    pub max_unique_identifier: u32,
    pub photo: Profile,
    pub video: Profile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            day_start: "03:00".to_string(),
            conflict_resolution: ConflictResolution::default(),
            synchronize_raw_jpeg: false,
            strip_characters: true,
            extension_case: ExtensionCase::default(),
            job_code: None,
            max_unique_identifier: 100,
            photo: Profile::default_for(FileKind::Photo),
            video: Profile::default_for(FileKind::Video),
        }
    }
}

impl Config {
    /// Loads and validates the configuration.
    ///
    /// With `path`, that file must exist. Without, the default location is
    /// used if a file is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// The merged sources, before extraction.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_file(),
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Reading configuration file");
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<()> {
        self.day_start()?;
        if self.max_unique_identifier == 0 {
            exn::bail!(ErrorKind::Validation("max_unique_identifier must be at least 1".to_string()));
        }
        self.photo.validate(FileKind::Photo)?;
        self.video.validate(FileKind::Video)?;
        Ok(())
    }

    pub fn day_start(&self) -> Result<Time> {
        ferry_naming::parse_day_start(&self.day_start).or_raise(|| ErrorKind::Validation("day_start".to_string()))
    }

    pub fn profile(&self, kind: FileKind) -> &Profile {
        match kind {
            FileKind::Photo => &self.photo,
            FileKind::Video => &self.video,
        }
    }

    /// Index of the built-in preset a profile's list matches, if any.
    pub fn preset_index(&self, kind: FileKind, list: ListKind) -> Option<usize> {
        let profile = self.profile(kind);
        let tokens = match list {
            ListKind::Filename => profile.name_list(),
            ListKind::Subfolder => profile.subfolder_list(),
        };
        preset::find_preset(&tokens, &preset::for_list(kind, list))
    }
}

/// The first configuration file found in the platform configuration directory.
pub fn default_file() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "ferry")?;
    CONFIG_FILES.iter().map(|name| dirs.config_dir().join(name)).find(|path| path.is_file())
}
