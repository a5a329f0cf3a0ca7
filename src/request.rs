//! Decoding request lines, with configured values standing in for fields a
//! request leaves out.

use ferry_config::Config;
use ferry_download::Request;
use ferry_download::error::{Error, ErrorKind};
use ferry_naming::FileKind;
use serde_json::{Map, Value, json};

pub struct RequestDecoder {
    config: Config,
}

impl RequestDecoder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Parses one line. Anything that is not a well-formed request becomes
    /// [`ErrorKind::Protocol`].
    pub fn decode(&self, line: &str) -> Result<Request, Error> {
        let mut value: Value = serde_json::from_str(line).map_err(protocol)?;
        if let Some(object) = value.as_object_mut() {
            match object.get("type").and_then(Value::as_str) {
                Some("session_started") => fill(object, self.session_defaults()),
                Some("file") => {
                    let kind = object.get("kind").cloned().and_then(|k| serde_json::from_value::<FileKind>(k).ok());
                    if let Some(kind) = kind {
                        fill(object, self.file_defaults(kind));
                    }
                },
                _ => {},
            }
        }
        serde_json::from_value(value).map_err(protocol)
    }

    fn session_defaults(&self) -> Value {
        json!({
            "day_start": self.config.day_start,
            "conflict_resolution": self.config.conflict_resolution,
            "synchronize_raw_jpeg": self.config.synchronize_raw_jpeg,
            "strip_characters": self.config.strip_characters,
            "max_unique_identifier": self.config.max_unique_identifier,
        })
    }

    fn file_defaults(&self, kind: FileKind) -> Value {
        let profile = self.config.profile(kind);
        json!({
            "download_folder": profile.download_folder,
            "subfolder": profile.subfolder,
            "name": profile.name,
            "job_code": self.config.job_code,
            "extension_case": self.config.extension_case,
        })
    }
}

fn fill(object: &mut Map<String, Value>, defaults: Value) {
    if let Value::Object(defaults) = defaults {
        for (key, value) in defaults {
            object.entry(key).or_insert(value);
        }
    }
}

fn protocol(e: serde_json::Error) -> Error {
    exn::Exn::from(ErrorKind::Protocol(format!("malformed request: {e}")))
}
