use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

time::serde::format_description!(capture_time, PrimitiveDateTime, "[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Whether a file is a photo or a video. Each has its own naming preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Photo,
    Video,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Photo => "photo",
            FileKind::Video => "video",
        }
    }
}

/// Metadata read from a media file.
///
/// Every value is optional: cameras disagree wildly on what they record, and a
/// missing value only becomes a problem when a token actually asks for it.
/// Capture times carry no time zone, matching what cameras write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataBundle {
    #[serde(with = "capture_time::option", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<PrimitiveDateTime>,
    /// Sub-second component of the capture time, exactly as the camera
    /// reports it (`"07"`, `"070"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_seconds: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    /// Exposure time as a fraction or decimal, e.g. `"1/250"` or `"2.5"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<String>,
    /// Focal length in millimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Duration in whole seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_per_second: Option<u32>,
}

impl MetadataBundle {
    /// A compact camera model, e.g. `Canon EOS 5D Mark III` becomes `5DMkIII`.
    ///
    /// Words repeated from the camera make, and marketing words that say
    /// nothing about the model, are dropped. `Mark` is abbreviated.
    pub fn short_camera_model(&self, separator: &str) -> Option<String> {
        const NOISE: [&str; 4] = ["eos", "digital", "camera", "corporation"];
        let model = self.camera_model.as_deref()?;
        let make: Vec<String> = self
            .camera_make
            .as_deref()
            .map(|m| m.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();
        let words: Vec<&str> = model
            .split_whitespace()
            .filter(|w| {
                let lower = w.to_lowercase();
                !make.contains(&lower) && !NOISE.contains(&lower.as_str())
            })
            .map(|w| if w.eq_ignore_ascii_case("mark") { "Mk" } else { w })
            .collect();
        match words.is_empty() {
            true => None,
            false => Some(words.join(separator)),
        }
    }
}
