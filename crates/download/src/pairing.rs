//! RAW+JPEG pairing.
//!
//! Cameras that shoot RAW+JPEG write two files per shutter press with the
//! same base name, e.g. `IMG_0001.CR2` and `IMG_0001.JPG`. When both carry
//! the same capture time (down to the sub-second), they are one photo and
//! are named with the same sequence values.

use ferry_naming::{MetadataBundle, SequenceValues};
use std::collections::HashMap;
use time::PrimitiveDateTime;

/// The moment a photo was taken, as precisely as the camera reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureTime {
    pub date_time: PrimitiveDateTime,
    pub sub_seconds: Option<String>,
}

impl CaptureTime {
    /// `None` if the metadata has no capture date, in which case the photo
    /// cannot take part in pairing.
    pub fn from_metadata(metadata: &MetadataBundle) -> Option<Self> {
        Some(Self {
            date_time: metadata.date_time?,
            sub_seconds: metadata.sub_seconds.clone(),
        })
    }
}

impl std::fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sub_seconds {
            Some(sub) => write!(f, "{}.{sub}", self.date_time),
            None => write!(f, "{}", self.date_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    /// The base name has not been placed this session.
    NoMatch,
    /// The counterpart of an earlier photo. Carries the sequence values the
    /// counterpart was named with.
    MatchingPair(SequenceValues),
    /// This exact photo (same extension too) was already placed.
    AlreadyDownloaded(SequenceValues),
    /// Same base name, different capture time: two unrelated photos.
    TimeMismatch { extension: String, capture: CaptureTime },
}

#[derive(Debug, Clone)]
struct Entry {
    extensions: Vec<String>,
    capture: CaptureTime,
    sequences: SequenceValues,
}

/// Photos placed during a session, by base name. Entries are never removed.
#[derive(Debug, Default)]
pub struct PairingTracker {
    photos: HashMap<String, Entry>,
}

impl PairingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, base_name: &str, extension: &str, capture: &CaptureTime) -> PairStatus {
        let Some(entry) = self.photos.get(base_name) else {
            return PairStatus::NoMatch;
        };
        if entry.capture != *capture {
            return PairStatus::TimeMismatch {
                extension: entry.extensions.first().cloned().unwrap_or_default(),
                capture: entry.capture.clone(),
            };
        }
        match entry.extensions.iter().any(|e| e == extension) {
            true => PairStatus::AlreadyDownloaded(entry.sequences),
            false => PairStatus::MatchingPair(entry.sequences),
        }
    }

    /// Registers a placed photo. A known base name only gains the extension;
    /// its capture time and sequence values stay those of the first photo.
    pub fn record(&mut self, base_name: &str, extension: &str, capture: CaptureTime, sequences: SequenceValues) {
        let entry = self.photos.entry(base_name.to_string()).or_insert_with(|| Entry {
            extensions: vec![],
            capture,
            sequences,
        });
        if !entry.extensions.iter().any(|e| e == extension) {
            entry.extensions.push(extension.to_string());
        }
    }

    /// Extensions recorded for a base name, in the order they were placed.
    pub fn extensions(&self, base_name: &str) -> Option<&[String]> {
        self.photos.get(base_name).map(|entry| entry.extensions.as_slice())
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

/// Splits a device file name into base name and extension (with its dot).
pub(crate) fn split_base_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    fn values(session: u32) -> SequenceValues {
        SequenceValues { session, ..Default::default() }
    }

    fn capture(sub_seconds: &str) -> CaptureTime {
        CaptureTime {
            date_time: datetime!(2024-03-09 14:05:33),
            sub_seconds: Some(sub_seconds.to_string()),
        }
    }

    #[test]
    fn test_unseen_base_name() {
        let tracker = PairingTracker::new();
        assert_eq!(tracker.check("IMG_0001", ".CR2", &capture("07")), PairStatus::NoMatch);
    }

    #[rstest]
    #[case(".JPG", capture("07"), PairStatus::MatchingPair(values(4)))]
    #[case(".CR2", capture("07"), PairStatus::AlreadyDownloaded(values(4)))]
    #[case(".JPG", capture("08"), PairStatus::TimeMismatch { extension: ".CR2".to_string(), capture: capture("07") })]
    fn test_check(#[case] extension: &str, #[case] capture_time: CaptureTime, #[case] expected: PairStatus) {
        let mut tracker = PairingTracker::new();
        tracker.record("IMG_0001", ".CR2", capture("07"), values(4));
        assert_eq!(tracker.check("IMG_0001", extension, &capture_time), expected);
    }

    #[test]
    fn test_record_extends_without_overwriting() {
        let mut tracker = PairingTracker::new();
        tracker.record("IMG_0001", ".CR2", capture("07"), values(4));
        tracker.record("IMG_0001", ".JPG", capture("07"), values(9));
        tracker.record("IMG_0001", ".JPG", capture("07"), values(9));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.extensions("IMG_0001").unwrap(), [".CR2", ".JPG"]);
        // A third file of the same capture reuses the first writer's values.
        assert_eq!(tracker.check("IMG_0001", ".DNG", &capture("07")), PairStatus::MatchingPair(values(4)));
    }

    #[test]
    fn test_capture_requires_date() {
        let mut metadata = MetadataBundle {
            sub_seconds: Some("07".to_string()),
            ..Default::default()
        };
        assert_eq!(CaptureTime::from_metadata(&metadata), None);
        metadata.date_time = Some(datetime!(2024-03-09 14:05:33));
        assert_eq!(CaptureTime::from_metadata(&metadata), Some(capture("07")));
    }

    #[rstest]
    #[case("IMG_0001.CR2", ("IMG_0001", ".CR2"))]
    #[case("IMG_0001", ("IMG_0001", ""))]
    #[case(".hidden", (".hidden", ""))]
    fn test_split_base_name(#[case] name: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_base_name(name), expected);
    }
}
