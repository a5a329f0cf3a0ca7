//! The `check` command: shows what the configured token lists make of a
//! sample photo and video.

use ferry_config::Config;
use ferry_naming::{
    DownloadsToday, FileContext, FileKind, ListKind, MetadataBundle, Problems, SequenceState, generate, preset,
};
use time::PrimitiveDateTime;
use time::macros::datetime;

fn sample(kind: FileKind) -> (&'static str, MetadataBundle) {
    let metadata = MetadataBundle {
        date_time: Some(datetime!(2024-03-09 14:05:33)),
        sub_seconds: Some("07".to_string()),
        camera_make: Some("Canon".to_string()),
        camera_model: Some("EOS R5".to_string()),
        serial_number: Some("012345678901".to_string()),
        ..Default::default()
    };
    match kind {
        FileKind::Photo => (
            "IMG_0123.CR2",
            MetadataBundle {
                aperture: Some("2.8".to_string()),
                iso: Some(400),
                exposure_time: Some("1/250".to_string()),
                focal_length: Some(50),
                shutter_count: Some(1234),
                ..metadata
            },
        ),
        FileKind::Video => ("MVI_0124.MP4", metadata),
    }
}

/// One line per kind and list: the generated value, the preset it matches
/// and any problems generating it.
pub fn report(config: &Config, now: PrimitiveDateTime) -> Vec<String> {
    let sequences = SequenceState::new(DownloadsToday::new(now.date(), 0), 1);
    let mut lines = vec![];
    for kind in [FileKind::Photo, FileKind::Video] {
        let (source_name, metadata) = sample(kind);
        let ctx = FileContext {
            source_name,
            kind,
            metadata: Some(&metadata),
            job_code: config.job_code.as_deref(),
            extension_case: config.extension_case,
            strip_characters: config.strip_characters,
            sequences: &sequences,
            download_time: now,
        };
        let profile = config.profile(kind);
        for (list, tokens) in [
            (ListKind::Subfolder, profile.subfolder_list()),
            (ListKind::Filename, profile.name_list()),
        ] {
            let mut problems = Problems::new();
            let generated = generate(&tokens, &ctx, &mut problems);
            let preset = match config.preset_index(kind, list) {
                Some(index) => preset::for_list(kind, list)
                    .get(index)
                    .map_or_else(String::new, |p| format!(" (preset \"{}\")", p.name)),
                None => String::new(),
            };
            lines.push(format!("{} {list}: {:?}{preset}", kind.as_str(), generated.value));
            for problem in problems.iter() {
                lines.push(format!("  {problem}"));
            }
        }
    }
    lines
}
