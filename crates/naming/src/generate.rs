//! The name generator.
//!
//! Turns a [`TokenList`] plus a per-file [`FileContext`] into a file name or a
//! subfolder path. Generation never fails: a token whose value is missing
//! emits an empty string and records a [`Problem`](crate::Problem), leaving
//! it to the caller to decide whether the end result is usable.
//!
//! ```text
//! tokens  ["IMG_"] <Image date (YYYY)> <Session number>
//! parts   "IMG_"   "2024"              "0"
//! value   "IMG_20240"
//! ```
//!
//! For subfolders, [`Token::Separator`] splits the parts into path components.
//! Each component has illegal characters stripped independently, empty
//! components are dropped, and the survivors are joined with the platform
//! separator, so a generated subfolder never starts or ends with a separator
//! and never contains two in a row.

use crate::format::{format_date, pad};
use crate::metadata::{FileKind, MetadataBundle};
use crate::problem::{ProblemKind, Problems};
use crate::sequence::{SequenceState, sequence_letter};
use crate::token::{
    DateFormat, DateSource, Field, FileField, ImageNumberPart, LetterCase, ListKind, MetaField, SequenceKind, Subfield,
    TextCase, Token, TokenList,
};
use serde::{Deserialize, Serialize};
use std::path::MAIN_SEPARATOR_STR;
use time::{Duration, PrimitiveDateTime};
use tracing::instrument;

/// Characters that can never appear in a path component.
const ALWAYS_ILLEGAL: [char; 2] = ['/', '\0'];
/// Characters Windows and FAT file systems reject, stripped on request.
const PORTABLE_ILLEGAL: [char; 8] = ['\\', ':', '*', '?', '"', '<', '>', '|'];

/// How the extension of a generated name is cased, unless a token asks for a
/// specific case itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionCase {
    Original,
    Upper,
    #[default]
    Lower,
}

impl ExtensionCase {
    fn text_case(&self) -> TextCase {
        match self {
            ExtensionCase::Original => TextCase::Original,
            ExtensionCase::Upper => TextCase::Upper,
            ExtensionCase::Lower => TextCase::Lower,
        }
    }

    /// Cases a sidecar extension (`.THM`, `.WAV`, `.XMP`, ...).
    ///
    /// With [`ExtensionCase::Original`] the sidecar follows the primary file:
    /// lowercase if the primary extension is entirely lowercase, uppercase
    /// otherwise.
    pub fn sidecar_extension(&self, extension: &str, primary_extension: &str) -> String {
        match self {
            ExtensionCase::Upper => extension.to_uppercase(),
            ExtensionCase::Lower => extension.to_lowercase(),
            ExtensionCase::Original if primary_extension.chars().any(char::is_uppercase) => extension.to_uppercase(),
            ExtensionCase::Original if primary_extension.is_empty() => extension.to_string(),
            ExtensionCase::Original => extension.to_lowercase(),
        }
    }
}

/// Everything the generator may consult for one file. Read-only.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    /// The file's name on the device, e.g. `IMG_0001.CR2`.
    pub source_name: &'a str,
    pub kind: FileKind,
    /// `None` when metadata could not be loaded at all.
    pub metadata: Option<&'a MetadataBundle>,
    pub job_code: Option<&'a str>,
    pub extension_case: ExtensionCase,
    /// Also strip characters only illegal on Windows and FAT file systems.
    pub strip_characters: bool,
    pub sequences: &'a SequenceState,
    /// When the download happened, which `Today`, `Yesterday` and
    /// `Download time` tokens are derived from.
    pub download_time: PrimitiveDateTime,
}

impl FileContext<'_> {
    /// Splits the source name into its stem and extension (without the dot).
    fn split_source(&self) -> (&str, Option<&str>) {
        split_name(self.source_name)
    }
}

/// Splits a file name at its last dot. Dot-files have no extension.
pub(crate) fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name, None),
    }
}

/// The result of evaluating a token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    /// The finished file name or subfolder path. May be empty.
    pub value: String,
    /// The raw output of each token, aligned 1:1 with the token list.
    pub parts: Vec<String>,
    /// The path components of a subfolder (empty for file names).
    pub components: Vec<String>,
}

impl Generated {
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Evaluates `list` for one file, recording anything missing in `problems`.
///
/// Deterministic: the same list and context always produce the same output.
#[instrument(level = "debug", skip_all, fields(source = ctx.source_name, kind = %list.kind()))]
pub fn generate(list: &TokenList, ctx: &FileContext<'_>, problems: &mut Problems) -> Generated {
    let parts: Vec<String> = list.tokens().iter().map(|token| evaluate(token, list.kind(), ctx, problems)).collect();
    let generated = match list.kind() {
        ListKind::Filename => {
            let value = strip_illegal(&parts.concat(), ctx.strip_characters);
            Generated { value, parts, components: vec![] }
        },
        ListKind::Subfolder => {
            let components = split_components(list.tokens(), &parts, ctx.strip_characters, problems);
            Generated {
                value: components.join(MAIN_SEPARATOR_STR),
                parts,
                components,
            }
        },
    };
    tracing::debug!(value = %generated.value, "Generated name");
    generated
}

fn strip_illegal(value: &str, portable: bool) -> String {
    value
        .chars()
        .filter(|c| !ALWAYS_ILLEGAL.contains(c) && !(portable && PORTABLE_ILLEGAL.contains(c)))
        .collect()
}

/// Groups the parts between separators into cleaned path components.
fn split_components(tokens: &[Token], parts: &[String], portable: bool, problems: &mut Problems) -> Vec<String> {
    let mut raw = vec![String::new()];
    for (token, part) in tokens.iter().zip(parts) {
        match token {
            Token::Separator => raw.push(String::new()),
            _ => {
                if let Some(current) = raw.last_mut() {
                    current.push_str(part);
                }
            },
        }
    }
    let cleaned: Vec<String> = raw.iter().map(|c| strip_illegal(c, portable)).collect();
    if cleaned.len() > 1 {
        let leading = cleaned.first().is_some_and(String::is_empty);
        let trailing = cleaned.last().is_some_and(String::is_empty);
        if leading || trailing {
            let detail = match (leading, trailing) {
                (true, true) => "subfolder starts and ends with a separator",
                (true, false) => "subfolder starts with a separator",
                _ => "subfolder ends with a separator",
            };
            problems.push(ProblemKind::RedundantSeparator, detail);
        }
    }
    cleaned.into_iter().filter(|c| !c.is_empty()).collect()
}

fn evaluate(token: &Token, kind: ListKind, ctx: &FileContext<'_>, problems: &mut Problems) -> String {
    match token {
        Token::Text(text) => text.clone(),
        Token::Separator => String::new(),
        Token::JobCode => match ctx.job_code.filter(|c| !c.is_empty()) {
            Some(code) => code.to_string(),
            None => {
                problems.push(ProblemKind::MissingJobCode, "a job code is used in the name, but none was given");
                String::new()
            },
        },
        Token::Metadata { field: Field::Date(source), subfield } => {
            let format = match subfield {
                Some(Subfield::Date(format)) => *format,
                _ => DateFormat::YearMonthDay,
            };
            date_value(*source, format, ctx, problems)
        },
        Token::Metadata { field: Field::File(field), subfield } => file_value(*field, *subfield, kind, ctx, problems),
        Token::Metadata { field: Field::Meta(field), subfield } => meta_value(*field, *subfield, ctx, problems),
        Token::Sequence { kind, subfield } => sequence_value(*kind, *subfield, ctx, problems),
    }
}

fn missing(problems: &mut Problems, what: impl std::fmt::Display) -> String {
    problems.push(ProblemKind::MetadataUnavailable, format!("{what} is not available"));
    String::new()
}

fn date_value(source: DateSource, format: DateFormat, ctx: &FileContext<'_>, problems: &mut Problems) -> String {
    let value = match source {
        DateSource::ImageDate | DateSource::VideoDate => {
            if format == DateFormat::Subseconds {
                return match ctx.metadata.and_then(|m| m.sub_seconds.as_deref()) {
                    Some(sub_seconds) => sub_seconds.to_string(),
                    None => missing(problems, "sub-second time"),
                };
            }
            match ctx.metadata.and_then(|m| m.date_time) {
                Some(value) => value,
                None => return missing(problems, format!("{} ({})", source, ctx.source_name)),
            }
        },
        DateSource::Today | DateSource::DownloadTime => ctx.download_time,
        DateSource::Yesterday => ctx.download_time.saturating_sub(Duration::days(1)),
    };
    format_date(value, format).unwrap_or_else(|| missing(problems, format!("{source} as {format}")))
}

fn file_value(
    field: FileField,
    subfield: Option<Subfield>,
    list: ListKind,
    ctx: &FileContext<'_>,
    problems: &mut Problems,
) -> String {
    let (stem, extension) = ctx.split_source();
    let case = match subfield {
        Some(Subfield::Case(case)) => Some(case),
        _ => None,
    };
    let cased_extension = |dot: &str| match extension {
        Some(ext) => format!("{dot}{}", case.unwrap_or(ctx.extension_case.text_case()).apply(ext)),
        None => String::new(),
    };
    match field {
        FileField::Name => case.unwrap_or(TextCase::Original).apply(stem),
        FileField::Extension if list == ListKind::Subfolder => cased_extension(""),
        FileField::Extension => cased_extension("."),
        FileField::NameExtension => match case {
            // An explicit case applies to the whole name.
            Some(case) => case.apply(ctx.source_name),
            None => format!("{stem}{}", cased_extension(".")),
        },
        FileField::ImageNumber => {
            let part = match subfield {
                Some(Subfield::ImageNumber(part)) => part,
                _ => ImageNumberPart::All,
            };
            match image_number(stem, part) {
                Some(number) => number.to_string(),
                None => {
                    problems.push(
                        ProblemKind::MissingImageNumber,
                        format!("{} does not contain an image number", ctx.source_name),
                    );
                    String::new()
                },
            }
        },
    }
}

/// The device's image number: the last run of digits in the file stem,
/// optionally trimmed to its trailing digits.
fn image_number(stem: &str, part: ImageNumberPart) -> Option<&str> {
    let end = stem.rfind(|c: char| c.is_ascii_digit())? + 1;
    let start = stem[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let digits = &stem[start..end];
    match part.keep() {
        Some(keep) if keep < digits.len() => Some(&digits[digits.len() - keep..]),
        _ => Some(digits),
    }
}

fn meta_value(field: MetaField, subfield: Option<Subfield>, ctx: &FileContext<'_>, problems: &mut Problems) -> String {
    let Some(metadata) = ctx.metadata else {
        return missing(problems, field);
    };
    let case = match subfield {
        Some(Subfield::Case(case)) => case,
        _ => TextCase::Original,
    };
    let value = match field {
        MetaField::Aperture => metadata.aperture.clone(),
        MetaField::Iso => metadata.iso.map(|v| v.to_string()),
        MetaField::ExposureTime => metadata.exposure_time.as_ref().map(|v| v.replace('/', "over")),
        MetaField::FocalLength => metadata.focal_length.map(|v| format!("{v}mm")),
        MetaField::CameraMake => metadata.camera_make.as_deref().map(|v| case.apply(v)),
        MetaField::CameraModel => metadata.camera_model.as_deref().map(|v| case.apply(v)),
        MetaField::ShortCameraModel => metadata.short_camera_model("").map(|v| case.apply(&v)),
        MetaField::ShortCameraModelHyphen => metadata.short_camera_model("-").map(|v| case.apply(&v)),
        MetaField::SerialNumber => metadata.serial_number.clone(),
        MetaField::ShutterCount => {
            let width = match subfield {
                Some(Subfield::Digits(digits)) => Some(digits.width()),
                _ => None,
            };
            metadata.shutter_count.map(|v| pad(v, width))
        },
        MetaField::OwnerName => metadata.owner_name.as_deref().map(|v| case.apply(v)),
        MetaField::Artist => metadata.artist.as_deref().map(|v| case.apply(v)),
        MetaField::Copyright => metadata.copyright.as_deref().map(|v| case.apply(v)),
        MetaField::Codec => metadata.codec.as_deref().map(|v| case.apply(v)),
        MetaField::Width => metadata.width.map(|v| v.to_string()),
        MetaField::Height => metadata.height.map(|v| v.to_string()),
        MetaField::Length => metadata.length.map(|v| v.to_string()),
        MetaField::FramesPerSecond => metadata.frames_per_second.map(|v| v.to_string()),
    };
    match value.filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => missing(problems, field),
    }
}

fn sequence_value(kind: SequenceKind, subfield: Option<Subfield>, ctx: &FileContext<'_>, problems: &mut Problems) -> String {
    let width = match subfield {
        Some(Subfield::Digits(digits)) => Some(digits.width()),
        _ => None,
    };
    // The second half of a RAW+JPEG pair sees its counterpart's values.
    let values = ctx.sequences.values();
    match kind {
        SequenceKind::DownloadsToday => pad(values.downloads_today, width),
        SequenceKind::Stored => pad(values.stored, width),
        SequenceKind::Session => pad(values.session, width),
        SequenceKind::Letter => {
            let letter = sequence_letter(values.letter_index);
            match subfield {
                Some(Subfield::Letter(LetterCase::Lower)) => letter.to_lowercase(),
                _ => letter,
            }
        },
        SequenceKind::Matched => match ctx.sequences.matched() {
            Some(matched) => pad(matched.session, width),
            None => {
                problems.push(
                    ProblemKind::MatchedSequenceFallback,
                    "no matched sequence number is available, so the session number was used",
                );
                pad(values.session, width)
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{DownloadsToday, SequenceValues};
    use crate::token::Digits;
    use rstest::rstest;
    use time::macros::{date, datetime};

    fn sequences() -> SequenceState {
        SequenceState::new(DownloadsToday::new(date!(2024-03-09), 4), 41)
    }

    fn bundle() -> MetadataBundle {
        MetadataBundle {
            date_time: Some(datetime!(2024-03-09 14:05:33)),
            sub_seconds: Some("07".to_string()),
            aperture: Some("2.8".to_string()),
            iso: Some(400),
            exposure_time: Some("1/250".to_string()),
            focal_length: Some(35),
            camera_make: Some("Canon".to_string()),
            camera_model: Some("Canon EOS 5D Mark III".to_string()),
            shutter_count: Some(1234),
            ..Default::default()
        }
    }

    fn context<'a>(metadata: Option<&'a MetadataBundle>, sequences: &'a SequenceState) -> FileContext<'a> {
        FileContext {
            source_name: "IMG_0123.CR2",
            kind: FileKind::Photo,
            metadata,
            job_code: None,
            extension_case: ExtensionCase::Lower,
            strip_characters: true,
            sequences,
            download_time: datetime!(2024-03-10 09:30:00),
        }
    }

    fn name(tokens: impl IntoIterator<Item = Token>) -> (Generated, Problems) {
        let metadata = bundle();
        let sequences = sequences();
        let mut problems = Problems::new();
        let generated = generate(&TokenList::filename(tokens), &context(Some(&metadata), &sequences), &mut problems);
        (generated, problems)
    }

    fn subfolder(tokens: impl IntoIterator<Item = Token>) -> (Generated, Problems) {
        let metadata = bundle();
        let sequences = sequences();
        let mut problems = Problems::new();
        let generated = generate(&TokenList::subfolder(tokens), &context(Some(&metadata), &sequences), &mut problems);
        (generated, problems)
    }

    #[rstest]
    #[case(&["IMG_", "0001"])]
    #[case(&["a", "", "b c", "-d"])]
    #[case(&["holiday"])]
    fn test_text_only_is_concatenation(#[case] literals: &[&str]) {
        let (generated, problems) = name(literals.iter().map(|l| Token::text(*l)));
        assert_eq!(generated.value, literals.concat());
        assert_eq!(generated.parts, literals.iter().map(|l| l.to_string()).collect::<Vec<_>>());
        assert!(problems.is_empty());
    }

    #[test]
    fn test_session_number_scenario() {
        let list = TokenList::filename([
            Token::text("IMG_"),
            Token::date(DateSource::ImageDate, DateFormat::Year),
            Token::sequence(SequenceKind::Session, None),
        ]);
        let metadata = bundle();
        let mut sequences = sequences();
        let mut problems = Problems::new();
        let first = generate(&list, &context(Some(&metadata), &sequences), &mut problems);
        assert_eq!(first.value, "IMG_20240");
        assert_eq!(first.parts, ["IMG_", "2024", "0"]);
        sequences.increment(list.uses_sequence(SequenceKind::Session), list.uses_sequence(SequenceKind::Letter));
        let second = generate(&list, &context(Some(&metadata), &sequences), &mut problems);
        assert_eq!(second.value, "IMG_20241");
        assert!(problems.is_empty());
    }

    #[rstest]
    #[case(Token::file(FileField::NameExtension, None), "IMG_0123.cr2")]
    #[case(Token::file(FileField::NameExtension, Subfield::Case(TextCase::Lower)), "img_0123.cr2")]
    #[case(Token::file(FileField::Name, None), "IMG_0123")]
    #[case(Token::file(FileField::Extension, None), ".cr2")]
    #[case(Token::file(FileField::Extension, Subfield::Case(TextCase::Upper)), ".CR2")]
    #[case(Token::file(FileField::ImageNumber, None), "0123")]
    #[case(Token::file(FileField::ImageNumber, Subfield::ImageNumber(ImageNumberPart::Last2)), "23")]
    #[case(Token::date(DateSource::ImageDate, DateFormat::Subseconds), "07")]
    #[case(Token::date(DateSource::Today, DateFormat::YearMonthDayDashed), "2024-03-10")]
    #[case(Token::date(DateSource::Yesterday, DateFormat::YearMonthDayDashed), "2024-03-09")]
    #[case(Token::date(DateSource::DownloadTime, DateFormat::HourMinute), "0930")]
    #[case(Token::Metadata { field: Field::Date(DateSource::ImageDate), subfield: None }, "20240309")]
    #[case(Token::meta(MetaField::Aperture, None), "2.8")]
    #[case(Token::meta(MetaField::Iso, None), "400")]
    #[case(Token::meta(MetaField::ExposureTime, None), "1over250")]
    #[case(Token::meta(MetaField::FocalLength, None), "35mm")]
    #[case(Token::meta(MetaField::CameraModel, Subfield::Case(TextCase::Upper)), "CANON EOS 5D MARK III")]
    #[case(Token::meta(MetaField::ShortCameraModel, None), "5DMkIII")]
    #[case(Token::meta(MetaField::ShortCameraModelHyphen, Subfield::Case(TextCase::Lower)), "5d-mk-iii")]
    #[case(Token::meta(MetaField::ShutterCount, Subfield::Digits(Digits::Six)), "001234")]
    #[case(Token::sequence(SequenceKind::DownloadsToday, Subfield::Digits(Digits::Two)), "04")]
    #[case(Token::sequence(SequenceKind::Stored, Subfield::Digits(Digits::Four)), "0041")]
    #[case(Token::sequence(SequenceKind::Letter, None), "A")]
    #[case(Token::sequence(SequenceKind::Letter, Subfield::Letter(LetterCase::Lower)), "a")]
    fn test_token_values(#[case] token: Token, #[case] expected: &str) {
        let (generated, problems) = name([token]);
        assert_eq!(generated.value, expected);
        assert!(problems.is_empty(), "unexpected problems: {problems:?}");
    }

    #[rstest]
    #[case(Token::meta(MetaField::SerialNumber, None), ProblemKind::MetadataUnavailable)]
    #[case(Token::JobCode, ProblemKind::MissingJobCode)]
    #[case(Token::sequence(SequenceKind::Matched, None), ProblemKind::MatchedSequenceFallback)]
    fn test_missing_values_are_problems(#[case] token: Token, #[case] kind: ProblemKind) {
        let (generated, problems) = name([Token::text("x"), token]);
        // The fallback for a matched number still emits the session number.
        let expected = if kind == ProblemKind::MatchedSequenceFallback { "x0" } else { "x" };
        assert_eq!(generated.value, expected);
        assert!(problems.contains(kind));
        assert_eq!(generated.parts.len(), 2);
    }

    #[test]
    fn test_missing_metadata_degrades_to_empty() {
        let sequences = sequences();
        let mut problems = Problems::new();
        let list = TokenList::filename([Token::date(DateSource::ImageDate, DateFormat::Year), Token::meta(MetaField::Iso, None)]);
        let generated = generate(&list, &context(None, &sequences), &mut problems);
        assert!(generated.is_empty());
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().all(|p| p.kind == ProblemKind::MetadataUnavailable));
    }

    #[test]
    fn test_matched_number_is_used_when_set() {
        let metadata = bundle();
        let mut sequences = sequences();
        sequences.set_matched(SequenceValues { session: 17, ..Default::default() });
        let mut problems = Problems::new();
        let list = TokenList::filename([Token::sequence(SequenceKind::Matched, Subfield::Digits(Digits::Three))]);
        let generated = generate(&list, &context(Some(&metadata), &sequences), &mut problems);
        assert_eq!(generated.value, "017");
        assert!(problems.is_empty());
    }

    #[rstest]
    #[case(SequenceKind::Session, "IMG_2-2")]
    #[case(SequenceKind::DownloadsToday, "IMG_5-5")]
    #[case(SequenceKind::Stored, "IMG_40-40")]
    #[case(SequenceKind::Letter, "IMG_C-C")]
    fn test_matched_values_replace_every_counter(#[case] kind: SequenceKind, #[case] expected: &str) {
        let metadata = bundle();
        let mut sequences = sequences();
        sequences.set_matched(SequenceValues { downloads_today: 5, stored: 40, session: 2, letter_index: 2 });
        // Live counters move on; the matched values must still win.
        sequences.increment(true, true);
        let mut problems = Problems::new();
        let list = TokenList::filename([
            Token::text("IMG_"),
            Token::sequence(kind, None),
            Token::text("-"),
            Token::sequence(kind, None),
        ]);
        let generated = generate(&list, &context(Some(&metadata), &sequences), &mut problems);
        assert_eq!(generated.value, expected);
    }

    #[test]
    fn test_job_code() {
        let metadata = bundle();
        let sequences = sequences();
        let mut problems = Problems::new();
        let ctx = FileContext {
            job_code: Some("Wedding"),
            ..context(Some(&metadata), &sequences)
        };
        let generated = generate(&TokenList::filename([Token::JobCode, Token::text("_1")]), &ctx, &mut problems);
        assert_eq!(generated.value, "Wedding_1");
        assert!(problems.is_empty());
    }

    #[test]
    fn test_subfolder_components() {
        let (generated, problems) = subfolder([
            Token::date(DateSource::ImageDate, DateFormat::Year),
            Token::Separator,
            Token::date(DateSource::ImageDate, DateFormat::YearMonthDay),
            Token::Separator,
            Token::file(FileField::Extension, Subfield::Case(TextCase::Upper)),
        ]);
        assert_eq!(generated.components, ["2024", "20240309", "CR2"]);
        assert_eq!(generated.value, ["2024", "20240309", "CR2"].join(MAIN_SEPARATOR_STR));
        assert_eq!(generated.parts, ["2024", "", "20240309", "", "CR2"]);
        assert!(problems.is_empty());
    }

    #[rstest]
    #[case(vec![Token::Separator, Token::text("a")], true)]
    #[case(vec![Token::text("a"), Token::Separator], true)]
    #[case(vec![Token::text("a"), Token::Separator, Token::Separator, Token::text("b")], false)]
    #[case(vec![Token::Separator, Token::text("a"), Token::Separator, Token::Separator, Token::text("b"), Token::Separator], true)]
    #[case(vec![Token::text("a/b"), Token::Separator, Token::text("c")], false)]
    #[case(vec![Token::meta(MetaField::SerialNumber, None), Token::Separator, Token::text("b")], true)]
    fn test_subfolder_never_has_stray_separators(#[case] tokens: Vec<Token>, #[case] redundant: bool) {
        let (generated, problems) = subfolder(tokens);
        let value = &generated.value;
        assert!(!value.starts_with(MAIN_SEPARATOR_STR), "{value}");
        assert!(!value.ends_with(MAIN_SEPARATOR_STR), "{value}");
        assert!(!value.contains(&MAIN_SEPARATOR_STR.repeat(2)), "{value}");
        assert!(generated.components.iter().all(|c| !c.is_empty()));
        assert_eq!(problems.contains(ProblemKind::RedundantSeparator), redundant);
    }

    #[test]
    fn test_illegal_characters_stay_within_component() {
        let (generated, _) = subfolder([Token::text("a/b:c"), Token::Separator, Token::text("d?")]);
        assert_eq!(generated.components, ["abc", "d"]);
    }

    #[test]
    fn test_portable_characters_kept_when_not_stripping() {
        let metadata = bundle();
        let sequences = sequences();
        let mut problems = Problems::new();
        let ctx = FileContext {
            strip_characters: false,
            ..context(Some(&metadata), &sequences)
        };
        let generated = generate(&TokenList::filename([Token::text("a:b/c")]), &ctx, &mut problems);
        assert_eq!(generated.value, "a:bc");
    }

    #[test]
    fn test_generation_is_idempotent() {
        let list = TokenList::filename([
            Token::date(DateSource::ImageDate, DateFormat::YearMonthDay),
            Token::text("-"),
            Token::sequence(SequenceKind::DownloadsToday, Subfield::Digits(Digits::Four)),
            Token::file(FileField::Extension, None),
        ]);
        let metadata = bundle();
        let sequences = sequences();
        let ctx = context(Some(&metadata), &sequences);
        let (mut a, mut b) = (Problems::new(), Problems::new());
        assert_eq!(generate(&list, &ctx, &mut a), generate(&list, &ctx, &mut b));
        assert_eq!(a, b);
    }

    #[rstest]
    #[case(ExtensionCase::Lower, ".THM", ".JPG", ".thm")]
    #[case(ExtensionCase::Upper, ".wav", ".jpg", ".WAV")]
    #[case(ExtensionCase::Original, ".THM", ".jpg", ".thm")]
    #[case(ExtensionCase::Original, ".xmp", ".CR2", ".XMP")]
    fn test_sidecar_extension(
        #[case] policy: ExtensionCase,
        #[case] extension: &str,
        #[case] primary: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(policy.sidecar_extension(extension, primary), expected);
    }

    #[rstest]
    #[case("IMG_0001.JPG", ("IMG_0001", Some("JPG")))]
    #[case("archive.tar.gz", ("archive.tar", Some("gz")))]
    #[case(".hidden", (".hidden", None))]
    #[case("noext", ("noext", None))]
    fn test_split_name(#[case] name: &str, #[case] expected: (&str, Option<&str>)) {
        assert_eq!(split_name(name), expected);
    }

    #[rstest]
    #[case("IMG_0123", ImageNumberPart::All, Some("0123"))]
    #[case("IMG_0123", ImageNumberPart::Last1, Some("3"))]
    #[case("DSC12_0045a", ImageNumberPart::All, Some("0045"))]
    #[case("12", ImageNumberPart::Last4, Some("12"))]
    #[case("IMG_", ImageNumberPart::All, None)]
    fn test_image_number(#[case] stem: &str, #[case] part: ImageNumberPart, #[case] expected: Option<&str>) {
        assert_eq!(image_number(stem, part), expected);
    }
}
