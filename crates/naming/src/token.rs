//! The naming token vocabulary.
//!
//! Preferences store tokens as `[category, field, subfield]` string triples,
//! with an empty string where a level is unused:
//!
//! ```text
//! ["Text",      "IMG_",       ""]
//! ["Date time", "Image date", "YYYYMMDD"]
//! ["Separator", "",           ""]
//! ["Sequences", "Session number", "Three digits"]
//! ["Job code",  "",           ""]
//! ```
//!
//! Parsing a triple only checks that every level names something that exists.
//! Whether a token may be used in a given context (a video subfolder cannot
//! reference a session number, for instance) is decided by
//! [`TokenConfig`](crate::TokenConfig).

use crate::error::{ErrorKind, Result};
use crate::metadata::FileKind;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Declares a closed set of labelled variants, along with the conversions
/// between each variant and the label used in stored preferences.
macro_rules! labelled {
    ($(#[$meta:meta])* pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The label used for this variant in stored preferences.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Looks up a variant by its preference label.
            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled! {
    /// Where a date-time value comes from.
    pub enum DateSource {
        ImageDate => "Image date",
        VideoDate => "Video date",
        Today => "Today",
        Yesterday => "Yesterday",
        DownloadTime => "Download time",
    }
}

labelled! {
    /// How a date-time value is rendered.
    pub enum DateFormat {
        YearMonthDay => "YYYYMMDD",
        YearMonthDayDashed => "YYYY-MM-DD",
        ShortYearMonthDay => "YYMMDD",
        ShortYearMonthDayDashed => "YY-MM-DD",
        MonthDayYear => "MMDDYYYY",
        MonthDayShortYear => "MMDDYY",
        MonthDay => "MMDD",
        DayMonthYear => "DDMMYYYY",
        DayMonthShortYear => "DDMMYY",
        Year => "YYYY",
        ShortYear => "YY",
        Month => "MM",
        Day => "DD",
        MonthShort => "Month (short)",
        MonthLong => "Month (full)",
        HourMinuteSecond => "HHMMSS",
        HourMinute => "HHMM",
        HourMinuteSecondDashed => "HH-MM-SS",
        HourMinuteDashed => "HH-MM",
        Hour => "HH",
        Minute => "MM (minutes)",
        Second => "SS",
        Subseconds => "Subseconds",
    }
}

labelled! {
    /// Values derived from the file's original name on the device.
    pub enum FileField {
        NameExtension => "Name + extension",
        Name => "Name",
        Extension => "Extension",
        ImageNumber => "Image number",
    }
}

labelled! {
    /// Values read from the file's metadata.
    pub enum MetaField {
        Aperture => "Aperture",
        Iso => "ISO",
        ExposureTime => "Exposure time",
        FocalLength => "Focal length",
        CameraMake => "Camera make",
        CameraModel => "Camera model",
        ShortCameraModel => "Short camera model",
        ShortCameraModelHyphen => "Hyphenated short camera model",
        SerialNumber => "Serial number",
        ShutterCount => "Shutter count",
        OwnerName => "Owner name",
        Artist => "Artist",
        Copyright => "Copyright",
        Codec => "Codec",
        Width => "Width",
        Height => "Height",
        Length => "Length",
        FramesPerSecond => "Frames Per Second",
    }
}

labelled! {
    /// The sequence counters a name can reference.
    pub enum SequenceKind {
        DownloadsToday => "Downloads today",
        Stored => "Stored number",
        Session => "Session number",
        Letter => "Sequence letter",
        Matched => "Matched number",
    }
}

labelled! {
    /// Case conversion applied to text values.
    pub enum TextCase {
        Original => "Original Case",
        Upper => "UPPERCASE",
        Lower => "lowercase",
    }
}

labelled! {
    /// Case of a sequence letter.
    pub enum LetterCase {
        Upper => "Uppercase",
        Lower => "lowercase",
    }
}

labelled! {
    /// Which digits of the device's image number to use.
    pub enum ImageNumberPart {
        All => "All digits",
        Last1 => "Last digit",
        Last2 => "Last 2 digits",
        Last3 => "Last 3 digits",
        Last4 => "Last 4 digits",
    }
}

labelled! {
    /// Minimum width a number is zero-padded to.
    pub enum Digits {
        One => "One digit",
        Two => "Two digits",
        Three => "Three digits",
        Four => "Four digits",
        Five => "Five digits",
        Six => "Six digits",
        Seven => "Seven digits",
    }
}

impl Digits {
    pub fn width(&self) -> usize {
        match self {
            Digits::One => 1,
            Digits::Two => 2,
            Digits::Three => 3,
            Digits::Four => 4,
            Digits::Five => 5,
            Digits::Six => 6,
            Digits::Seven => 7,
        }
    }
}

impl TextCase {
    pub fn apply(&self, value: &str) -> String {
        match self {
            TextCase::Original => value.to_string(),
            TextCase::Upper => value.to_uppercase(),
            TextCase::Lower => value.to_lowercase(),
        }
    }
}

impl ImageNumberPart {
    /// Number of trailing digits to keep, or `None` for all of them.
    pub fn keep(&self) -> Option<usize> {
        match self {
            ImageNumberPart::All => None,
            ImageNumberPart::Last1 => Some(1),
            ImageNumberPart::Last2 => Some(2),
            ImageNumberPart::Last3 => Some(3),
            ImageNumberPart::Last4 => Some(4),
        }
    }
}

impl DateSource {
    /// Whether the value is the file's own capture time (as opposed to a time
    /// derived from when the download happened).
    pub fn is_capture(&self) -> bool {
        matches!(self, DateSource::ImageDate | DateSource::VideoDate)
    }
}

impl MetaField {
    /// Text values accept a case variant as their subfield.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            MetaField::CameraMake
                | MetaField::CameraModel
                | MetaField::ShortCameraModel
                | MetaField::ShortCameraModelHyphen
                | MetaField::OwnerName
                | MetaField::Artist
                | MetaField::Copyright
                | MetaField::Codec
        )
    }

    /// Whether the field is meaningful for the given kind of file.
    pub fn applies_to(&self, kind: FileKind) -> bool {
        match self {
            MetaField::CameraMake
            | MetaField::CameraModel
            | MetaField::ShortCameraModel
            | MetaField::ShortCameraModelHyphen => true,
            MetaField::Aperture
            | MetaField::Iso
            | MetaField::ExposureTime
            | MetaField::FocalLength
            | MetaField::SerialNumber
            | MetaField::ShutterCount
            | MetaField::OwnerName
            | MetaField::Artist
            | MetaField::Copyright => kind == FileKind::Photo,
            MetaField::Codec
            | MetaField::Width
            | MetaField::Height
            | MetaField::Length
            | MetaField::FramesPerSecond => kind == FileKind::Video,
        }
    }
}

/// A value a [`Token::Metadata`] refers to, grouped by preference category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `Date time` category.
    Date(DateSource),
    /// `Filename` category.
    File(FileField),
    /// `Metadata` category.
    Meta(MetaField),
}

impl Field {
    fn category(&self) -> &'static str {
        match self {
            Field::Date(_) => CATEGORY_DATE_TIME,
            Field::File(_) => CATEGORY_FILENAME,
            Field::Meta(_) => CATEGORY_METADATA,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Field::Date(d) => d.as_str(),
            Field::File(f) => f.as_str(),
            Field::Meta(m) => m.as_str(),
        }
    }
}

/// Variant selector attached to a field or sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subfield {
    Date(DateFormat),
    Case(TextCase),
    ImageNumber(ImageNumberPart),
    Digits(Digits),
    Letter(LetterCase),
}

impl Subfield {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subfield::Date(v) => v.as_str(),
            Subfield::Case(v) => v.as_str(),
            Subfield::ImageNumber(v) => v.as_str(),
            Subfield::Digits(v) => v.as_str(),
            Subfield::Letter(v) => v.as_str(),
        }
    }
}

const CATEGORY_TEXT: &str = "Text";
const CATEGORY_SEPARATOR: &str = "Separator";
const CATEGORY_DATE_TIME: &str = "Date time";
const CATEGORY_FILENAME: &str = "Filename";
const CATEGORY_METADATA: &str = "Metadata";
const CATEGORY_SEQUENCES: &str = "Sequences";
const CATEGORY_JOB_CODE: &str = "Job code";

/// A single element of a naming preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[String; 3]", into = "[String; 3]")]
pub enum Token {
    /// Literal text, emitted verbatim.
    Text(String),
    /// Subfolder level boundary. Never emitted as a literal character.
    Separator,
    /// A value taken from the file's metadata, name, or the download time.
    Metadata { field: Field, subfield: Option<Subfield> },
    /// One of the sequence counters.
    Sequence { kind: SequenceKind, subfield: Option<Subfield> },
    /// The job code supplied for the current download.
    JobCode,
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text(value.into())
    }

    pub fn date(source: DateSource, format: DateFormat) -> Self {
        Token::Metadata {
            field: Field::Date(source),
            subfield: Some(Subfield::Date(format)),
        }
    }

    pub fn file(field: FileField, subfield: impl Into<Option<Subfield>>) -> Self {
        Token::Metadata {
            field: Field::File(field),
            subfield: subfield.into(),
        }
    }

    pub fn meta(field: MetaField, subfield: impl Into<Option<Subfield>>) -> Self {
        Token::Metadata {
            field: Field::Meta(field),
            subfield: subfield.into(),
        }
    }

    pub fn sequence(kind: SequenceKind, subfield: impl Into<Option<Subfield>>) -> Self {
        Token::Sequence { kind, subfield: subfield.into() }
    }

    /// Parses a preference triple.
    ///
    /// Fails with [`ErrorKind::UnknownToken`] when any level is not part of
    /// the vocabulary, or when a subfield is given to a token that takes none.
    pub fn from_triple(category: &str, field: &str, subfield: &str) -> Result<Self> {
        Ok(Self::parse(category, field, subfield)?)
    }

    fn parse(category: &str, field: &str, subfield: &str) -> std::result::Result<Self, ErrorKind> {
        let unknown = || ErrorKind::UnknownToken(format!("[{category:?}, {field:?}, {subfield:?}]"));
        let token = match category {
            CATEGORY_TEXT => return Ok(Token::Text(field.to_string())),
            CATEGORY_SEPARATOR if field.is_empty() && subfield.is_empty() => return Ok(Token::Separator),
            CATEGORY_JOB_CODE if field.is_empty() && subfield.is_empty() => return Ok(Token::JobCode),
            CATEGORY_DATE_TIME => Field::Date(DateSource::from_label(field).ok_or_else(unknown)?),
            CATEGORY_FILENAME => Field::File(FileField::from_label(field).ok_or_else(unknown)?),
            CATEGORY_METADATA => Field::Meta(MetaField::from_label(field).ok_or_else(unknown)?),
            CATEGORY_SEQUENCES => {
                let kind = SequenceKind::from_label(field).ok_or_else(unknown)?;
                let subfield = match (subfield, kind) {
                    ("", _) => None,
                    (s, SequenceKind::Letter) => Some(Subfield::Letter(LetterCase::from_label(s).ok_or_else(unknown)?)),
                    (s, _) => Some(Subfield::Digits(Digits::from_label(s).ok_or_else(unknown)?)),
                };
                return Ok(Token::Sequence { kind, subfield });
            },
            _ => return Err(unknown()),
        };
        let parsed = match (subfield, token) {
            ("", _) => None,
            (s, Field::Date(_)) => DateFormat::from_label(s).map(Subfield::Date),
            (s, Field::File(FileField::ImageNumber)) => ImageNumberPart::from_label(s).map(Subfield::ImageNumber),
            (s, Field::File(_)) => TextCase::from_label(s).map(Subfield::Case),
            (s, Field::Meta(MetaField::ShutterCount)) => Digits::from_label(s).map(Subfield::Digits),
            (s, Field::Meta(m)) if m.is_text() => TextCase::from_label(s).map(Subfield::Case),
            (_, Field::Meta(_)) => None,
        };
        if !subfield.is_empty() && parsed.is_none() {
            return Err(unknown());
        }
        Ok(Token::Metadata { field: token, subfield: parsed })
    }

    /// Converts back into the stored preference representation.
    pub fn to_triple(&self) -> [String; 3] {
        let (category, field, subfield) = match self {
            Token::Text(text) => (CATEGORY_TEXT, text.as_str(), ""),
            Token::Separator => (CATEGORY_SEPARATOR, "", ""),
            Token::JobCode => (CATEGORY_JOB_CODE, "", ""),
            Token::Metadata { field, subfield } => {
                (field.category(), field.label(), subfield.as_ref().map(Subfield::as_str).unwrap_or(""))
            },
            Token::Sequence { kind, subfield } => {
                (CATEGORY_SEQUENCES, kind.as_str(), subfield.as_ref().map(Subfield::as_str).unwrap_or(""))
            },
        };
        [category.to_string(), field.to_string(), subfield.to_string()]
    }
}

impl TryFrom<[String; 3]> for Token {
    type Error = ErrorKind;
    fn try_from([category, field, subfield]: [String; 3]) -> std::result::Result<Self, Self::Error> {
        Self::parse(&category, &field, &subfield)
    }
}

impl From<Token> for [String; 3] {
    fn from(token: Token) -> Self {
        token.to_triple()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Text(text) => write!(f, "{text:?}"),
            Token::Separator => f.write_str("/"),
            Token::JobCode => f.write_str("<Job code>"),
            Token::Metadata { field, subfield: None } => write!(f, "<{}>", field.label()),
            Token::Metadata { field, subfield: Some(s) } => write!(f, "<{} ({})>", field.label(), s.as_str()),
            Token::Sequence { kind, subfield: None } => write!(f, "<{kind}>"),
            Token::Sequence { kind, subfield: Some(s) } => write!(f, "<{kind} ({})>", s.as_str()),
        }
    }
}

/// Whether a token list produces a file name or a subfolder path.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    #[display("filename")]
    Filename,
    #[display("subfolder")]
    Subfolder,
}

/// The four places a token list can be used, each with its own allow-list.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameContext {
    #[display("photo filename")]
    PhotoName,
    #[display("video filename")]
    VideoName,
    #[display("photo subfolder")]
    PhotoSubfolder,
    #[display("video subfolder")]
    VideoSubfolder,
}

impl NameContext {
    pub fn new(file: FileKind, list: ListKind) -> Self {
        match (file, list) {
            (FileKind::Photo, ListKind::Filename) => NameContext::PhotoName,
            (FileKind::Video, ListKind::Filename) => NameContext::VideoName,
            (FileKind::Photo, ListKind::Subfolder) => NameContext::PhotoSubfolder,
            (FileKind::Video, ListKind::Subfolder) => NameContext::VideoSubfolder,
        }
    }

    pub fn file_kind(&self) -> FileKind {
        match self {
            NameContext::PhotoName | NameContext::PhotoSubfolder => FileKind::Photo,
            NameContext::VideoName | NameContext::VideoSubfolder => FileKind::Video,
        }
    }

    pub fn list_kind(&self) -> ListKind {
        match self {
            NameContext::PhotoName | NameContext::VideoName => ListKind::Filename,
            NameContext::PhotoSubfolder | NameContext::VideoSubfolder => ListKind::Subfolder,
        }
    }
}

/// An ordered token sequence, tagged with the kind of name it produces.
///
/// Equality is structural and order-sensitive, which is what preset matching
/// relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenList {
    kind: ListKind,
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new(kind: ListKind, tokens: impl IntoIterator<Item = Token>) -> Self {
        Self { kind, tokens: tokens.into_iter().collect() }
    }

    pub fn filename(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self::new(ListKind::Filename, tokens)
    }

    pub fn subfolder(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self::new(ListKind::Subfolder, tokens)
    }

    /// Parses a list of stored preference triples.
    pub fn from_triples<S: AsRef<str>>(kind: ListKind, triples: &[[S; 3]]) -> Result<Self> {
        let tokens = triples
            .iter()
            .map(|[c, f, s]| Token::from_triple(c.as_ref(), f.as_ref(), s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(kind, tokens))
    }

    pub fn to_triples(&self) -> Vec<[String; 3]> {
        self.tokens.iter().map(Token::to_triple).collect()
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether any token in the list references the given sequence counter.
    pub fn uses_sequence(&self, kind: SequenceKind) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Sequence { kind: k, .. } if *k == kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(["Text", "IMG_", ""], Token::text("IMG_"))]
    #[case(["Separator", "", ""], Token::Separator)]
    #[case(["Job code", "", ""], Token::JobCode)]
    #[case(["Date time", "Image date", "YYYY"], Token::date(DateSource::ImageDate, DateFormat::Year))]
    #[case(["Date time", "Today", ""], Token::Metadata { field: Field::Date(DateSource::Today), subfield: None })]
    #[case(["Filename", "Extension", "lowercase"], Token::file(FileField::Extension, Subfield::Case(TextCase::Lower)))]
    #[case(["Filename", "Image number", "Last 3 digits"], Token::file(FileField::ImageNumber, Subfield::ImageNumber(ImageNumberPart::Last3)))]
    #[case(["Metadata", "Camera model", "UPPERCASE"], Token::meta(MetaField::CameraModel, Subfield::Case(TextCase::Upper)))]
    #[case(["Metadata", "ISO", ""], Token::meta(MetaField::Iso, None))]
    #[case(["Metadata", "Shutter count", "Six digits"], Token::meta(MetaField::ShutterCount, Subfield::Digits(Digits::Six)))]
    #[case(["Sequences", "Session number", "Three digits"], Token::sequence(SequenceKind::Session, Subfield::Digits(Digits::Three)))]
    #[case(["Sequences", "Sequence letter", "lowercase"], Token::sequence(SequenceKind::Letter, Subfield::Letter(LetterCase::Lower)))]
    #[case(["Sequences", "Stored number", ""], Token::sequence(SequenceKind::Stored, None))]
    fn test_parse_triple(#[case] triple: [&str; 3], #[case] expected: Token) {
        let token = Token::from_triple(triple[0], triple[1], triple[2]).unwrap();
        assert_eq!(token, expected);
        assert_eq!(token.to_triple(), triple.map(String::from));
    }

    #[rstest]
    #[case(["Colour", "", ""])]
    #[case(["Date time", "Tomorrow", "YYYY"])]
    #[case(["Date time", "Image date", "YYYYY"])]
    #[case(["Metadata", "ISO", "UPPERCASE"])]
    #[case(["Sequences", "Session number", "Eight digits"])]
    #[case(["Separator", "/", ""])]
    #[case(["Job code", "ABC", ""])]
    fn test_rejects_unknown_triple(#[case] triple: [&str; 3]) {
        let err = Token::from_triple(triple[0], triple[1], triple[2]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownToken(_)));
    }

    #[test]
    fn test_serde_uses_triples() {
        let tokens = vec![Token::text("IMG_"), Token::Separator, Token::date(DateSource::VideoDate, DateFormat::MonthShort)];
        let json = serde_json::to_string(&tokens).unwrap();
        assert_eq!(json, r#"[["Text","IMG_",""],["Separator","",""],["Date time","Video date","Month (short)"]]"#);
        let back: Vec<Token> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tokens);
        assert!(serde_json::from_str::<Token>(r#"["Metadata","Colour",""]"#).is_err());
    }

    #[test]
    fn test_list_equality_is_order_sensitive() {
        let a = TokenList::filename([Token::text("a"), Token::JobCode]);
        let b = TokenList::filename([Token::JobCode, Token::text("a")]);
        assert_ne!(a, b);
        assert_eq!(a, TokenList::filename([Token::text("a"), Token::JobCode]));
        // Same tokens, different kind.
        assert_ne!(a, TokenList::subfolder([Token::text("a"), Token::JobCode]));
    }

    #[test]
    fn test_uses_sequence() {
        let list = TokenList::filename([Token::text("x"), Token::sequence(SequenceKind::Letter, None)]);
        assert!(list.uses_sequence(SequenceKind::Letter));
        assert!(!list.uses_sequence(SequenceKind::Session));
    }

    #[test]
    fn test_context_round_trip() {
        for context in [
            NameContext::PhotoName,
            NameContext::VideoName,
            NameContext::PhotoSubfolder,
            NameContext::VideoSubfolder,
        ] {
            assert_eq!(NameContext::new(context.file_kind(), context.list_kind()), context);
        }
    }
}
