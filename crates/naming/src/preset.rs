//! Built-in naming presets.
//!
//! Presets double as configuration defaults. [`find_preset`] tells whether a
//! user's token list is one of them, which only counts when the list is
//! structurally identical (same tokens, same order, same kind).

use crate::metadata::FileKind;
use crate::token::{
    DateFormat, DateSource, Digits, FileField, ListKind, SequenceKind, Subfield, TextCase, Token, TokenList,
};

/// A named, built-in token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub tokens: TokenList,
}

impl Preset {
    fn new(name: &'static str, tokens: TokenList) -> Self {
        Self { name, tokens }
    }
}

fn capture(kind: FileKind) -> DateSource {
    match kind {
        FileKind::Photo => DateSource::ImageDate,
        FileKind::Video => DateSource::VideoDate,
    }
}

/// File name presets for the given kind of file. The first is the default.
pub fn names(kind: FileKind) -> Vec<Preset> {
    let date = capture(kind);
    let extension = || Token::file(FileField::Extension, None);
    vec![
        Preset::new(
            "Original filename",
            TokenList::filename([Token::file(FileField::NameExtension, Subfield::Case(TextCase::Original))]),
        ),
        Preset::new(
            "Date-time and Downloads today",
            TokenList::filename([
                Token::date(date, DateFormat::YearMonthDay),
                Token::text("-"),
                Token::date(date, DateFormat::HourMinute),
                Token::text("-"),
                Token::sequence(SequenceKind::DownloadsToday, Subfield::Digits(Digits::Four)),
                extension(),
            ]),
        ),
        Preset::new(
            "Date and session number",
            TokenList::filename([
                Token::date(date, DateFormat::YearMonthDay),
                Token::text("-"),
                Token::sequence(SequenceKind::Session, Subfield::Digits(Digits::Four)),
                extension(),
            ]),
        ),
    ]
}

/// Subfolder presets for the given kind of file. The first is the default.
pub fn subfolders(kind: FileKind) -> Vec<Preset> {
    let date = capture(kind);
    vec![
        Preset::new("Date", TokenList::subfolder([Token::date(date, DateFormat::YearMonthDayDashed)])),
        Preset::new(
            "Year/Date",
            TokenList::subfolder([
                Token::date(date, DateFormat::Year),
                Token::Separator,
                Token::date(date, DateFormat::YearMonthDay),
            ]),
        ),
        Preset::new(
            "Year/Month/Day",
            TokenList::subfolder([
                Token::date(date, DateFormat::Year),
                Token::Separator,
                Token::date(date, DateFormat::Month),
                Token::Separator,
                Token::date(date, DateFormat::Day),
            ]),
        ),
    ]
}

/// The presets of the same kind as `list`.
pub fn for_list(kind: FileKind, list: ListKind) -> Vec<Preset> {
    match list {
        ListKind::Filename => names(kind),
        ListKind::Subfolder => subfolders(kind),
    }
}

/// Index of the first preset that is structurally equal to `list`.
pub fn find_preset(list: &TokenList, presets: &[Preset]) -> Option<usize> {
    presets.iter().position(|preset| preset.tokens == *list)
}
