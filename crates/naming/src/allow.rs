//! Per-context token allow-lists.

use crate::error::{ErrorKind, Result};
use crate::metadata::FileKind;
use crate::token::{
    DateFormat, DateSource, Digits, Field, FileField, ImageNumberPart, LetterCase, ListKind, MetaField, NameContext,
    SequenceKind, Subfield, TextCase, Token, TokenList,
};
use std::collections::HashMap;

/// Identifies a token independently of its subfield and (for text) its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Text,
    Separator,
    JobCode,
    Field(Field),
    Sequence(SequenceKind),
}

impl Key {
    fn of(token: &Token) -> (Self, Option<Subfield>) {
        match token {
            Token::Text(_) => (Key::Text, None),
            Token::Separator => (Key::Separator, None),
            Token::JobCode => (Key::JobCode, None),
            Token::Metadata { field, subfield } => (Key::Field(*field), *subfield),
            Token::Sequence { kind, subfield } => (Key::Sequence(*kind), *subfield),
        }
    }
}

/// The tokens (and subfields) permitted in one [`NameContext`].
///
/// Built once per context and used to reject unusable preferences when they
/// are loaded, rather than discovering the problem file by file.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    context: NameContext,
    allowed: HashMap<Key, Vec<Subfield>>,
}

impl TokenConfig {
    pub fn for_context(context: NameContext) -> Self {
        let kind = context.file_kind();
        let mut allowed = HashMap::new();
        allowed.insert(Key::Text, vec![]);
        allowed.insert(Key::JobCode, vec![]);

        let all_dates = || DateFormat::ALL.iter().copied().map(Subfield::Date);
        let cases = || TextCase::ALL.iter().copied().map(Subfield::Case);
        let capture = match kind {
            FileKind::Photo => DateSource::ImageDate,
            FileKind::Video => DateSource::VideoDate,
        };
        allowed.insert(Key::Field(Field::Date(capture)), all_dates().collect());
        for source in [DateSource::Today, DateSource::Yesterday, DateSource::DownloadTime] {
            let formats = all_dates().filter(|s| *s != Subfield::Date(DateFormat::Subseconds)).collect();
            allowed.insert(Key::Field(Field::Date(source)), formats);
        }

        for field in MetaField::ALL.iter().filter(|f| f.applies_to(kind)) {
            let subfields = match field {
                f if f.is_text() => cases().collect(),
                MetaField::ShutterCount => Digits::ALL.iter().copied().map(Subfield::Digits).collect(),
                _ => vec![],
            };
            allowed.insert(Key::Field(Field::Meta(*field)), subfields);
        }

        match context.list_kind() {
            ListKind::Subfolder => {
                allowed.insert(Key::Separator, vec![]);
                allowed.insert(Key::Field(Field::File(FileField::Extension)), cases().collect());
            },
            ListKind::Filename => {
                for field in [FileField::NameExtension, FileField::Name, FileField::Extension] {
                    allowed.insert(Key::Field(Field::File(field)), cases().collect());
                }
                let parts = ImageNumberPart::ALL.iter().copied().map(Subfield::ImageNumber).collect();
                allowed.insert(Key::Field(Field::File(FileField::ImageNumber)), parts);
                for sequence in SequenceKind::ALL {
                    let subfields = match sequence {
                        SequenceKind::Letter => LetterCase::ALL.iter().copied().map(Subfield::Letter).collect(),
                        _ => Digits::ALL.iter().copied().map(Subfield::Digits).collect(),
                    };
                    allowed.insert(Key::Sequence(*sequence), subfields);
                }
            },
        }
        Self { context, allowed }
    }

    pub fn context(&self) -> NameContext {
        self.context
    }

    /// Whether a single token may be used in this context.
    pub fn allows(&self, token: &Token) -> bool {
        let (key, subfield) = Key::of(token);
        match (self.allowed.get(&key), subfield) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(subfields), Some(s)) => subfields.contains(&s),
        }
    }

    /// Checks that a token list is of the right kind and only uses tokens
    /// permitted in this context.
    ///
    /// # Errors
    /// [`ErrorKind::InvalidTokenList`] for a list of the wrong kind, or
    /// [`ErrorKind::InvalidToken`] naming the first offending token.
    pub fn validate(&self, list: &TokenList) -> Result<()> {
        if list.kind() != self.context.list_kind() {
            exn::bail!(ErrorKind::InvalidTokenList {
                expected: self.context.list_kind(),
                found: list.kind(),
            });
        }
        if let Some((position, token)) = list.tokens().iter().enumerate().find(|(_, t)| !self.allows(t)) {
            exn::bail!(ErrorKind::InvalidToken {
                position,
                token: token.to_string(),
                context: self.context,
            });
        }
        Ok(())
    }
}
