//! Name generation for downloaded photos and videos.
//!
//! A user describes how downloaded files should be named (and which
//! subfolders they should land in) with an ordered list of [`Token`]s: literal
//! text, metadata references, sequence counters, the job code and, for
//! subfolders, path separators. This crate provides:
//!
//! - **The token vocabulary** ([`Token`], [`TokenList`]) and its preference
//!   representation as `[category, field, subfield]` string triples.
//! - **Per-context allow-lists** ([`TokenConfig`]) that reject tokens a photo
//!   name, video name, photo subfolder or video subfolder may not use.
//! - **Built-in presets** ([`preset`]) with structural preset matching.
//! - **The generator** ([`generate`]) which evaluates a token list against a
//!   [`FileContext`], degrading to empty strings and accumulating
//!   [`Problems`] instead of failing.
//! - **Sequence counters** ([`SequenceState`]) threaded through generation.

mod allow;
pub mod error;
mod format;
mod generate;
mod metadata;
pub mod preset;
mod problem;
mod sequence;
mod token;

pub use crate::allow::TokenConfig;
pub use crate::generate::{ExtensionCase, FileContext, Generated, generate};
pub use crate::metadata::{FileKind, MetadataBundle};
pub use crate::problem::{Problem, ProblemKind, Problems};
pub use crate::sequence::{
    DownloadsToday, SequenceState, SequenceValues, day_start, parse_day_start, sequence_letter,
};
pub use crate::token::{
    DateFormat, DateSource, Digits, Field, FileField, ImageNumberPart, LetterCase, ListKind, MetaField, NameContext,
    SequenceKind, Subfield, TextCase, Token, TokenList,
};
