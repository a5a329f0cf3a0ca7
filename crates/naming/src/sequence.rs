//! Sequence counters.
//!
//! | Counter                 | Lifetime                          | Advances                     |
//! |-------------------------|-----------------------------------|------------------------------|
//! | `downloads_today`       | persisted, resets at day start    | every placed file            |
//! | `stored_sequence_no`    | persisted for the installation    | placed files that use it     |
//! | `session_sequence_no`   | starts at 0 for each daemon       | placed files that use it     |
//! | `sequence_letter_index` | starts at 0 for each daemon       | placed files that use it     |
//! | matched values          | a single file                     | never, they are set and consumed |
//!
//! Nothing here advances by itself: callers advance counters only once a file
//! has actually been placed, so a failed placement never burns a value. The
//! second half of a RAW+JPEG pair is named with its counterpart's
//! [`SequenceValues`] and advances nothing.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(pub day_start, Time, "[hour]:[minute]");

const DAY_START: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// Parses the time a new day starts at, written as `HH:MM`.
pub fn parse_day_start(value: &str) -> Result<Time> {
    Time::parse(value.trim(), DAY_START).or_raise(|| ErrorKind::InvalidDayStart(value.to_string()))
}

/// The number of files downloaded on a given day.
///
/// A "day" starts at a configurable time rather than midnight, so a shoot
/// that runs past midnight can still count as one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadsToday {
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub count: u32,
}

impl DownloadsToday {
    pub fn new(date: Date, count: u32) -> Self {
        Self { date, count }
    }

    /// The calendar day `now` belongs to, given the time the day starts.
    pub fn effective_date(now: PrimitiveDateTime, day_start: Time) -> Date {
        match now.time() < day_start {
            true => now.date().previous_day().unwrap_or(now.date()),
            false => now.date(),
        }
    }

    /// Resets the count to zero if `now` falls on a later day than the one
    /// recorded. Returns `true` if a reset happened.
    pub fn roll(&mut self, now: PrimitiveDateTime, day_start: Time) -> bool {
        let today = Self::effective_date(now, day_start);
        if today != self.date {
            self.date = today;
            self.count = 0;
            return true;
        }
        false
    }
}

/// Converts a zero-based index into a spreadsheet-style letter sequence:
/// `A`, `B`, ... `Z`, `AA`, `AB`, ... `ZZ`, `AAA`, ...
pub fn sequence_letter(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        // Infallible: n % 26 always fits in a u8.
        letters.push(char::from(b'A' + u8::try_from(n % 26).unwrap_or(0)));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// The value of every counter at the moment a file was named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SequenceValues {
    pub downloads_today: u32,
    pub stored: u32,
    pub session: u32,
    pub letter_index: u32,
}

/// The counters threaded through name generation for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceState {
    downloads_today: DownloadsToday,
    stored_sequence_no: u32,
    session_sequence_no: u32,
    sequence_letter_index: u32,
    matched: Option<SequenceValues>,
}

impl SequenceState {
    /// Restores the persisted counters. Session-scoped counters start at zero.
    pub fn new(downloads_today: DownloadsToday, stored_sequence_no: u32) -> Self {
        Self {
            downloads_today,
            stored_sequence_no,
            session_sequence_no: 0,
            sequence_letter_index: 0,
            matched: None,
        }
    }

    pub fn downloads_today(&self) -> DownloadsToday {
        self.downloads_today
    }

    pub fn stored_sequence_no(&self) -> u32 {
        self.stored_sequence_no
    }

    pub fn session_sequence_no(&self) -> u32 {
        self.session_sequence_no
    }

    pub fn sequence_letter_index(&self) -> u32 {
        self.sequence_letter_index
    }

    pub fn sequence_letter(&self) -> String {
        sequence_letter(self.sequence_letter_index)
    }

    /// Called once when a session starts. See [`DownloadsToday::roll`].
    pub fn roll_downloads_today(&mut self, now: PrimitiveDateTime, day_start: Time) {
        if self.downloads_today.roll(now, day_start) {
            tracing::debug!(date = %self.downloads_today.date, "New day; downloads today reset");
        }
    }

    /// Advances the session number and/or sequence letter, each only if a
    /// name actually used it.
    pub fn increment(&mut self, uses_session: bool, uses_letter: bool) {
        if uses_session {
            self.session_sequence_no = self.session_sequence_no.saturating_add(1);
        }
        if uses_letter {
            self.sequence_letter_index = self.sequence_letter_index.saturating_add(1);
        }
    }

    pub fn bump_stored(&mut self, uses_stored: bool) {
        if uses_stored {
            self.stored_sequence_no = self.stored_sequence_no.saturating_add(1);
        }
    }

    pub fn increment_downloads_today(&mut self) {
        self.downloads_today.count = self.downloads_today.count.saturating_add(1);
    }

    /// The live counters.
    pub fn current(&self) -> SequenceValues {
        SequenceValues {
            downloads_today: self.downloads_today.count,
            stored: self.stored_sequence_no,
            session: self.session_sequence_no,
            letter_index: self.sequence_letter_index,
        }
    }

    /// What the next name is generated with: the matched values if set,
    /// otherwise the live counters.
    pub fn values(&self) -> SequenceValues {
        self.matched.unwrap_or_else(|| self.current())
    }

    pub fn set_matched(&mut self, values: SequenceValues) {
        self.matched = Some(values);
    }

    pub fn matched(&self) -> Option<SequenceValues> {
        self.matched
    }

    /// Takes the matched values, leaving the slot empty for the next file.
    pub fn consume_matched(&mut self) -> Option<SequenceValues> {
        self.matched.take()
    }
}
