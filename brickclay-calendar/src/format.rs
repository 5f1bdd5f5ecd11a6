//! Display formatting for selections.
//!
//! ## Usage
//!
//! Patterns use the moment-style tokens people already write in date-picker
//! configs (`MM/DD/YYYY`, `DD MMM YYYY`, `[Week of] D MMMM`). A
//! [`DisplayFormat`] compiles the pattern into a chrono format string once.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pattern used when the consumer does not supply one.
pub const DEFAULT_DISPLAY_FORMAT: &str = "MM/DD/YYYY";

/// Separator placed between the start and end of a range.
pub const RANGE_SEPARATOR: &str = " - ";

// Longest tokens first so `MMMM` wins over `MM`.
const TOKENS: [(&str, &str); 20] = [
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

/// A compiled display pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    pattern: String,
    compiled: String,
}

impl DisplayFormat {
    /// Compiles a moment-style pattern.
    ///
    /// Text inside `[...]` is copied literally; any character that is not
    /// part of a token is copied as-is.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let compiled = compile(&pattern);
        Self { pattern, compiled }
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The chrono format string the pattern compiles to.
    pub fn strftime(&self) -> &str {
        &self.compiled
    }

    /// Formats a date.
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.compiled).to_string()
    }

    /// Formats the date part of a date-time.
    pub fn format(&self, value: NaiveDateTime) -> String {
        value.format(&self.compiled).to_string()
    }
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_FORMAT)
    }
}

impl fmt::Debug for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DisplayFormat").field(&self.pattern).finish()
    }
}

impl Serialize for DisplayFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pattern)
    }
}

impl<'de> Deserialize<'de> for DisplayFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl From<&str> for DisplayFormat {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

fn compile(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while let Some(ch) = rest.chars().next() {
        if ch == '[' {
            if let Some(close) = rest.find(']') {
                push_literal(&mut out, &rest[1..close]);
                rest = &rest[close + 1..];
                continue;
            }
        }
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        push_literal(&mut out, &rest[..ch.len_utf8()]);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn push_literal(out: &mut String, literal: &str) {
    for ch in literal.chars() {
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
    }
}

/// `HH:mm` or `HH:mm:ss` suffix for a date-time.
pub fn clock_suffix(value: NaiveDateTime, with_seconds: bool) -> String {
    let (hour, minute) = (value.hour(), value.minute());
    if with_seconds {
        format!("{hour:02}:{minute:02}:{:02}", value.second())
    } else {
        format!("{hour:02}:{minute:02}")
    }
}
