//! Errors raised at the fallible boundaries of the crate.
//!
//! Interactive operations on a picker never fail; invalid clicks and inputs
//! are ignored. Only configuration loading and strict parsing of externally
//! supplied strings report errors.

use std::{io, path::PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = CalendarError> = std::result::Result<T, E>;

/// Errors produced while loading configuration or parsing dates.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// The configuration text is not valid TOML for [`CalendarConfig`](crate::CalendarConfig).
    #[error("failed to decode calendar config: {0}")]
    Decode(#[from] toml::de::Error),
    /// The configuration file could not be read.
    #[error("failed to read {path}: {error}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        error: io::Error,
    },
    /// `min_date` is after `max_date`.
    #[error("min_date {min} is after max_date {max}")]
    InvalidBounds {
        /// Configured lower bound.
        min: NaiveDate,
        /// Configured upper bound.
        max: NaiveDate,
    },
    /// A preset ends before it starts.
    #[error("preset `{name}` starts on {start} but ends on {end}")]
    InvertedPreset {
        /// Preset name.
        name: String,
        /// Configured start.
        start: NaiveDate,
        /// Configured end.
        end: NaiveDate,
    },
    /// A preset tried to use the reserved placeholder name.
    #[error("`{0}` is reserved and cannot be configured as a preset")]
    ReservedPreset(String),
    /// A date string could not be parsed.
    #[error("invalid date `{input}`, expected {expected}")]
    InvalidDate {
        /// Text that was rejected.
        input: String,
        /// Human readable description of the accepted format.
        expected: &'static str,
    },
}
