//! Picker configuration.
//!
//! ## Usage
//!
//! Build a [`CalendarConfig`] in code with its setters, or load one from TOML:
//!
//! ```
//! use brickclay_calendar::CalendarConfig;
//!
//! let config = CalendarConfig::from_toml_str(
//!     r#"
//!     dual_calendar = true
//!     auto_apply = true
//!     display_format = "DD MMM YYYY"
//!
//!     [[ranges]]
//!     name = "Q1"
//!     start = "2024-01-01"
//!     end = "2024-03-31"
//!     "#,
//! )
//! .unwrap();
//! assert!(config.dual_calendar);
//! assert_eq!(config.ranges.len(), 1);
//! ```

use std::path::Path;

use chrono::NaiveDate;
use derive_setters::Setters;
use serde::Deserialize;

use crate::{
    error::{CalendarError, Result},
    format::DisplayFormat,
    presets::{CUSTOM_RANGE, NamedRange},
    selection::{DateBounds, SelectionMode},
};

/// Clock convention used by time pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TimeFormat {
    /// `1..=12` with AM/PM.
    #[default]
    #[serde(rename = "12")]
    TwelveHour,
    /// `0..=23`.
    #[serde(rename = "24")]
    TwentyFourHour,
}

impl TimeFormat {
    /// Whether hours are shown as `1..=12` with AM/PM.
    pub fn is_twelve_hour(self) -> bool {
        self == TimeFormat::TwelveHour
    }
}

/// Every input a date-range picker accepts.
///
/// The selection mode is derived from `single_date_picker` and
/// `multi_date_selection`; multi-date wins when both are set.
#[derive(Debug, Clone, PartialEq, Deserialize, Setters)]
#[serde(default)]
#[setters(into)]
pub struct CalendarConfig {
    /// Each click selects exactly one date.
    pub single_date_picker: bool,
    /// Each click toggles a date in a sorted list.
    pub multi_date_selection: bool,
    /// Show two independently navigable month grids.
    pub dual_calendar: bool,
    /// Compose a time of day onto selected dates.
    pub enable_timepicker: bool,
    /// Show and compose seconds as well.
    pub enable_seconds: bool,
    /// Keep the right grid one month after the left while navigating.
    pub linked_calendars: bool,
    /// Keep the literal click order of range ends instead of swapping.
    pub custom_range_direction: bool,
    /// Commit the selection as soon as it is complete.
    pub auto_apply: bool,
    /// Close the popup after an automatic commit.
    pub close_on_auto_apply: bool,
    /// Render the calendar in place instead of as a popup.
    pub inline: bool,
    /// Show the preset list next to the grids.
    pub show_ranges: bool,
    /// Clock convention for time editing.
    pub time_format: TimeFormat,
    /// Text shown when nothing is selected.
    pub placeholder: String,
    /// Pattern used to render the selection.
    pub display_format: DisplayFormat,
    /// Earliest selectable day (inclusive).
    #[setters(strip_option)]
    pub min_date: Option<NaiveDate>,
    /// Latest selectable day (inclusive).
    #[setters(strip_option)]
    pub max_date: Option<NaiveDate>,
    /// Consumer presets; empty means the built-in set.
    pub ranges: Vec<NamedRange>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            single_date_picker: false,
            multi_date_selection: false,
            dual_calendar: false,
            enable_timepicker: false,
            enable_seconds: false,
            linked_calendars: false,
            custom_range_direction: false,
            auto_apply: false,
            close_on_auto_apply: false,
            inline: false,
            show_ranges: true,
            time_format: TimeFormat::default(),
            placeholder: "Select date range".to_string(),
            display_format: DisplayFormat::default(),
            min_date: None,
            max_date: None,
            ranges: Vec::new(),
        }
    }
}

impl CalendarConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| CalendarError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        tracing::debug!(path = %path.display(), "loading calendar config");
        Self::from_toml_str(&text)
    }

    /// Checks bounds and presets.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(CalendarError::InvalidBounds { min, max });
            }
        }
        for range in &self.ranges {
            if range.is_custom_placeholder() {
                return Err(CalendarError::ReservedPreset(CUSTOM_RANGE.to_string()));
            }
            if range.start > range.end {
                return Err(CalendarError::InvertedPreset {
                    name: range.name.clone(),
                    start: range.start,
                    end: range.end,
                });
            }
        }
        if self.single_date_picker && self.multi_date_selection {
            tracing::warn!("single_date_picker and multi_date_selection both set; using multi-date");
        }
        Ok(())
    }

    /// Inclusive selectable bounds.
    pub fn bounds(&self) -> DateBounds {
        DateBounds {
            min: self.min_date,
            max: self.max_date,
        }
    }

    /// Selection mode implied by the mode flags.
    pub fn mode(&self) -> SelectionMode {
        SelectionMode::from_flags(self.single_date_picker, self.multi_date_selection)
    }
}

/// Strictly parses an ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| CalendarError::InvalidDate {
        input: text.to_string(),
        expected: "YYYY-MM-DD",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = CalendarConfig::from_toml_str("").unwrap();
        assert_eq!(config, CalendarConfig::default());
        assert_eq!(config.display_format.pattern(), "MM/DD/YYYY");
        assert!(config.time_format.is_twelve_hour());
    }

    #[test]
    fn toml_fields_and_presets_load_in_order() {
        let config = CalendarConfig::from_toml_str(
            r#"
            multi_date_selection = true
            time_format = "24"
            min_date = "2024-01-10"
            display_format = "YYYY-MM-DD"

            [[ranges]]
            name = "Sprint"
            start = "2024-02-01"
            end = "2024-02-14"

            [[ranges]]
            name = "Today"
            start = "2024-02-20"
            end = "2024-02-20"
            "#,
        )
        .unwrap();
        assert!(config.multi_date_selection);
        assert_eq!(config.time_format, TimeFormat::TwentyFourHour);
        assert_eq!(config.min_date, Some(d(2024, 1, 10)));
        assert_eq!(config.display_format.strftime(), "%Y-%m-%d");
        let names: Vec<_> = config.ranges.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Sprint", "Today"]);
    }

    #[test]
    fn setters_build_configs() {
        let config = CalendarConfig::default()
            .dual_calendar(true)
            .min_date(d(2024, 1, 1))
            .placeholder("Pick");
        assert!(config.dual_calendar);
        assert_eq!(config.min_date, Some(d(2024, 1, 1)));
        assert_eq!(config.placeholder, "Pick");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = CalendarConfig::from_toml_str(
            "min_date = \"2024-02-01\"\nmax_date = \"2024-01-01\"",
        )
        .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidBounds { .. }));
    }

    #[test]
    fn reserved_and_inverted_presets_are_rejected() {
        let reserved = CalendarConfig::default().ranges(vec![NamedRange::new(
            CUSTOM_RANGE,
            d(2024, 1, 1),
            d(2024, 1, 2),
        )]);
        assert!(matches!(
            reserved.validate(),
            Err(CalendarError::ReservedPreset(_))
        ));
        let inverted = CalendarConfig::default().ranges(vec![NamedRange::new(
            "Backwards",
            d(2024, 1, 5),
            d(2024, 1, 2),
        )]);
        assert!(matches!(
            inverted.validate(),
            Err(CalendarError::InvertedPreset { .. })
        ));
    }

    #[test]
    fn multi_date_wins_over_single() {
        let config = CalendarConfig::default()
            .single_date_picker(true)
            .multi_date_selection(true);
        assert_eq!(config.mode(), SelectionMode::Multi);
        assert_eq!(CalendarConfig::default().mode(), SelectionMode::Range);
    }

    #[test]
    fn malformed_toml_is_a_decode_error() {
        let err = CalendarConfig::from_toml_str("dual_calendar = \"yes\"").unwrap_err();
        assert!(matches!(err, CalendarError::Decode(_)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let config = CalendarConfig::default()
            .min_date(d(2024, 1, 10))
            .max_date(d(2024, 1, 20));
        let bounds = config.bounds();
        assert!(!bounds.contains(d(2024, 1, 9)));
        assert!(bounds.contains(d(2024, 1, 10)));
        assert!(bounds.contains(d(2024, 1, 20)));
        assert!(!bounds.contains(d(2024, 1, 21)));
    }

    #[test]
    fn iso_dates_parse_strictly() {
        assert_eq!(parse_iso_date(" 2024-03-01 ").unwrap(), d(2024, 3, 1));
        assert!(matches!(
            parse_iso_date("03/01/2024"),
            Err(CalendarError::InvalidDate { .. })
        ));
    }
}
