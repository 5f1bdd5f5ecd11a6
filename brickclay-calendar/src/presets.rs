//! Named date-range presets and the matcher that labels a selection.
//!
//! ## Usage
//!
//! Build [`RangePresets::defaults`] for "today" (or [`RangePresets::from_custom`]
//! with consumer ranges) and call [`RangePresets::match_range`] whenever the
//! selection changes to learn which preset, if any, it corresponds to.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::grid::{MonthCursor, shift_months};

/// Reserved preset name signalling a selection that matches no preset.
///
/// It is listed among the presets for display but is never matched and can
/// never be chosen directly.
pub const CUSTOM_RANGE: &str = "Custom Range";

/// Display order of the built-in preset names.
pub const CANONICAL_ORDER: [&str; 7] = [
    "Today",
    "Yesterday",
    "Last 7 Days",
    "Last 30 Days",
    "This Month",
    "Last Month",
    CUSTOM_RANGE,
];

/// One named span of days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    /// Label shown in the range list.
    pub name: String,
    /// First day of the span.
    pub start: NaiveDate,
    /// Last day of the span (inclusive).
    pub end: NaiveDate,
}

impl NamedRange {
    /// Creates a named range.
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    /// Whether this entry is the reserved sentinel.
    pub fn is_custom_placeholder(&self) -> bool {
        self.name == CUSTOM_RANGE
    }
}

/// Ordered preset list, always containing the [`CUSTOM_RANGE`] placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePresets {
    ranges: Vec<NamedRange>,
}

impl RangePresets {
    /// Built-in presets relative to `today`.
    pub fn defaults(today: NaiveDate) -> Self {
        let days_back = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(today);
        let month_start = today.with_day(1).unwrap_or(today);
        let last_month_start = shift_months(month_start, -1);
        let last_month_end = month_start.pred_opt().unwrap_or(month_start);

        Self {
            ranges: vec![
                NamedRange::new("Today", today, today),
                NamedRange::new("Yesterday", days_back(1), days_back(1)),
                NamedRange::new("Last 7 Days", days_back(6), today),
                NamedRange::new("Last 30 Days", days_back(29), today),
                NamedRange::new("This Month", month_start, today),
                NamedRange::new("Last Month", last_month_start, last_month_end),
                NamedRange::new(CUSTOM_RANGE, today, today),
            ],
        }
    }

    /// Consumer-supplied presets in display order.
    ///
    /// Canonical names that are present come first in their canonical order,
    /// followed by the placeholder (added when missing) and then every other
    /// name in the order supplied. Later duplicates of a name are dropped.
    pub fn from_custom(ranges: Vec<NamedRange>, today: NaiveDate) -> Self {
        let mut unique: Vec<NamedRange> = Vec::with_capacity(ranges.len() + 1);
        for range in ranges {
            if !unique.iter().any(|r| r.name == range.name) {
                unique.push(range);
            }
        }
        if !unique.iter().any(NamedRange::is_custom_placeholder) {
            unique.push(NamedRange::new(CUSTOM_RANGE, today, today));
        }

        let mut ordered = Vec::with_capacity(unique.len());
        for name in CANONICAL_ORDER {
            if let Some(index) = unique.iter().position(|r| r.name == name) {
                ordered.push(unique.remove(index));
            }
        }
        ordered.append(&mut unique);
        Self { ranges: ordered }
    }

    /// Presets in display order, placeholder included.
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.iter()
    }

    /// Preset names in display order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|r| r.name.as_str())
    }

    /// Looks up a preset by name.
    pub fn get(&self, name: &str) -> Option<&NamedRange> {
        self.ranges.iter().find(|r| r.name == name)
    }

    /// Number of entries, placeholder included.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Always false: the placeholder is always present.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Labels a `start..=end` selection.
    ///
    /// Both ends are compared as dates only. Returns the first preset in
    /// display order with the same span, or [`CUSTOM_RANGE`] when none match.
    pub fn match_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> &str {
        self.match_dates(start.date(), end.date())
    }

    /// [`Self::match_range`] for plain dates.
    pub fn match_dates(&self, start: NaiveDate, end: NaiveDate) -> &str {
        self.ranges
            .iter()
            .filter(|r| !r.is_custom_placeholder())
            .find(|r| r.start == start && r.end == end)
            .map_or(CUSTOM_RANGE, |r| r.name.as_str())
    }
}

/// Month cursor pair a dual calendar should show for a preset span.
///
/// The left grid shows the start month; the right grid shows the end month
/// when it differs, otherwise the month after the left one.
pub fn grid_months_for(start: NaiveDate, end: NaiveDate) -> (MonthCursor, MonthCursor) {
    let left = MonthCursor::of(start);
    let right = if MonthCursor::of(end) != left {
        MonthCursor::of(end)
    } else {
        left.next()
    };
    (left, right)
}
