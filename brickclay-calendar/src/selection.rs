//! The selection state machine behind every picker.
//!
//! ## Usage
//!
//! [`SelectionState::click`] interprets one day click for the active
//! [`SelectionMode`] and reports what happened as a [`ClickOutcome`]; the
//! picker uses the outcome to reposition grids, compose times and emit. The
//! highlight queries ([`SelectionState::is_selected`],
//! [`SelectionState::is_in_range`]) are what a renderer asks for each cell.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::presets::{CUSTOM_RANGE, RangePresets};

/// How day clicks are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionMode {
    /// Every click replaces the selected date.
    Single,
    /// Clicks alternate between starting and completing a range.
    #[default]
    Range,
    /// Every click toggles a date in a sorted list.
    Multi,
}

impl SelectionMode {
    /// Mode implied by the two mode flags; multi-date wins over single.
    pub fn from_flags(single_date_picker: bool, multi_date_selection: bool) -> Self {
        if multi_date_selection {
            SelectionMode::Multi
        } else if single_date_picker {
            SelectionMode::Single
        } else {
            SelectionMode::Range
        }
    }
}

/// Inclusive `[min, max]` day bounds; `None` leaves a side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateBounds {
    /// Earliest selectable day.
    pub min: Option<NaiveDate>,
    /// Latest selectable day.
    pub max: Option<NaiveDate>,
}

impl DateBounds {
    /// Whether `date` is selectable.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min.is_none_or(|min| date >= min) && self.max.is_none_or(|max| date <= max)
    }
}

/// Snapshot of a selection, as emitted to listeners.
///
/// Values are copies; later changes to the picker never reach a snapshot
/// that was already handed out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarSelection {
    /// Start of the range, or the single selected date.
    pub start_date: Option<NaiveDateTime>,
    /// End of the range.
    pub end_date: Option<NaiveDateTime>,
    /// Sorted dates of a multi-date selection; `None` outside that mode.
    pub selected_dates: Option<Vec<NaiveDateTime>>,
}

impl CalendarSelection {
    /// A `start..=end` range.
    pub fn range(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            selected_dates: None,
        }
    }

    /// A single date.
    pub fn single(date: NaiveDateTime) -> Self {
        Self {
            start_date: Some(date),
            end_date: None,
            selected_dates: None,
        }
    }

    /// A multi-date list.
    pub fn dates(dates: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        let mut dates: Vec<_> = dates.into_iter().collect();
        dates.sort();
        Self {
            start_date: dates.first().copied(),
            end_date: dates.last().copied(),
            selected_dates: Some(dates),
        }
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.selected_dates.as_ref().is_none_or(Vec::is_empty)
    }
}

/// What a day click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The day was outside the bounds; nothing changed.
    Rejected,
    /// Single mode replaced the selected date.
    Single,
    /// Range mode started a new range at the clicked day.
    RangeStarted,
    /// Range mode completed the range.
    RangeCompleted {
        /// The click was earlier than the start, so the ends were exchanged.
        swapped: bool,
    },
    /// Multi-date mode toggled the clicked day.
    MultiToggled {
        /// Whether the day was added (as opposed to removed).
        added: bool,
    },
}

/// Live selection of one picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    selected_dates: Vec<NaiveDateTime>,
    active_key: Option<String>,
    hovered: Option<NaiveDate>,
    highlight_disabled: bool,
}

fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

impl SelectionState {
    /// Start of the range, or the single date.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    /// End of the range.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    /// Multi-date list, sorted ascending.
    pub fn selected_dates(&self) -> &[NaiveDateTime] {
        &self.selected_dates
    }

    /// Name of the matching preset, [`CUSTOM_RANGE`], or `None`.
    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    /// Day under the pointer while a range is half complete.
    pub fn hovered(&self) -> Option<NaiveDate> {
        self.hovered
    }

    /// Whether highlight queries are currently suppressed.
    pub fn highlight_disabled(&self) -> bool {
        self.highlight_disabled
    }

    /// Suppresses or restores highlighting.
    pub fn set_highlight_disabled(&mut self, disabled: bool) {
        self.highlight_disabled = disabled;
    }

    /// Interprets a click on `date`.
    ///
    /// New dates are stored at midnight; composing a time of day is left to
    /// the caller.
    pub fn click(
        &mut self,
        date: NaiveDate,
        mode: SelectionMode,
        bounds: &DateBounds,
        custom_range_direction: bool,
    ) -> ClickOutcome {
        self.hovered = None;
        if !bounds.contains(date) {
            tracing::trace!(%date, "click outside bounds ignored");
            return ClickOutcome::Rejected;
        }
        self.highlight_disabled = false;
        let value = at_midnight(date);

        match mode {
            SelectionMode::Multi => {
                let added = self.toggle_date(value);
                ClickOutcome::MultiToggled { added }
            }
            SelectionMode::Single => {
                self.start = Some(value);
                self.end = None;
                self.active_key = Some(CUSTOM_RANGE.to_string());
                ClickOutcome::Single
            }
            SelectionMode::Range => {
                self.active_key = Some(CUSTOM_RANGE.to_string());
                match (self.start, self.end) {
                    (Some(start), None) => {
                        if date < start.date() && !custom_range_direction {
                            self.end = Some(start);
                            self.start = Some(value);
                            ClickOutcome::RangeCompleted { swapped: true }
                        } else {
                            self.end = Some(value);
                            ClickOutcome::RangeCompleted { swapped: false }
                        }
                    }
                    _ => {
                        self.start = Some(value);
                        self.end = None;
                        ClickOutcome::RangeStarted
                    }
                }
            }
        }
    }

    fn toggle_date(&mut self, value: NaiveDateTime) -> bool {
        let existing = self
            .selected_dates
            .iter()
            .position(|d| d.date() == value.date());
        let added = match existing {
            Some(index) => {
                self.selected_dates.remove(index);
                false
            }
            None => {
                let index = self.selected_dates.partition_point(|d| *d < value);
                self.selected_dates.insert(index, value);
                true
            }
        };
        self.start = self.selected_dates.first().copied();
        self.end = self.selected_dates.last().copied();
        self.active_key = self.start.map(|_| CUSTOM_RANGE.to_string());
        added
    }

    /// Tracks the pointer for the range preview.
    ///
    /// Only range mode with a start and no end keeps a hovered day.
    pub fn hover(&mut self, date: Option<NaiveDate>, mode: SelectionMode) {
        self.hovered = match (mode, self.start, self.end) {
            (SelectionMode::Range, Some(_), None) => date,
            _ => None,
        };
    }

    /// Pointer left the grid.
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    /// Forgets every selected date and the active key.
    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.selected_dates.clear();
        self.active_key = None;
        self.hovered = None;
    }

    /// Selects a named preset span.
    pub fn select_preset(&mut self, name: &str, start: NaiveDate, end: NaiveDate) {
        self.start = Some(at_midnight(start));
        self.end = Some(at_midnight(end));
        self.selected_dates.clear();
        self.active_key = Some(name.to_string());
        self.hovered = None;
    }

    /// Replaces the selection with an externally supplied value.
    pub fn replace(&mut self, selection: &CalendarSelection) {
        self.start = selection.start_date;
        self.end = selection.end_date;
        self.selected_dates = selection.selected_dates.clone().unwrap_or_default();
        self.selected_dates.sort();
        self.hovered = None;
        if self.start.is_none() && self.end.is_none() && self.selected_dates.is_empty() {
            self.active_key = None;
        }
    }

    /// Re-labels a complete range with the first matching preset.
    ///
    /// Does nothing unless both ends are set.
    pub fn rematch(&mut self, presets: &RangePresets) {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            self.active_key = Some(presets.match_range(start, end).to_string());
        }
    }

    /// Rewrites the time of day of the start date.
    pub fn set_start_time(&mut self, time: NaiveTime) {
        self.start = self.start.map(|d| d.date().and_time(time));
    }

    /// Rewrites the time of day of the end date.
    pub fn set_end_time(&mut self, time: NaiveTime) {
        self.end = self.end.map(|d| d.date().and_time(time));
    }

    /// Snapshot for listeners; `selected_dates` is filled in multi-date mode.
    pub fn snapshot(&self, mode: SelectionMode) -> CalendarSelection {
        CalendarSelection {
            start_date: self.start,
            end_date: self.end,
            selected_dates: (mode == SelectionMode::Multi).then(|| self.selected_dates.clone()),
        }
    }

    /// Whether `date` is in the multi-date list.
    pub fn is_multi_selected(&self, date: NaiveDate) -> bool {
        self.selected_dates.iter().any(|d| d.date() == date)
    }

    /// Whether the cell for `date` is drawn as a selected anchor.
    ///
    /// With nothing selected, `today` is highlighted instead.
    pub fn is_selected(
        &self,
        date: NaiveDate,
        mode: SelectionMode,
        today: NaiveDate,
        bounds: &DateBounds,
    ) -> bool {
        if self.highlight_disabled {
            return false;
        }
        if mode == SelectionMode::Multi {
            return self.is_multi_selected(date);
        }
        let Some(start) = self.start.map(|d| d.date()) else {
            return date == today;
        };
        if !bounds.contains(date) {
            return false;
        }
        if mode == SelectionMode::Single {
            return date == start;
        }
        match (self.end, self.hovered) {
            (Some(end), _) => date == start || date == end.date(),
            (None, Some(hovered)) => date == start || date == hovered,
            (None, None) => date == start,
        }
    }

    /// Whether the cell for `date` gets the soft in-range highlight.
    ///
    /// Ends are exclusive. A half-complete range previews up to the hovered
    /// day in either direction.
    pub fn is_in_range(&self, date: NaiveDate, mode: SelectionMode) -> bool {
        if self.highlight_disabled || mode != SelectionMode::Range {
            return false;
        }
        let Some(start) = self.start.map(|d| d.date()) else {
            return false;
        };
        let other = match (self.end, self.hovered) {
            (Some(end), _) => end.date(),
            (None, Some(hovered)) => hovered,
            (None, None) => return false,
        };
        let (low, high) = if other < start {
            (other, start)
        } else {
            (start, other)
        };
        date > low && date < high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn open() -> DateBounds {
        DateBounds::default()
    }

    #[test]
    fn earlier_second_click_swaps_ends() {
        let mut state = SelectionState::default();
        let first = state.click(d(2024, 3, 10), SelectionMode::Range, &open(), false);
        assert_eq!(first, ClickOutcome::RangeStarted);
        assert_eq!(state.start().map(|s| s.date()), Some(d(2024, 3, 10)));
        assert_eq!(state.end(), None);

        let second = state.click(d(2024, 3, 5), SelectionMode::Range, &open(), false);
        assert_eq!(second, ClickOutcome::RangeCompleted { swapped: true });
        assert_eq!(state.start().map(|s| s.date()), Some(d(2024, 3, 5)));
        assert_eq!(state.end().map(|s| s.date()), Some(d(2024, 3, 10)));
        assert_eq!(state.active_key(), Some(CUSTOM_RANGE));
    }

    #[test]
    fn custom_direction_keeps_click_order() {
        let mut state = SelectionState::default();
        state.click(d(2024, 3, 10), SelectionMode::Range, &open(), true);
        let outcome = state.click(d(2024, 3, 5), SelectionMode::Range, &open(), true);
        assert_eq!(outcome, ClickOutcome::RangeCompleted { swapped: false });
        assert_eq!(state.start().map(|s| s.date()), Some(d(2024, 3, 10)));
        assert_eq!(state.end().map(|s| s.date()), Some(d(2024, 3, 5)));
    }

    #[test]
    fn third_click_restarts_the_range() {
        let mut state = SelectionState::default();
        state.click(d(2024, 3, 1), SelectionMode::Range, &open(), false);
        state.click(d(2024, 3, 4), SelectionMode::Range, &open(), false);
        let outcome = state.click(d(2024, 3, 20), SelectionMode::Range, &open(), false);
        assert_eq!(outcome, ClickOutcome::RangeStarted);
        assert_eq!(state.start().map(|s| s.date()), Some(d(2024, 3, 20)));
        assert_eq!(state.end(), None);
    }

    #[test]
    fn multi_date_clicks_toggle_membership() {
        let mut state = SelectionState::default();
        for day in [3, 7, 3] {
            state.click(d(2024, 5, day), SelectionMode::Multi, &open(), false);
        }
        let dates: Vec<_> = state.selected_dates().iter().map(|d| d.date()).collect();
        assert_eq!(dates, vec![d(2024, 5, 7)]);
        assert_eq!(state.start().map(|s| s.date()), Some(d(2024, 5, 7)));
        assert_eq!(state.end().map(|s| s.date()), Some(d(2024, 5, 7)));

        state.click(d(2024, 5, 7), SelectionMode::Multi, &open(), false);
        assert!(state.selected_dates().is_empty());
        assert_eq!(state.start(), None);
        assert_eq!(state.active_key(), None);
    }

    #[test]
    fn multi_date_list_stays_sorted() {
        let mut state = SelectionState::default();
        for day in [20, 2, 11] {
            state.click(d(2024, 5, day), SelectionMode::Multi, &open(), false);
        }
        let dates: Vec<_> = state.selected_dates().iter().map(|d| d.date()).collect();
        assert_eq!(dates, vec![d(2024, 5, 2), d(2024, 5, 11), d(2024, 5, 20)]);
        let snapshot = state.snapshot(SelectionMode::Multi);
        assert_eq!(snapshot.selected_dates.map(|v| v.len()), Some(3));
        assert_eq!(state.snapshot(SelectionMode::Range).selected_dates, None);
    }

    #[test]
    fn out_of_bounds_click_is_rejected() {
        let bounds = DateBounds {
            min: Some(d(2024, 1, 10)),
            max: None,
        };
        let mut state = SelectionState::default();
        let outcome = state.click(d(2024, 1, 5), SelectionMode::Range, &bounds, false);
        assert_eq!(outcome, ClickOutcome::Rejected);
        assert_eq!(state, SelectionState::default());
    }

    #[test]
    fn single_mode_replaces_the_date() {
        let mut state = SelectionState::default();
        state.click(d(2024, 2, 1), SelectionMode::Single, &open(), false);
        let outcome = state.click(d(2024, 2, 9), SelectionMode::Single, &open(), false);
        assert_eq!(outcome, ClickOutcome::Single);
        assert_eq!(state.start().map(|s| s.date()), Some(d(2024, 2, 9)));
        assert_eq!(state.end(), None);
    }

    #[test]
    fn hover_preview_only_for_half_complete_ranges() {
        let mut state = SelectionState::default();
        state.hover(Some(d(2024, 3, 8)), SelectionMode::Range);
        assert_eq!(state.hovered(), None);

        state.click(d(2024, 3, 10), SelectionMode::Range, &open(), false);
        state.hover(Some(d(2024, 3, 6)), SelectionMode::Single);
        assert_eq!(state.hovered(), None);
        state.hover(Some(d(2024, 3, 6)), SelectionMode::Range);
        assert_eq!(state.hovered(), Some(d(2024, 3, 6)));

        // Preview works backwards from the start too.
        assert!(state.is_in_range(d(2024, 3, 8), SelectionMode::Range));
        assert!(!state.is_in_range(d(2024, 3, 6), SelectionMode::Range));
        assert!(state.is_selected(d(2024, 3, 6), SelectionMode::Range, d(2024, 1, 1), &open()));

        state.leave();
        assert!(!state.is_in_range(d(2024, 3, 8), SelectionMode::Range));
    }

    #[test]
    fn highlight_queries_for_complete_range() {
        let today = d(2024, 3, 1);
        let mut state = SelectionState::default();
        assert!(state.is_selected(today, SelectionMode::Range, today, &open()));

        state.click(d(2024, 3, 5), SelectionMode::Range, &open(), false);
        state.click(d(2024, 3, 9), SelectionMode::Range, &open(), false);
        assert!(!state.is_selected(today, SelectionMode::Range, today, &open()));
        assert!(state.is_selected(d(2024, 3, 5), SelectionMode::Range, today, &open()));
        assert!(state.is_selected(d(2024, 3, 9), SelectionMode::Range, today, &open()));
        assert!(!state.is_in_range(d(2024, 3, 5), SelectionMode::Range));
        assert!(state.is_in_range(d(2024, 3, 6), SelectionMode::Range));
        assert!(!state.is_in_range(d(2024, 3, 9), SelectionMode::Range));
        assert!(!state.is_in_range(d(2024, 3, 6), SelectionMode::Single));

        state.set_highlight_disabled(true);
        assert!(!state.is_selected(d(2024, 3, 5), SelectionMode::Range, today, &open()));
        assert!(!state.is_in_range(d(2024, 3, 6), SelectionMode::Range));

        // A new click re-enables highlighting.
        state.click(d(2024, 3, 12), SelectionMode::Range, &open(), false);
        assert!(!state.highlight_disabled());
    }

    #[test]
    fn rematch_needs_both_ends() {
        let today = d(2024, 1, 15);
        let presets = RangePresets::defaults(today);
        let mut state = SelectionState::default();
        state.click(today, SelectionMode::Range, &open(), false);
        state.rematch(&presets);
        assert_eq!(state.active_key(), Some(CUSTOM_RANGE));
        state.click(today, SelectionMode::Range, &open(), false);
        state.rematch(&presets);
        assert_eq!(state.active_key(), Some("Today"));
    }

    #[test]
    fn snapshots_do_not_follow_later_edits() {
        let mut state = SelectionState::default();
        state.click(d(2024, 3, 5), SelectionMode::Single, &open(), false);
        let before = state.snapshot(SelectionMode::Single);
        state.set_start_time(NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(before.start_date, Some(d(2024, 3, 5).and_time(NaiveTime::MIN)));
        assert_eq!(
            state.start(),
            Some(d(2024, 3, 5).and_hms_opt(14, 30, 0).unwrap())
        );
    }
}
