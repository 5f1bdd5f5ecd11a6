//! Scheduling picker with single, multiple and range tabs.
//!
//! ## Usage
//!
//! [`ScheduledDatePicker`] owns one inline [`DateRangePicker`] per tab and
//! attaches a time-of-day window (or an all-day flag) to whatever the active
//! tab selects. Every change is reported as a [`ScheduledSelection`].
//!
//! ```
//! use brickclay_calendar::schedule::{ScheduleTab, ScheduledDatePicker};
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let mut schedule = ScheduledDatePicker::new().with_today(today);
//! schedule.set_tab(ScheduleTab::Range);
//! schedule.select_date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
//! schedule.select_date(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());
//! schedule.toggle_range_all_day();
//! let range = schedule.selection().date_range.unwrap();
//! assert_eq!(range.end_date.to_string(), "2024-06-05 23:59:59.999");
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    callback::{Callback, CallbackWith},
    config::{CalendarConfig, TimeFormat},
    format::DisplayFormat,
    picker::DateRangePicker,
    selection::CalendarSelection,
    time::TimeOfDay,
    time_picker::{TimePickerGroup, TimePickerState},
};

const DEFAULT_START_TIME: &str = "1:00 AM";
const DEFAULT_END_TIME: &str = "2:00 AM";

/// Which kind of schedule is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleTab {
    /// One day with a time window.
    #[default]
    Single,
    /// Several days, each with its own time window.
    Multiple,
    /// A span of days with one time window.
    Range,
}

/// Time window of one day in a multiple-date schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeConfiguration {
    /// The day, carrying the start time unless `all_day`.
    pub date: NaiveDateTime,
    /// Covers the whole day.
    pub all_day: bool,
    /// Start time as shown by the time picker.
    pub start_time: String,
    /// End time as shown by the time picker.
    pub end_time: String,
}

impl TimeConfiguration {
    fn new(date: NaiveDateTime) -> Self {
        Self {
            date,
            all_day: false,
            start_time: DEFAULT_START_TIME.to_string(),
            end_time: DEFAULT_END_TIME.to_string(),
        }
    }
}

/// A start/end pair with the settings that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledSpan {
    /// First instant.
    pub start_date: NaiveDateTime,
    /// Last instant.
    pub end_date: NaiveDateTime,
    /// Whether the span covers whole days.
    pub all_day: bool,
    /// Start time as shown by the time picker.
    pub start_time: String,
    /// End time as shown by the time picker.
    pub end_time: String,
}

/// What a scheduling picker reports.
///
/// Only the field belonging to `mode` is filled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScheduledSelection {
    /// Tab that produced the value.
    pub mode: ScheduleTab,
    /// Single-tab value.
    pub single_date: Option<ScheduledSpan>,
    /// Multiple-tab value.
    pub multiple_dates: Option<Vec<TimeConfiguration>>,
    /// Range-tab value.
    pub date_range: Option<ScheduledSpan>,
}

fn clock(text: &str) -> NaiveTime {
    let parsed = TimeOfDay::parse_lenient(text);
    NaiveTime::from_hms_opt(u32::from(parsed.hour_24()), u32::from(parsed.minute()), 0)
        .unwrap_or(NaiveTime::MIN)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// `Mar 7, 2024`, the label used next to each scheduled day.
pub fn format_schedule_date(date: NaiveDate) -> String {
    DisplayFormat::new("MMM D, YYYY").format_date(date)
}

struct TabPicker {
    picker: DateRangePicker,
    pending: Arc<Mutex<Option<CalendarSelection>>>,
}

impl TabPicker {
    fn new(config: CalendarConfig, today: NaiveDate) -> Self {
        let pending = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&pending);
        let picker = DateRangePicker::new(config.inline(true))
            .with_today(today)
            .on_selected(move |selection: CalendarSelection| {
                *sink.lock() = Some(selection);
            });
        Self { picker, pending }
    }

    fn click(&mut self, date: NaiveDate) -> Option<CalendarSelection> {
        self.picker.select_date(date);
        self.pending.lock().take()
    }

    fn reset(&mut self) {
        self.picker.set_selected_value(CalendarSelection::default());
        self.pending.lock().take();
    }
}

/// Tabbed scheduling picker.
pub struct ScheduledDatePicker {
    tab: ScheduleTab,
    time_format: TimeFormat,
    enable_seconds: bool,
    time_pickers: TimePickerGroup,

    single_picker: TabPicker,
    multiple_picker: TabPicker,
    range_picker: TabPicker,

    single_date: Option<NaiveDateTime>,
    single_all_day: bool,
    single_start_time: String,
    single_end_time: String,

    multiple_dates: Vec<TimeConfiguration>,

    range_start: Option<NaiveDateTime>,
    range_end: Option<NaiveDateTime>,
    range_all_day: bool,
    range_start_time: String,
    range_end_time: String,

    on_scheduled: Option<CallbackWith<ScheduledSelection>>,
    on_cleared: Option<Callback>,
}

impl Default for ScheduledDatePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduledDatePicker {
    /// Creates an empty scheduling picker on the single tab.
    pub fn new() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            tab: ScheduleTab::Single,
            time_format: TimeFormat::TwelveHour,
            enable_seconds: false,
            time_pickers: TimePickerGroup::default(),
            single_picker: TabPicker::new(CalendarConfig::default().single_date_picker(true), today),
            multiple_picker: TabPicker::new(
                CalendarConfig::default().multi_date_selection(true),
                today,
            ),
            range_picker: TabPicker::new(CalendarConfig::default(), today),
            single_date: None,
            single_all_day: false,
            single_start_time: DEFAULT_START_TIME.to_string(),
            single_end_time: DEFAULT_END_TIME.to_string(),
            multiple_dates: Vec::new(),
            range_start: None,
            range_end: None,
            range_all_day: false,
            range_start_time: DEFAULT_START_TIME.to_string(),
            range_end_time: DEFAULT_END_TIME.to_string(),
            on_scheduled: None,
            on_cleared: None,
        }
    }

    /// Pins "today" for the embedded calendars.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        for tab in [
            &mut self.single_picker,
            &mut self.multiple_picker,
            &mut self.range_picker,
        ] {
            tab.picker.set_today(today);
        }
        self
    }

    /// Clock convention for the embedded time pickers.
    pub fn time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    /// Shows seconds in the embedded time pickers.
    pub fn enable_seconds(mut self, enable_seconds: bool) -> Self {
        self.enable_seconds = enable_seconds;
        self
    }

    /// Called with every schedule change.
    pub fn on_scheduled(mut self, callback: impl Into<CallbackWith<ScheduledSelection>>) -> Self {
        self.on_scheduled = Some(callback.into());
        self
    }

    /// Called by [`Self::clear`].
    pub fn on_cleared(mut self, callback: impl Into<Callback>) -> Self {
        self.on_cleared = Some(callback.into());
        self
    }

    /// Active tab.
    pub fn tab(&self) -> ScheduleTab {
        self.tab
    }

    /// Switches tabs, closing any open time picker.
    ///
    /// Returns the id of the time picker that must close.
    pub fn set_tab(&mut self, tab: ScheduleTab) -> Option<String> {
        self.tab = tab;
        self.time_pickers.reset()
    }

    /// Calendar embedded in `tab`.
    pub fn calendar(&self, tab: ScheduleTab) -> &DateRangePicker {
        match tab {
            ScheduleTab::Single => &self.single_picker.picker,
            ScheduleTab::Multiple => &self.multiple_picker.picker,
            ScheduleTab::Range => &self.range_picker.picker,
        }
    }

    /// Builds the state of an embedded time picker showing `value`.
    pub fn time_picker(&self, id: impl Into<String>, value: &str) -> TimePickerState {
        TimePickerState::new(
            id,
            value,
            !self.time_format.is_twelve_hour(),
            self.enable_seconds,
        )
    }

    /// An embedded time picker opened; returns the id of one that must close.
    pub fn time_picker_opened(&mut self, id: &str) -> Option<String> {
        self.time_pickers.opened(id)
    }

    /// An embedded time picker closed.
    pub fn time_picker_closed(&mut self, id: &str) {
        self.time_pickers.closed(id);
    }

    /// Forwards a day click to the calendar of the active tab.
    pub fn select_date(&mut self, date: NaiveDate) {
        let emitted = match self.tab {
            ScheduleTab::Single => self.single_picker.click(date),
            ScheduleTab::Multiple => self.multiple_picker.click(date),
            ScheduleTab::Range => self.range_picker.click(date),
        };
        let Some(selection) = emitted else {
            return;
        };
        match self.tab {
            ScheduleTab::Single => self.single_date_selected(&selection),
            ScheduleTab::Multiple => self.multiple_dates_selected(&selection),
            ScheduleTab::Range => self.range_selected(&selection),
        }
    }

    // Single tab

    /// The single-tab calendar emitted `selection`.
    pub fn single_date_selected(&mut self, selection: &CalendarSelection) {
        match selection.start_date {
            Some(start) => {
                self.single_date = Some(start);
                if !self.single_all_day {
                    self.update_single_time();
                }
                self.emit();
            }
            None => self.single_date = None,
        }
    }

    /// Flips the single-tab all-day flag.
    pub fn toggle_single_all_day(&mut self) {
        self.single_all_day = !self.single_all_day;
        if self.single_date.is_some() {
            self.update_single_time();
            self.emit();
        }
    }

    /// Start time of the single tab changed.
    pub fn set_single_start_time(&mut self, time: &str) {
        self.single_start_time = time.to_string();
        if self.single_date.is_some() {
            self.update_single_time();
            self.emit();
        }
    }

    /// End time of the single tab changed.
    pub fn set_single_end_time(&mut self, time: &str) {
        self.single_end_time = time.to_string();
        if self.single_date.is_some() {
            self.update_single_time();
            self.emit();
        }
    }

    fn update_single_time(&mut self) {
        let time = if self.single_all_day {
            NaiveTime::MIN
        } else {
            clock(&self.single_start_time)
        };
        self.single_date = self.single_date.map(|d| d.date().and_time(time));
    }

    // Multiple tab

    /// The multiple-tab calendar emitted `selection`.
    ///
    /// Days that stay selected keep their time windows.
    pub fn multiple_dates_selected(&mut self, selection: &CalendarSelection) {
        let dates = selection.selected_dates.as_deref().unwrap_or_default();
        let mut previous = std::mem::take(&mut self.multiple_dates);
        self.multiple_dates = dates
            .iter()
            .map(|date| {
                match previous.iter().position(|c| c.date.date() == date.date()) {
                    Some(index) => previous.swap_remove(index),
                    None => TimeConfiguration::new(*date),
                }
            })
            .collect();
        self.emit();
    }

    /// Time windows of the multiple tab, in date order.
    pub fn multiple_dates(&self) -> &[TimeConfiguration] {
        &self.multiple_dates
    }

    /// Flips the all-day flag of the `index`-th day.
    pub fn toggle_multiple_all_day(&mut self, index: usize) {
        let Some(config) = self.multiple_dates.get_mut(index) else {
            return;
        };
        config.all_day = !config.all_day;
        let time = if config.all_day {
            NaiveTime::MIN
        } else {
            clock(&config.start_time)
        };
        config.date = config.date.date().and_time(time);
        self.emit();
    }

    /// Start time of the `index`-th day changed.
    pub fn set_multiple_start_time(&mut self, index: usize, time: &str) {
        let Some(config) = self.multiple_dates.get_mut(index) else {
            return;
        };
        config.start_time = time.to_string();
        if !config.all_day {
            config.date = config.date.date().and_time(clock(time));
        }
        self.emit();
    }

    /// End time of the `index`-th day changed.
    pub fn set_multiple_end_time(&mut self, index: usize, time: &str) {
        let Some(config) = self.multiple_dates.get_mut(index) else {
            return;
        };
        config.end_time = time.to_string();
        self.emit();
    }

    // Range tab

    /// The range-tab calendar emitted `selection`.
    pub fn range_selected(&mut self, selection: &CalendarSelection) {
        match (selection.start_date, selection.end_date) {
            (Some(start), Some(end)) => {
                self.range_start = Some(start);
                self.range_end = Some(end);
                if !self.range_all_day {
                    self.update_range_times();
                }
                self.emit();
            }
            _ => {
                self.range_start = None;
                self.range_end = None;
            }
        }
    }

    /// Flips the range all-day flag.
    pub fn toggle_range_all_day(&mut self) {
        self.range_all_day = !self.range_all_day;
        if self.range_start.is_some() && self.range_end.is_some() {
            self.update_range_times();
            self.emit();
        }
    }

    /// Start time of the range changed.
    pub fn set_range_start_time(&mut self, time: &str) {
        self.range_start_time = time.to_string();
        if self.range_start.is_some() && !self.range_all_day {
            self.update_range_times();
            self.emit();
        }
    }

    /// End time of the range changed.
    pub fn set_range_end_time(&mut self, time: &str) {
        self.range_end_time = time.to_string();
        if self.range_end.is_some() && !self.range_all_day {
            self.update_range_times();
            self.emit();
        }
    }

    fn update_range_times(&mut self) {
        let (start, end) = if self.range_all_day {
            (NaiveTime::MIN, end_of_day())
        } else {
            (clock(&self.range_start_time), clock(&self.range_end_time))
        };
        self.range_start = self.range_start.map(|d| d.date().and_time(start));
        self.range_end = self.range_end.map(|d| d.date().and_time(end));
    }

    // Output

    /// The schedule as it would be emitted now.
    pub fn selection(&self) -> ScheduledSelection {
        let mut selection = ScheduledSelection {
            mode: self.tab,
            ..Default::default()
        };
        match self.tab {
            ScheduleTab::Single => {
                selection.single_date = self.single_date.map(|date| {
                    let day = date.date();
                    let (start, end) = if self.single_all_day {
                        (day.and_time(NaiveTime::MIN), day.and_time(end_of_day()))
                    } else {
                        (
                            day.and_time(clock(&self.single_start_time)),
                            day.and_time(clock(&self.single_end_time)),
                        )
                    };
                    ScheduledSpan {
                        start_date: start,
                        end_date: end,
                        all_day: self.single_all_day,
                        start_time: self.single_start_time.clone(),
                        end_time: self.single_end_time.clone(),
                    }
                });
            }
            ScheduleTab::Multiple => {
                selection.multiple_dates = Some(self.multiple_dates.clone());
            }
            ScheduleTab::Range => {
                if let (Some(start), Some(end)) = (self.range_start, self.range_end) {
                    selection.date_range = Some(ScheduledSpan {
                        start_date: start,
                        end_date: end,
                        all_day: self.range_all_day,
                        start_time: self.range_start_time.clone(),
                        end_time: self.range_end_time.clone(),
                    });
                }
            }
        }
        selection
    }

    /// Emits the current schedule.
    pub fn apply(&self) {
        self.emit();
    }

    /// Resets every tab to its defaults and fires `cleared`.
    pub fn clear(&mut self) {
        self.single_date = None;
        self.multiple_dates.clear();
        self.range_start = None;
        self.range_end = None;
        self.single_all_day = false;
        self.range_all_day = false;
        self.single_start_time = DEFAULT_START_TIME.to_string();
        self.single_end_time = DEFAULT_END_TIME.to_string();
        self.range_start_time = DEFAULT_START_TIME.to_string();
        self.range_end_time = DEFAULT_END_TIME.to_string();
        self.single_picker.reset();
        self.multiple_picker.reset();
        self.range_picker.reset();
        tracing::debug!("schedule cleared");
        if let Some(callback) = &self.on_cleared {
            callback.call();
        }
    }

    fn emit(&self) {
        let selection = self.selection();
        tracing::trace!(mode = ?selection.mode, "schedule changed");
        if let Some(callback) = &self.on_scheduled {
            callback.call(selection);
        }
    }
}

impl std::fmt::Debug for ScheduledDatePicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledDatePicker")
            .field("tab", &self.tab)
            .field("selection", &self.selection())
            .finish_non_exhaustive()
    }
}
