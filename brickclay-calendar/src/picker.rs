//! The date-range picker controller.
//!
//! ## Usage
//!
//! Create a [`DateRangePicker`] from a [`CalendarConfig`], wire its events
//! and forward user interactions to it. The picker owns its state and is
//! driven from a single thread; [`CalendarInstance`] wraps it for hosts that
//! mount several pickers and need only one popup open at a time.
//!
//! ```
//! use brickclay_calendar::{CalendarConfig, DateRangePicker, GridSide};
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let mut picker = DateRangePicker::new(CalendarConfig::default().dual_calendar(true))
//!     .with_today(today);
//! picker.select_day(4, GridSide::Left);
//! picker.select_day(9, GridSide::Right);
//! assert_eq!(picker.display_value(), "03/04/2024 - 04/09/2024");
//! ```

use std::sync::{Arc, Weak};

use chrono::{Local, NaiveDate};
use parking_lot::{Mutex, MutexGuard};

use crate::{
    callback::{Callback, CallbackWith},
    config::CalendarConfig,
    controlled::ControlledValue,
    format::{RANGE_SEPARATOR, clock_suffix},
    grid::{CalendarCell, CalendarGrid, MonthCursor},
    manager::{CalendarRegistry, Registration},
    presets::{CUSTOM_RANGE, RangePresets, grid_months_for},
    selection::{CalendarSelection, ClickOutcome, DateBounds, SelectionMode, SelectionState},
    time::{Meridiem, TimeContext, TimeContexts, TimeEntry, TimeOfDay},
    time_picker::TimePickerGroup,
};

/// Which grid of a dual calendar an interaction came from.
///
/// Single-grid pickers ignore the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GridSide {
    /// The left (or only) grid.
    #[default]
    Left,
    /// The right grid of a dual calendar.
    Right,
}

/// Everything a renderer needs to draw one day cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellState {
    /// Drawn as a selected anchor.
    pub selected: bool,
    /// Drawn with the soft in-range highlight.
    pub in_range: bool,
    /// The cell is today.
    pub today: bool,
    /// Outside the selectable bounds.
    pub disabled: bool,
    /// Belongs to the displayed month.
    pub current_month: bool,
}

/// State and behaviour of one calendar picker.
pub struct DateRangePicker {
    config: CalendarConfig,
    mode: SelectionMode,
    bounds: DateBounds,
    presets: RangePresets,
    today: NaiveDate,
    selection: SelectionState,
    cursor: MonthCursor,
    left: MonthCursor,
    right: MonthCursor,
    times: TimeContexts,
    entries: [TimeEntry; 3],
    times_seeded: bool,
    time_pickers: TimePickerGroup,
    open: bool,
    disabled: bool,
    on_selected: Option<CallbackWith<CalendarSelection>>,
    value_listeners: Vec<CallbackWith<CalendarSelection>>,
    on_opened: Option<Callback>,
    on_closed: Option<Callback>,
}

fn entry_index(context: TimeContext) -> usize {
    match context {
        TimeContext::Single => 0,
        TimeContext::Start => 1,
        TimeContext::End => 2,
    }
}

impl DateRangePicker {
    /// Creates a picker whose "today" is the local date.
    pub fn new(config: CalendarConfig) -> Self {
        let today = Local::now().date_naive();
        let mode = config.mode();
        let bounds = config.bounds();
        let presets = build_presets(&config, today);
        let cursor = MonthCursor::of(today);
        let open = config.inline;
        Self {
            config,
            mode,
            bounds,
            presets,
            today,
            selection: SelectionState::default(),
            cursor,
            left: cursor,
            right: cursor.next(),
            times: TimeContexts::default(),
            entries: Default::default(),
            times_seeded: false,
            time_pickers: TimePickerGroup::default(),
            open,
            disabled: false,
            on_selected: None,
            value_listeners: Vec::new(),
            on_opened: None,
            on_closed: None,
        }
    }

    /// Pins "today", rebuilding the default presets and re-centering the grids.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.set_today(today);
        self
    }

    /// In-place form of [`Self::with_today`], e.g. after midnight passes.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.presets = build_presets(&self.config, today);
        self.selection.rematch(&self.presets);
        let anchor = self.selection.start().or(self.selection.end());
        self.focus(anchor.map_or(today, |d| d.date()));
    }

    /// Called with a snapshot whenever the picker emits its selection.
    pub fn on_selected(mut self, callback: impl Into<CallbackWith<CalendarSelection>>) -> Self {
        self.on_selected = Some(callback.into());
        self
    }

    /// Called when the popup opens.
    pub fn on_opened(mut self, callback: impl Into<Callback>) -> Self {
        self.on_opened = Some(callback.into());
        self
    }

    /// Called when the popup closes.
    pub fn on_closed(mut self, callback: impl Into<Callback>) -> Self {
        self.on_closed = Some(callback.into());
        self
    }

    /// Configuration the picker was built with.
    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Active selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// The date treated as today.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Presets in display order.
    pub fn presets(&self) -> &RangePresets {
        &self.presets
    }

    /// Live selection state.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Snapshot of the selection as it would be emitted.
    pub fn snapshot(&self) -> CalendarSelection {
        self.selection.snapshot(self.mode)
    }

    /// Name of the matching preset, [`CUSTOM_RANGE`], or `None`.
    pub fn active_key(&self) -> Option<&str> {
        self.selection.active_key()
    }

    /// Whether the popup is showing. Inline pickers are always open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether user interaction is ignored.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Month shown by a single-grid picker.
    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    /// Month shown by the left grid of a dual calendar.
    pub fn left_cursor(&self) -> MonthCursor {
        self.left
    }

    /// Month shown by the right grid of a dual calendar.
    pub fn right_cursor(&self) -> MonthCursor {
        self.right
    }

    /// Month shown on `side`, honouring single-grid pickers.
    pub fn cursor_for(&self, side: GridSide) -> MonthCursor {
        match (self.config.dual_calendar, side) {
            (false, _) => self.cursor,
            (true, GridSide::Left) => self.left,
            (true, GridSide::Right) => self.right,
        }
    }

    /// Grid for `side`.
    pub fn grid(&self, side: GridSide) -> CalendarGrid {
        self.cursor_for(side).grid()
    }

    /// Value shown in the picker input; empty when nothing is selected.
    pub fn display_value(&self) -> String {
        let format = &self.config.display_format;
        let dates = self.selection.selected_dates();
        if self.mode == SelectionMode::Multi && !dates.is_empty() {
            return match dates {
                [only] => format.format(*only),
                _ => format!("{} dates selected", dates.len()),
            };
        }
        let Some(start) = self.selection.start() else {
            return String::new();
        };
        let seconds = self.config.enable_seconds;
        let timed = self.config.enable_timepicker;
        let dual = self.config.dual_calendar;

        let mut text = format.format(start);
        if timed && !dual {
            text.push(' ');
            text.push_str(&clock_suffix(start, seconds));
        }
        match self.selection.end() {
            Some(end) if self.mode != SelectionMode::Single => {
                let mut end_text = format.format(end);
                if timed {
                    if dual {
                        text.push(' ');
                        text.push_str(&clock_suffix(start, seconds));
                    }
                    end_text.push(' ');
                    end_text.push_str(&clock_suffix(end, seconds));
                }
                format!("{text}{RANGE_SEPARATOR}{end_text}")
            }
            _ => text,
        }
    }

    /// Text to show when [`Self::display_value`] is empty.
    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    /// Highlight state of one cell.
    pub fn cell_state(&self, cell: &CalendarCell) -> CellState {
        CellState {
            selected: self.is_selected(cell.date),
            in_range: self.is_in_range(cell.date),
            today: self.is_today(cell.date),
            disabled: self.is_date_disabled(cell.date),
            current_month: cell.is_current_month(),
        }
    }

    /// Whether `date` is drawn as a selected anchor.
    pub fn is_selected(&self, date: NaiveDate) -> bool {
        let (mode, today) = (self.mode, self.today);
        self.selection.is_selected(date, mode, today, &self.bounds)
    }

    /// Whether `date` gets the in-range highlight.
    pub fn is_in_range(&self, date: NaiveDate) -> bool {
        self.selection.is_in_range(date, self.mode)
    }

    /// Whether `date` is today.
    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.today
    }

    /// Whether `date` is outside the selectable bounds.
    pub fn is_date_disabled(&self, date: NaiveDate) -> bool {
        !self.bounds.contains(date)
    }

    // Navigation

    /// Shows the next month; dual calendars move the left grid.
    pub fn next_month(&mut self) {
        if self.config.dual_calendar {
            self.next_left_month();
        } else {
            self.cursor = self.cursor.next();
        }
    }

    /// Shows the previous month; dual calendars move the left grid.
    pub fn prev_month(&mut self) {
        if self.config.dual_calendar {
            self.prev_left_month();
        } else {
            self.cursor = self.cursor.prev();
        }
    }

    /// Moves the left grid forward.
    pub fn next_left_month(&mut self) {
        self.left = self.left.next();
        self.link_from_left();
    }

    /// Moves the left grid back.
    pub fn prev_left_month(&mut self) {
        self.left = self.left.prev();
        self.link_from_left();
    }

    /// Moves the right grid forward.
    pub fn next_right_month(&mut self) {
        self.right = self.right.next();
        if self.config.linked_calendars {
            self.left = self.right.prev();
        }
    }

    /// Moves the right grid back.
    pub fn prev_right_month(&mut self) {
        self.right = self.right.prev();
        if self.config.linked_calendars {
            self.left = self.right.prev();
        }
    }

    fn link_from_left(&mut self) {
        if self.config.linked_calendars {
            self.right = self.left.next();
        }
    }

    fn focus(&mut self, date: NaiveDate) {
        self.cursor = MonthCursor::of(date);
        self.left = self.cursor;
        self.right = self.cursor.next();
    }

    // Selection

    /// Handles a click on `day` of the month shown on `side`.
    ///
    /// Days that do not exist in that month are ignored.
    pub fn select_day(&mut self, day: u32, side: GridSide) {
        match self.cursor_for(side).date(day) {
            Some(date) => self.select_date(date),
            None => tracing::trace!(day, ?side, "no such day in displayed month"),
        }
    }

    /// Handles a click on a grid cell.
    ///
    /// Cells of the neighbouring months are not selectable.
    pub fn select_cell(&mut self, cell: &CalendarCell) {
        if cell.is_current_month() {
            self.select_date(cell.date);
        } else {
            tracing::trace!(date = %cell.date, "click on adjacent-month cell ignored");
        }
    }

    /// Handles a click on `date`.
    pub fn select_date(&mut self, date: NaiveDate) {
        if self.disabled {
            return;
        }
        let outcome = self.selection.click(
            date,
            self.mode,
            &self.bounds,
            self.config.custom_range_direction,
        );
        tracing::trace!(%date, ?outcome, "day clicked");

        match outcome {
            ClickOutcome::Rejected => {}
            ClickOutcome::MultiToggled { .. } => {
                if self.config.auto_apply || self.config.inline {
                    self.emit();
                    if self.config.close_on_auto_apply && !self.config.inline {
                        self.close();
                    }
                }
            }
            ClickOutcome::Single => {
                self.compose_times();
                if self.config.auto_apply {
                    self.apply();
                } else {
                    self.emit();
                }
            }
            ClickOutcome::RangeStarted => {
                if self.config.dual_calendar {
                    self.left = MonthCursor::of(date);
                    self.right = self.left.next();
                }
                self.compose_times();
            }
            ClickOutcome::RangeCompleted { swapped } => {
                if swapped && self.config.dual_calendar && self.config.enable_timepicker {
                    self.times.swap_start_end();
                }
                if self.config.dual_calendar {
                    self.reposition_after_completion(swapped);
                }
                self.compose_times();
                if self.config.auto_apply {
                    self.apply();
                } else {
                    self.selection.rematch(&self.presets);
                    if self.config.inline {
                        self.emit();
                    }
                }
            }
        }
    }

    fn reposition_after_completion(&mut self, swapped: bool) {
        let (Some(start), Some(end)) = (self.selection.start(), self.selection.end()) else {
            return;
        };
        if swapped {
            self.left = MonthCursor::of(start.date());
            return;
        }
        let end_month = MonthCursor::of(end.date());
        if end_month != MonthCursor::of(start.date()) {
            self.right = end_month;
        }
    }

    /// Pointer moved over `day` of the month shown on `side`.
    pub fn hover_day(&mut self, day: u32, side: GridSide) {
        let date = self.cursor_for(side).date(day);
        self.hover_date(date);
    }

    /// Pointer moved over `date`, or over a blank cell when `None`.
    pub fn hover_date(&mut self, date: Option<NaiveDate>) {
        if self.disabled {
            return;
        }
        self.selection.hover(date, self.mode);
    }

    /// Pointer left the grid.
    pub fn leave(&mut self) {
        self.selection.leave();
    }

    /// Selects a named preset.
    ///
    /// Unknown names and [`CUSTOM_RANGE`] are ignored.
    pub fn choose_range(&mut self, key: &str) {
        if self.disabled {
            return;
        }
        if key == CUSTOM_RANGE {
            tracing::debug!("custom range placeholder cannot be chosen");
            return;
        }
        let Some(preset) = self.presets.get(key) else {
            tracing::debug!(key, "unknown preset");
            return;
        };
        let (start, end) = (preset.start, preset.end);
        self.selection.select_preset(key, start, end);
        if self.config.dual_calendar {
            (self.left, self.right) = grid_months_for(start, end);
        } else {
            self.cursor = MonthCursor::of(start);
        }
        tracing::debug!(key, %start, %end, "preset chosen");
        self.emit();
        if self.config.auto_apply || self.config.close_on_auto_apply {
            self.close();
        }
    }

    /// Commits the selection: composes times, labels, emits and closes.
    pub fn apply(&mut self) {
        for entry in &mut self.entries {
            entry.finish();
        }
        self.compose_times();
        self.selection.rematch(&self.presets);
        tracing::debug!(key = ?self.selection.active_key(), "selection applied");
        self.emit();
        self.selection.set_highlight_disabled(true);
        self.close();
    }

    /// Drops the selection and closes without emitting.
    pub fn cancel(&mut self) {
        self.selection.clear();
        self.close();
    }

    /// Drops the selection and emits the empty value.
    pub fn clear(&mut self) {
        self.selection.clear();
        if self.config.dual_calendar {
            self.right = self.left.next();
        }
        self.emit();
    }

    /// Replaces the selection with a value supplied by the host.
    ///
    /// The grids move to the start (or end, or today) and the first supplied
    /// value also seeds the time-of-day fields. Nothing is emitted.
    pub fn set_selected_value(&mut self, value: CalendarSelection) {
        self.selection.replace(&value);
        let start = self.selection.start();
        let end = self.selection.end();
        let today = self.today;
        self.focus(start.or(end).map_or(today, |d| d.date()));
        if !self.times_seeded && (start.is_some() || end.is_some()) {
            if let Some(start) = start {
                self.times.single = TimeOfDay::from_datetime(start);
                self.times.start = TimeOfDay::from_datetime(start);
            }
            if let Some(end) = end {
                self.times.end = TimeOfDay::from_datetime(end);
            }
            self.times_seeded = true;
        }
        self.selection.rematch(&self.presets);
    }

    fn compose_times(&mut self) {
        if !self.config.enable_timepicker || self.mode == SelectionMode::Multi {
            return;
        }
        let (start, end) = if self.config.dual_calendar {
            (self.times.start, self.times.end)
        } else {
            (self.times.single, self.times.single)
        };
        self.selection.set_start_time(start.to_naive_time());
        if self.mode == SelectionMode::Range {
            self.selection.set_end_time(end.to_naive_time());
        }
    }

    fn emit(&self) {
        let snapshot = self.snapshot();
        if let Some(callback) = &self.on_selected {
            callback.call(snapshot.clone());
        }
        for listener in &self.value_listeners {
            listener.call(snapshot.clone());
        }
    }

    // Lifecycle

    /// Opens the popup. Returns whether the picker was closed before.
    pub fn open(&mut self) -> bool {
        if self.open || self.disabled {
            return false;
        }
        self.open = true;
        self.selection.set_highlight_disabled(false);
        tracing::debug!("calendar opened");
        if let Some(callback) = &self.on_opened {
            callback.call();
        }
        true
    }

    /// Closes the popup. Inline pickers stay open.
    pub fn close(&mut self) {
        if self.config.inline || !self.open {
            return;
        }
        self.open = false;
        tracing::debug!("calendar closed");
        if let Some(callback) = &self.on_closed {
            callback.call();
        }
    }

    /// Opens a closed popup or closes an open one.
    pub fn toggle(&mut self) {
        if self.config.inline {
            return;
        }
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Whether [`Self::open`] would open the popup.
    pub fn can_open(&self) -> bool {
        !self.open && !self.disabled
    }

    /// Whether [`Self::toggle`] would open the popup.
    pub fn toggle_would_open(&self) -> bool {
        !self.config.inline && self.can_open()
    }

    /// A click landed outside the picker.
    pub fn on_outside_click(&mut self) {
        self.close();
    }

    // Time of day

    /// Context edited by the start (or only) time control.
    pub fn start_context(&self) -> TimeContext {
        if self.config.dual_calendar {
            TimeContext::Start
        } else {
            TimeContext::Single
        }
    }

    /// Time of day held for `context`.
    pub fn time(&self, context: TimeContext) -> TimeOfDay {
        self.times.get(context)
    }

    /// `H:MM AM` label for an embedded time picker.
    pub fn time_label(&self, context: TimeContext) -> String {
        self.times.get(context).picker_label()
    }

    /// Advances the hour of `context`.
    pub fn increment_hour(&mut self, context: TimeContext) {
        self.edit_time(context, TimeOfDay::increment_hour);
    }

    /// Moves the hour of `context` back.
    pub fn decrement_hour(&mut self, context: TimeContext) {
        self.edit_time(context, TimeOfDay::decrement_hour);
    }

    /// Advances the minute of `context`.
    pub fn increment_minute(&mut self, context: TimeContext) {
        self.edit_time(context, TimeOfDay::increment_minute);
    }

    /// Moves the minute of `context` back.
    pub fn decrement_minute(&mut self, context: TimeContext) {
        self.edit_time(context, TimeOfDay::decrement_minute);
    }

    /// Flips AM/PM of `context`.
    pub fn toggle_meridiem(&mut self, context: TimeContext) {
        self.edit_time(context, TimeOfDay::toggle_meridiem);
    }

    /// Sets AM or PM of `context`.
    pub fn set_meridiem(&mut self, context: TimeContext, meridiem: Meridiem) {
        self.edit_time(context, |time| time.set_meridiem(meridiem));
    }

    /// Applies a value string reported by an embedded time picker.
    ///
    /// Unreadable text falls back to `12:00 AM`; seconds already held are
    /// kept.
    pub fn set_time_from_str(&mut self, context: TimeContext, text: &str) {
        let parsed = TimeOfDay::parse_lenient(text);
        self.edit_time(context, |time| {
            time.set_hour(parsed.hour());
            time.set_minute(parsed.minute());
            time.set_meridiem(parsed.meridiem());
        });
    }

    /// A keystroke in the hour field; returns the text to show.
    pub fn hour_input(&mut self, context: TimeContext, text: &str) -> String {
        match TimeEntry::hour_input(text) {
            Some(hour) => {
                self.edit_time(context, |time| time.set_hour(hour));
                hour.to_string()
            }
            None => text.to_string(),
        }
    }

    /// The hour field lost focus; returns the text to show.
    pub fn hour_blur(&mut self, context: TimeContext, text: &str) -> String {
        let current = self.times.get(context).hour();
        let (hour, shown) = TimeEntry::hour_blur(text, current);
        if !text.trim().is_empty() {
            self.edit_time(context, |time| time.set_hour(hour));
        }
        shown
    }

    /// A keystroke in the minute field; returns the text to show.
    ///
    /// The value is stored silently; dates are updated on blur or apply.
    pub fn minute_input(&mut self, context: TimeContext, text: &str) -> String {
        if self.disabled {
            return self.minute_display(context);
        }
        if let Some(minute) = self.entries[entry_index(context)].minute_input(text) {
            self.times.get_mut(context).set_minute(minute);
        }
        self.minute_display(context)
    }

    /// The minute field lost focus; returns the zero-padded text to show.
    pub fn minute_blur(&mut self, context: TimeContext, text: &str) -> String {
        let current = self.times.get(context).minute();
        let had_text = text.chars().any(|c| c.is_ascii_digit());
        let (minute, shown) = self.entries[entry_index(context)].minute_blur(text, current);
        if had_text {
            self.edit_time(context, |time| time.set_minute(minute));
        }
        shown
    }

    /// Text of the minute field: the raw typing while editing, else `MM`.
    pub fn minute_display(&self, context: TimeContext) -> String {
        self.entries[entry_index(context)].minute_display(self.times.get(context).minute())
    }

    fn edit_time(&mut self, context: TimeContext, edit: impl FnOnce(&mut TimeOfDay)) {
        if self.disabled {
            return;
        }
        edit(self.times.get_mut(context));
        let time = self.times.get(context).to_naive_time();
        let wrote = match context {
            TimeContext::Single | TimeContext::Start => {
                let has = self.selection.start().is_some();
                self.selection.set_start_time(time);
                has
            }
            TimeContext::End => {
                let has = self.selection.end().is_some();
                self.selection.set_end_time(time);
                has
            }
        };
        if wrote {
            self.emit();
        }
    }

    /// An embedded time picker opened; returns the id of one that must close.
    pub fn time_picker_opened(&mut self, id: &str) -> Option<String> {
        self.time_pickers.opened(id)
    }

    /// An embedded time picker closed.
    pub fn time_picker_closed(&mut self, id: &str) {
        self.time_pickers.closed(id);
    }
}

impl ControlledValue for DateRangePicker {
    type Value = CalendarSelection;

    fn value(&self) -> CalendarSelection {
        self.snapshot()
    }

    fn set_value(&mut self, value: CalendarSelection) {
        self.set_selected_value(value);
    }

    fn on_value_change(&mut self, callback: CallbackWith<CalendarSelection>) {
        self.value_listeners.push(callback);
    }

    fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.close();
            self.selection.leave();
        }
        self.disabled = disabled;
    }
}

impl std::fmt::Debug for DateRangePicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateRangePicker")
            .field("mode", &self.mode)
            .field("today", &self.today)
            .field("selection", &self.selection)
            .field("open", &self.open)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

fn build_presets(config: &CalendarConfig, today: NaiveDate) -> RangePresets {
    if config.ranges.is_empty() {
        RangePresets::defaults(today)
    } else {
        RangePresets::from_custom(config.ranges.clone(), today)
    }
}

/// A picker mounted on a [`CalendarRegistry`].
///
/// Opening a mounted picker closes every sibling on the same registry, and
/// [`CalendarRegistry::close_all`] reaches it. Dropping the instance unmounts
/// it.
///
/// Callbacks attached to the picker run while its lock is held and must not
/// lock the same instance again.
pub struct CalendarInstance {
    picker: Arc<Mutex<DateRangePicker>>,
    registry: Arc<CalendarRegistry>,
    close: Callback,
    _registration: Registration,
    _broadcast: Registration,
}

impl CalendarInstance {
    /// Mounts `picker` on `registry`.
    pub fn mount(picker: DateRangePicker, registry: &Arc<CalendarRegistry>) -> Self {
        let picker = Arc::new(Mutex::new(picker));
        let weak: Weak<Mutex<DateRangePicker>> = Arc::downgrade(&picker);
        let close = Callback::new(move || {
            if let Some(picker) = weak.upgrade() {
                picker.lock().close();
            }
        });
        let registration = registry.register(close.clone());
        let broadcast = registry.subscribe_close_all(close.clone());
        Self {
            picker,
            registry: Arc::clone(registry),
            close,
            _registration: registration,
            _broadcast: broadcast,
        }
    }

    /// Mounts `picker` on the process-wide registry.
    pub fn mount_global(picker: DateRangePicker) -> Self {
        Self::mount(picker, &CalendarRegistry::global())
    }

    /// Locks the picker for direct use.
    pub fn lock(&self) -> MutexGuard<'_, DateRangePicker> {
        self.picker.lock()
    }

    /// Runs `f` with the picker locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut DateRangePicker) -> R) -> R {
        f(&mut self.picker.lock())
    }

    /// Opens the popup after closing every sibling.
    ///
    /// Siblings are left alone when this picker is already open or disabled.
    pub fn open(&self) {
        let will_open = self.picker.lock().can_open();
        if will_open {
            self.registry.close_all_except(&self.close);
            self.picker.lock().open();
        }
    }

    /// Toggles the popup, closing siblings when it opens.
    pub fn toggle(&self) {
        let will_open = self.picker.lock().toggle_would_open();
        if will_open {
            self.registry.close_all_except(&self.close);
        }
        self.picker.lock().toggle();
    }

    /// Closes the popup.
    pub fn close(&self) {
        self.picker.lock().close();
    }

    /// The registry this instance is mounted on.
    pub fn registry(&self) -> &Arc<CalendarRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for CalendarInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarInstance")
            .field("picker", &*self.picker.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        date.and_hms_opt(h, min, 0).unwrap()
    }

    type Log = Arc<Mutex<Vec<CalendarSelection>>>;

    fn picker(config: CalendarConfig, today: NaiveDate) -> (DateRangePicker, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let picker = DateRangePicker::new(config)
            .with_today(today)
            .on_selected(move |s: CalendarSelection| sink.lock().push(s));
        (picker, log)
    }

    #[test]
    fn range_completion_in_popup_waits_for_apply() {
        let (mut p, log) = picker(CalendarConfig::default(), d(2024, 3, 15));
        p.open();
        p.select_day(10, GridSide::Left);
        p.select_day(5, GridSide::Left);
        assert!(log.lock().is_empty());
        assert_eq!(p.selection().start().map(|s| s.date()), Some(d(2024, 3, 5)));
        assert_eq!(p.selection().end().map(|s| s.date()), Some(d(2024, 3, 10)));

        p.apply();
        assert_eq!(log.lock().len(), 1);
        assert!(!p.is_open());
        assert!(!p.is_selected(d(2024, 3, 5)));
    }

    #[test]
    fn inline_range_emits_on_completion() {
        let config = CalendarConfig::default().inline(true);
        let (mut p, log) = picker(config, d(2024, 3, 15));
        assert!(p.is_open());
        p.select_day(1, GridSide::Left);
        assert!(log.lock().is_empty());
        p.select_day(7, GridSide::Left);
        assert_eq!(log.lock().len(), 1);
        p.close();
        p.on_outside_click();
        assert!(p.is_open());
    }

    #[test]
    fn auto_apply_commits_and_closes() {
        let config = CalendarConfig::default().auto_apply(true);
        let (mut p, log) = picker(config, d(2024, 1, 15));
        p.open();
        p.select_date(d(2024, 1, 15));
        p.select_date(d(2024, 1, 15));
        assert_eq!(log.lock().len(), 1);
        assert_eq!(p.active_key(), Some("Today"));
        assert!(!p.is_open());
    }

    #[test]
    fn single_mode_emits_every_click() {
        let config = CalendarConfig::default().single_date_picker(true);
        let (mut p, log) = picker(config, d(2024, 1, 15));
        p.select_date(d(2024, 1, 3));
        p.select_date(d(2024, 1, 4));
        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1], CalendarSelection::single(at(d(2024, 1, 4), 0, 0)));
        assert_eq!(p.display_value(), "01/04/2024");
    }

    #[test]
    fn multi_date_emits_only_when_auto_or_inline() {
        let config = CalendarConfig::default().multi_date_selection(true);
        let (mut p, log) = picker(config.clone(), d(2024, 5, 1));
        p.select_date(d(2024, 5, 3));
        assert!(log.lock().is_empty());

        let (mut p2, log2) = picker(
            config.auto_apply(true).close_on_auto_apply(true),
            d(2024, 5, 1),
        );
        p2.open();
        p2.select_date(d(2024, 5, 3));
        assert_eq!(log2.lock().len(), 1);
        assert!(!p2.is_open());
        assert_eq!(
            log2.lock()[0].selected_dates,
            Some(vec![at(d(2024, 5, 3), 0, 0)])
        );

        p.select_date(d(2024, 5, 9));
        assert_eq!(p.display_value(), "2 dates selected");
        p.select_date(d(2024, 5, 3));
        assert_eq!(p.display_value(), "05/09/2024");
    }

    #[test]
    fn out_of_bounds_click_changes_nothing() {
        let config = CalendarConfig::default()
            .single_date_picker(true)
            .min_date(d(2024, 1, 10));
        let (mut p, log) = picker(config, d(2024, 1, 15));
        p.select_date(d(2024, 1, 5));
        assert_eq!(p.selection().start(), None);
        assert!(log.lock().is_empty());
        assert!(p.is_date_disabled(d(2024, 1, 5)));
    }

    #[test]
    fn dual_grids_follow_the_selection() {
        let config = CalendarConfig::default().dual_calendar(true);
        let (mut p, _) = picker(config, d(2024, 3, 1));
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 2));
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 3));

        p.select_day(20, GridSide::Left);
        p.select_day(10, GridSide::Right);
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 3));

        // Start and end in the same month leave the right grid alone.
        p.select_day(5, GridSide::Left);
        p.select_day(25, GridSide::Left);
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 2));
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 3));

        // A new anchor moves the left grid and resets the right one.
        p.next_right_month();
        p.next_right_month();
        p.select_day(2, GridSide::Right);
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 5));
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 6));

        // Completing in a later month moves the right grid there.
        p.next_right_month();
        p.select_day(3, GridSide::Right);
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 5));
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 7));
    }

    #[test]
    fn clear_resets_right_grid_and_emits() {
        let config = CalendarConfig::default().dual_calendar(true);
        let (mut p, log) = picker(config, d(2024, 3, 1));
        p.select_day(5, GridSide::Left);
        p.next_right_month();
        p.clear();
        assert_eq!(p.right_cursor(), p.left_cursor().next());
        assert_eq!(log.lock().len(), 1);
        assert!(log.lock()[0].is_empty());
        assert_eq!(p.active_key(), None);
    }

    #[test]
    fn choose_range_positions_grids_and_rejects_placeholder() {
        let config = CalendarConfig::default().dual_calendar(true).auto_apply(true);
        let (mut p, log) = picker(config, d(2024, 3, 15));
        p.open();
        p.choose_range(CUSTOM_RANGE);
        p.choose_range("Next Decade");
        assert!(log.lock().is_empty());
        assert!(p.is_open());

        p.choose_range("Last 30 Days");
        assert_eq!(p.active_key(), Some("Last 30 Days"));
        // 2024-02-15 through 2024-03-15.
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 1));
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 2));
        assert_eq!(log.lock().len(), 1);
        assert!(!p.is_open());

        p.choose_range("Today");
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 2));
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 3));
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn linked_grids_stay_adjacent_across_years() {
        let config = CalendarConfig::default()
            .dual_calendar(true)
            .linked_calendars(true);
        let (mut p, _) = picker(config, d(2024, 12, 10));
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 11));
        assert_eq!(p.right_cursor(), MonthCursor::new(2025, 0));

        p.next_left_month();
        assert_eq!(p.left_cursor(), MonthCursor::new(2025, 0));
        assert_eq!(p.right_cursor(), p.left_cursor().next());

        p.prev_right_month();
        p.prev_right_month();
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 11));
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 10));

        p.next_right_month();
        p.prev_left_month();
        assert_eq!(p.left_cursor(), MonthCursor::new(2024, 10));
        assert_eq!(p.right_cursor(), p.left_cursor().next());
    }

    #[test]
    fn unlinked_grids_move_independently() {
        let config = CalendarConfig::default().dual_calendar(true);
        let (mut p, _) = picker(config, d(2024, 12, 10));
        p.next_left_month();
        p.next_left_month();
        assert_eq!(p.left_cursor(), MonthCursor::new(2025, 1));
        assert_eq!(p.right_cursor(), MonthCursor::new(2025, 0));

        p.prev_right_month();
        assert_eq!(p.right_cursor(), MonthCursor::new(2024, 11));
        assert_eq!(p.left_cursor(), MonthCursor::new(2025, 1));
    }

    #[test]
    fn seconds_show_in_the_display_value() {
        let config = CalendarConfig::default()
            .single_date_picker(true)
            .enable_timepicker(true)
            .enable_seconds(true);
        let (mut p, _) = picker(config, d(2024, 3, 1));
        let moment = d(2024, 3, 8).and_hms_opt(16, 7, 9).unwrap();
        p.set_value(CalendarSelection::single(moment));
        assert_eq!(p.display_value(), "03/08/2024 16:07:09");
        assert_eq!(p.time_label(TimeContext::Single), "4:07 PM");

        let dual = CalendarConfig::default()
            .dual_calendar(true)
            .enable_timepicker(true)
            .enable_seconds(true);
        let (mut p, _) = picker(dual, d(2024, 3, 1));
        p.set_value(CalendarSelection::range(
            at(d(2024, 3, 2), 8, 0),
            d(2024, 3, 4).and_hms_opt(18, 30, 15).unwrap(),
        ));
        assert_eq!(p.display_value(), "03/02/2024 08:00:00 - 03/04/2024 18:30:15");
    }

    #[test]
    fn cancel_drops_selection_silently() {
        let (mut p, log) = picker(CalendarConfig::default(), d(2024, 3, 15));
        p.open();
        p.select_day(3, GridSide::Left);
        p.cancel();
        assert_eq!(p.selection().start(), None);
        assert!(!p.is_open());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn dual_times_compose_and_swap() {
        let config = CalendarConfig::default()
            .dual_calendar(true)
            .enable_timepicker(true);
        let (mut p, _) = picker(config, d(2024, 3, 1));
        p.set_time_from_str(TimeContext::Start, "9:30 AM");
        p.set_time_from_str(TimeContext::End, "5:15 PM");
        p.select_day(12, GridSide::Left);
        assert_eq!(p.selection().start(), Some(at(d(2024, 3, 12), 9, 30)));

        // Earlier second click swaps the ends together with their times.
        p.select_day(4, GridSide::Left);
        assert_eq!(p.selection().start(), Some(at(d(2024, 3, 4), 17, 15)));
        assert_eq!(p.selection().end(), Some(at(d(2024, 3, 12), 9, 30)));
        assert_eq!(p.display_value(), "03/04/2024 17:15 - 03/12/2024 09:30");
    }

    #[test]
    fn single_grid_time_edits_emit_when_a_date_exists() {
        let config = CalendarConfig::default()
            .single_date_picker(true)
            .enable_timepicker(true);
        let (mut p, log) = picker(config, d(2024, 3, 1));
        p.increment_hour(TimeContext::Single);
        assert!(log.lock().is_empty());
        assert_eq!(p.time_label(TimeContext::Single), "2:00 AM");

        p.select_day(8, GridSide::Left);
        assert_eq!(p.selection().start(), Some(at(d(2024, 3, 8), 2, 0)));
        p.toggle_meridiem(TimeContext::Single);
        assert_eq!(p.selection().start(), Some(at(d(2024, 3, 8), 14, 0)));
        assert_eq!(p.display_value(), "03/08/2024 14:00");
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn minute_typing_is_kept_until_blur() {
        let config = CalendarConfig::default()
            .single_date_picker(true)
            .enable_timepicker(true);
        let (mut p, log) = picker(config, d(2024, 3, 1));
        p.select_day(8, GridSide::Left);
        let emitted = log.lock().len();

        assert_eq!(p.minute_input(TimeContext::Single, "5"), "5");
        assert_eq!(p.minute_display(TimeContext::Single), "5");
        assert_eq!(log.lock().len(), emitted);

        assert_eq!(p.minute_blur(TimeContext::Single, "5"), "05");
        assert_eq!(p.minute_display(TimeContext::Single), "05");
        assert_eq!(p.selection().start(), Some(at(d(2024, 3, 8), 1, 5)));
        assert_eq!(log.lock().len(), emitted + 1);

        assert_eq!(p.hour_input(TimeContext::Single, "15"), "12");
        assert_eq!(p.hour_blur(TimeContext::Single, ""), "12");
    }

    #[test]
    fn controlled_value_focuses_and_seeds_times() {
        let config = CalendarConfig::default()
            .dual_calendar(true)
            .enable_timepicker(true);
        let (mut p, log) = picker(config, d(2024, 1, 15));
        p.set_value(CalendarSelection::range(
            at(d(2023, 7, 14), 8, 45),
            at(d(2023, 8, 2), 18, 0),
        ));
        assert!(log.lock().is_empty());
        assert_eq!(p.left_cursor(), MonthCursor::new(2023, 6));
        assert_eq!(p.right_cursor(), MonthCursor::new(2023, 7));
        assert_eq!(p.time_label(TimeContext::Start), "8:45 AM");
        assert_eq!(p.time_label(TimeContext::End), "6:00 PM");
        assert_eq!(p.active_key(), Some(CUSTOM_RANGE));

        p.set_value(CalendarSelection::range(
            at(d(2024, 1, 15), 0, 0),
            at(d(2024, 1, 15), 0, 0),
        ));
        assert_eq!(p.active_key(), Some("Today"));
        assert_eq!(p.time_label(TimeContext::Start), "8:45 AM");
        assert_eq!(p.value().start_date, Some(at(d(2024, 1, 15), 0, 0)));
    }

    #[test]
    fn disabled_picker_ignores_interaction() {
        let (mut p, log) = picker(CalendarConfig::default(), d(2024, 3, 15));
        let heard = Arc::clone(&log);
        p.on_value_change(CallbackWith::new(move |s: CalendarSelection| heard.lock().push(s)));
        p.set_disabled(true);
        p.select_day(3, GridSide::Left);
        p.toggle();
        assert!(!p.is_open());
        assert_eq!(p.selection().start(), None);

        p.set_disabled(false);
        p.clear();
        // Both the selected callback and the value listener saw the clear.
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn open_and_close_fire_on_transitions_only() {
        let count = Arc::new(Mutex::new((0, 0)));
        let (o, c) = (Arc::clone(&count), Arc::clone(&count));
        let mut p = DateRangePicker::new(CalendarConfig::default())
            .with_today(d(2024, 3, 15))
            .on_opened(move || o.lock().0 += 1)
            .on_closed(move || c.lock().1 += 1);
        p.open();
        p.open();
        p.close();
        p.close();
        p.toggle();
        p.on_outside_click();
        assert_eq!(*count.lock(), (2, 2));
    }

    #[test]
    fn opening_one_instance_closes_siblings() {
        let registry = CalendarRegistry::new();
        let a = CalendarInstance::mount(
            DateRangePicker::new(CalendarConfig::default()).with_today(d(2024, 3, 1)),
            &registry,
        );
        let b = CalendarInstance::mount(
            DateRangePicker::new(CalendarConfig::default()).with_today(d(2024, 3, 1)),
            &registry,
        );
        let inline = CalendarInstance::mount(
            DateRangePicker::new(CalendarConfig::default().inline(true)).with_today(d(2024, 3, 1)),
            &registry,
        );
        a.toggle();
        assert!(a.lock().is_open());
        b.toggle();
        assert!(b.lock().is_open());
        assert!(!a.lock().is_open());
        assert!(inline.lock().is_open());

        registry.close_all();
        assert!(!b.lock().is_open());
        assert!(inline.lock().is_open());

        drop(a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn disabled_instance_leaves_siblings_open() {
        let registry = CalendarRegistry::new();
        let open = CalendarInstance::mount(
            DateRangePicker::new(CalendarConfig::default()).with_today(d(2024, 3, 1)),
            &registry,
        );
        let locked = CalendarInstance::mount(
            DateRangePicker::new(CalendarConfig::default()).with_today(d(2024, 3, 1)),
            &registry,
        );
        locked.with(|picker| picker.set_disabled(true));

        open.open();
        locked.open();
        assert!(open.lock().is_open());
        assert!(!locked.lock().is_open());

        // Reopening an open picker does not close anything either.
        let sibling = CalendarInstance::mount(
            DateRangePicker::new(CalendarConfig::default()).with_today(d(2024, 3, 1)),
            &registry,
        );
        sibling.with(|picker| {
            picker.open();
        });
        sibling.open();
        assert!(open.lock().is_open());
    }

    #[test]
    fn cell_state_reports_highlights() {
        let config = CalendarConfig::default().max_date(d(2024, 3, 20));
        let (mut p, _) = picker(config, d(2024, 3, 15));
        let grid = p.grid(GridSide::Left);
        let today_cell = grid.cells().find(|c| c.date == d(2024, 3, 15)).copied().unwrap();
        let state = p.cell_state(&today_cell);
        assert!(state.today && state.selected && state.current_month);

        p.select_day(10, GridSide::Left);
        p.select_day(12, GridSide::Left);
        let inside = grid.cells().find(|c| c.date == d(2024, 3, 11)).copied().unwrap();
        assert!(p.cell_state(&inside).in_range);
        let late = grid.cells().find(|c| c.date == d(2024, 3, 25)).copied().unwrap();
        assert!(p.cell_state(&late).disabled);

        let leading = grid.cells().next().copied().unwrap();
        assert!(!leading.is_current_month());
        p.select_cell(&leading);
        assert_eq!(p.selection().start().map(|s| s.date()), Some(d(2024, 3, 10)));
    }
}
