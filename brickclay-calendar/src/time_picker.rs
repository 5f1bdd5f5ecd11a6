//! Standalone time picker state exchanged as value strings.
//!
//! ## Usage
//!
//! A [`TimePickerState`] owns one editable clock time and reports every
//! change as a value string (`"1:05 PM"`, `"13:05"`, `"1:05:30 PM"`). Use a
//! [`TimePickerGroup`] when several pickers share a container and at most one
//! may be open.

use std::fmt;

use crate::{
    callback::CallbackWith,
    time::{Meridiem, parse_leading_int, to_12_hour, to_24_hour},
};

/// Keys the picker reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePickerKey {
    /// Toggles the option list.
    Enter,
    /// Toggles the option list.
    Space,
    /// Closes the option list.
    Escape,
    /// Moves the hour forward while closed.
    ArrowUp,
    /// Moves the hour back while closed.
    ArrowDown,
}

/// Holds the current selection for a time picker.
///
/// The hour is stored in 24-hour form; `is_24_hour` only changes how it is
/// shown and formatted.
pub struct TimePickerState {
    id: String,
    hour: u8,
    minute: u8,
    second: u8,
    is_24_hour: bool,
    show_seconds: bool,
    open: bool,
    value: String,
    on_change: Option<CallbackWith<String>>,
    on_opened: Option<CallbackWith<String>>,
    on_closed: Option<CallbackWith<String>>,
}

impl TimePickerState {
    /// Creates a picker and reads its initial value string.
    pub fn new(id: impl Into<String>, value: &str, is_24_hour: bool, show_seconds: bool) -> Self {
        let mut state = Self {
            id: id.into(),
            hour: 0,
            minute: 0,
            second: 0,
            is_24_hour,
            show_seconds,
            open: false,
            value: String::new(),
            on_change: None,
            on_opened: None,
            on_closed: None,
        };
        state.set_value(value);
        state
    }

    /// Called with the new value string after every edit.
    pub fn on_change(mut self, callback: impl Into<CallbackWith<String>>) -> Self {
        self.on_change = Some(callback.into());
        self
    }

    /// Called with the picker id when the option list opens.
    pub fn on_opened(mut self, callback: impl Into<CallbackWith<String>>) -> Self {
        self.on_opened = Some(callback.into());
        self
    }

    /// Called with the picker id when the option list closes.
    pub fn on_closed(mut self, callback: impl Into<CallbackWith<String>>) -> Self {
        self.on_closed = Some(callback.into());
        self
    }

    /// Identifier reported to open/close listeners.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current value string.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Hour in 24-hour form (0-23).
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0-59).
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0-59).
    pub fn second(&self) -> u8 {
        self.second
    }

    /// Whether the picker shows 0-23 hours.
    pub fn is_24_hour(&self) -> bool {
        self.is_24_hour
    }

    /// Whether seconds are shown and formatted.
    pub fn show_seconds(&self) -> bool {
        self.show_seconds
    }

    /// Whether the option list is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// AM or PM for the current hour.
    pub fn period(&self) -> Meridiem {
        to_12_hour(self.hour).1
    }

    /// Hour as shown: 1-12 in 12-hour mode, 0-23 otherwise.
    pub fn hour_for_display(&self) -> u8 {
        if self.is_24_hour {
            self.hour
        } else {
            to_12_hour(self.hour).0
        }
    }

    /// Selectable hours in display form.
    pub fn hour_options(&self) -> Vec<u8> {
        if self.is_24_hour {
            (0..24).collect()
        } else {
            (1..=12).collect()
        }
    }

    /// Selectable minutes.
    pub fn minute_options() -> Vec<u8> {
        (0..60).collect()
    }

    /// Selectable seconds.
    pub fn second_options() -> Vec<u8> {
        (0..60).collect()
    }

    /// Selectable periods.
    pub fn period_options() -> [Meridiem; 2] {
        [Meridiem::Am, Meridiem::Pm]
    }

    /// Replaces the value from outside without notifying `on_change`.
    ///
    /// Never fails: unreadable parts fall back to `12:00 AM` in 12-hour mode
    /// and `00:00` in 24-hour mode, and every part is clamped.
    pub fn set_value(&mut self, text: &str) {
        let (hour, minute, second) = parse_time_value(text, self.is_24_hour);
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self.value = self.format();
    }

    /// Selects an hour given in display form.
    pub fn select_hour(&mut self, hour: u8) {
        self.hour = if self.is_24_hour {
            hour.min(23)
        } else {
            to_24_hour(hour, self.period())
        };
        self.update();
    }

    /// Selects a minute.
    pub fn select_minute(&mut self, minute: u8) {
        self.minute = minute.min(59);
        self.update();
    }

    /// Selects a second.
    pub fn select_second(&mut self, second: u8) {
        self.second = second.min(59);
        self.update();
    }

    /// Selects AM or PM. Ignored in 24-hour mode.
    pub fn select_period(&mut self, period: Meridiem) {
        if self.is_24_hour {
            return;
        }
        let (hour, _) = to_12_hour(self.hour);
        self.hour = to_24_hour(hour, period);
        self.update();
    }

    /// Opens or closes the option list.
    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open();
        }
    }

    /// Opens the option list, re-reading the current value.
    pub fn open(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        let value = self.value.clone();
        self.set_value(&value);
        if let Some(callback) = &self.on_opened {
            callback.call(self.id.clone());
        }
    }

    /// Closes the option list.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Some(callback) = &self.on_closed {
            callback.call(self.id.clone());
        }
    }

    /// Handles a key on the picker input.
    pub fn handle_key(&mut self, key: TimePickerKey) {
        match key {
            TimePickerKey::Enter | TimePickerKey::Space => self.toggle(),
            TimePickerKey::Escape => self.close(),
            TimePickerKey::ArrowUp | TimePickerKey::ArrowDown if !self.open => {
                let up = key == TimePickerKey::ArrowUp;
                if self.is_24_hour {
                    self.hour = if up {
                        (self.hour + 1) % 24
                    } else if self.hour == 0 {
                        23
                    } else {
                        self.hour - 1
                    };
                } else {
                    // The period stays put; only the 1-12 face moves.
                    let (hour, period) = to_12_hour(self.hour);
                    let hour = match (up, hour) {
                        (true, 12) => 1,
                        (true, h) => h + 1,
                        (false, 1) => 12,
                        (false, h) => h - 1,
                    };
                    self.hour = to_24_hour(hour, period);
                }
                self.update();
            }
            TimePickerKey::ArrowUp | TimePickerKey::ArrowDown => {}
        }
    }

    fn update(&mut self) {
        self.value = self.format();
        if let Some(callback) = &self.on_change {
            callback.call(self.value.clone());
        }
    }

    fn format(&self) -> String {
        format_time_value(
            self.hour,
            self.minute,
            self.second,
            self.is_24_hour,
            self.show_seconds,
        )
    }
}

impl fmt::Debug for TimePickerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimePickerState")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("is_24_hour", &self.is_24_hour)
            .field("show_seconds", &self.show_seconds)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

/// Formats a 24-hour time as a picker value string.
pub fn format_time_value(
    hour: u8,
    minute: u8,
    second: u8,
    is_24_hour: bool,
    show_seconds: bool,
) -> String {
    let (minute, second) = (minute.min(59), second.min(59));
    if is_24_hour {
        let hour = hour.min(23);
        if show_seconds {
            format!("{hour:02}:{minute:02}:{second:02}")
        } else {
            format!("{hour:02}:{minute:02}")
        }
    } else {
        let (hour, period) = to_12_hour(hour);
        if show_seconds {
            format!("{hour}:{minute:02}:{second:02} {period}")
        } else {
            format!("{hour}:{minute:02} {period}")
        }
    }
}

/// Reads a picker value string into a 24-hour `(hour, minute, second)`.
///
/// In 12-hour mode a missing designator means the hour is already 24-hour.
/// In 24-hour mode a designator is ignored.
pub fn parse_time_value(text: &str, is_24_hour: bool) -> (u8, u8, u8) {
    let mut parts = text.split_whitespace();
    let Some(clock) = parts.next() else {
        return (0, 0, 0);
    };
    let period = parts.next().and_then(Meridiem::parse);
    let mut fields = clock.split(':');
    let hour = parse_leading_int(fields.next());
    let minute = parse_leading_int(fields.next()).unwrap_or(0).clamp(0, 59) as u8;
    let second = parse_leading_int(fields.next()).unwrap_or(0).clamp(0, 59) as u8;

    let Some(hour) = hour else {
        return (0, minute, second);
    };
    let hour = match (is_24_hour, period) {
        (false, Some(period)) => to_24_hour(hour.clamp(1, 12) as u8, period),
        _ => hour.clamp(0, 23) as u8,
    };
    (hour, minute, second)
}

/// Tracks which time picker in a container is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimePickerGroup {
    open: Option<String>,
}

impl TimePickerGroup {
    /// Records that `id` opened.
    ///
    /// Returns the id of a different picker that was open and must now close.
    pub fn opened(&mut self, id: &str) -> Option<String> {
        let previous = self.open.replace(id.to_string());
        previous.filter(|prev| prev != id)
    }

    /// Records that `id` closed.
    pub fn closed(&mut self, id: &str) {
        if self.open.as_deref() == Some(id) {
            self.open = None;
        }
    }

    /// Forgets the open picker, e.g. when the surrounding view changes.
    pub fn reset(&mut self) -> Option<String> {
        self.open.take()
    }

    /// Id of the open picker.
    pub fn open_id(&self) -> Option<&str> {
        self.open.as_deref()
    }
}
