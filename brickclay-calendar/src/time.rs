//! Twelve-hour time-of-day state composed onto selected dates.
//!
//! ## Usage
//!
//! A picker keeps one [`TimeOfDay`] per [`TimeContext`] and writes it onto a
//! date with [`TimeOfDay::apply_to`]. Editing always happens in 12-hour form;
//! the 24-hour hour only exists on the resulting `NaiveDateTime`.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Indicates whether a time is before or after noon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Meridiem {
    /// Ante meridiem (before noon).
    #[default]
    #[serde(rename = "AM")]
    Am,
    /// Post meridiem (after noon).
    #[serde(rename = "PM")]
    Pm,
}

impl Meridiem {
    /// The other half of the day.
    pub fn toggled(self) -> Self {
        match self {
            Meridiem::Am => Meridiem::Pm,
            Meridiem::Pm => Meridiem::Am,
        }
    }

    /// Parses `AM`/`PM` case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "AM" => Some(Meridiem::Am),
            "PM" => Some(Meridiem::Pm),
            _ => None,
        }
    }

    /// Label shown in pickers.
    pub fn as_str(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which time sub-state an edit targets.
///
/// A single-grid picker uses [`TimeContext::Single`]; a dual-grid picker keeps
/// separate [`TimeContext::Start`] and [`TimeContext::End`] states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeContext {
    /// The only time of a single-grid picker.
    Single,
    /// Start time of a dual-grid picker.
    Start,
    /// End time of a dual-grid picker.
    End,
}

/// Converts a 12-hour clock hour to 24-hour form.
pub fn to_24_hour(hour: u8, meridiem: Meridiem) -> u8 {
    let hour = clamp_hour12(hour);
    match meridiem {
        Meridiem::Pm if hour < 12 => hour + 12,
        Meridiem::Am if hour == 12 => 0,
        _ => hour,
    }
}

/// Converts a 24-hour clock hour to 12-hour form.
pub fn to_12_hour(hour: u8) -> (u8, Meridiem) {
    let hour = hour.min(23);
    if hour >= 12 {
        (if hour > 12 { hour - 12 } else { 12 }, Meridiem::Pm)
    } else {
        (if hour == 0 { 12 } else { hour }, Meridiem::Am)
    }
}

/// Editable time of day in 12-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
    second: u8,
    meridiem: Meridiem,
}

impl Default for TimeOfDay {
    /// `12:00:00 AM`, i.e. midnight.
    fn default() -> Self {
        Self::midnight()
    }
}

impl TimeOfDay {
    /// Creates a time, clamping every field into range.
    pub fn new(hour: u8, minute: u8, second: u8, meridiem: Meridiem) -> Self {
        Self {
            hour: clamp_hour12(hour),
            minute: minute.min(59),
            second: second.min(59),
            meridiem,
        }
    }

    /// `12:00:00 AM`.
    pub fn midnight() -> Self {
        Self::new(12, 0, 0, Meridiem::Am)
    }

    /// Builds a 12-hour time from a 24-hour wall-clock reading.
    pub fn from_24_hour(hour: u8, minute: u8, second: u8) -> Self {
        let (hour, meridiem) = to_12_hour(hour);
        Self::new(hour, minute, second, meridiem)
    }

    /// Reads the wall-clock time of a date-time.
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self::from_24_hour(value.hour() as u8, value.minute() as u8, value.second() as u8)
    }

    /// Parses `"H:MM AM"`, `"H:MM:SS PM"` or 24-hour `"HH:MM[:SS]"`.
    ///
    /// Never fails: an empty string or unreadable parts fall back to
    /// `12:00 AM` and out-of-range parts are clamped.
    pub fn parse_lenient(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::midnight();
        }
        let mut parts = text.split_whitespace();
        let clock = parts.next().unwrap_or("12:00");
        let meridiem = parts.next().and_then(Meridiem::parse);

        let mut fields = clock.split(':');
        let Some(hour) = parse_leading_int(fields.next()) else {
            return Self::midnight();
        };
        let minute = parse_leading_int(fields.next()).unwrap_or(0);
        let second = parse_leading_int(fields.next()).unwrap_or(0);
        let minute = minute.clamp(0, 59) as u8;
        let second = second.clamp(0, 59) as u8;

        match meridiem {
            Some(meridiem) => Self::new(hour.clamp(1, 12) as u8, minute, second, meridiem),
            None => {
                // No designator: read the hour as 24-hour time.
                let (hour, meridiem) = to_12_hour(hour.clamp(0, 23) as u8);
                Self::new(hour, minute, second, meridiem)
            }
        }
    }

    /// Hour in 12-hour form (1..=12).
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0..=59).
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0..=59).
    pub fn second(&self) -> u8 {
        self.second
    }

    /// AM or PM.
    pub fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    /// Hour in 24-hour form (0..=23).
    pub fn hour_24(&self) -> u8 {
        to_24_hour(self.hour, self.meridiem)
    }

    /// Sets the hour, clamped to 1..=12.
    pub fn set_hour(&mut self, hour: u8) {
        self.hour = clamp_hour12(hour);
    }

    /// Sets the minute, clamped to 0..=59.
    pub fn set_minute(&mut self, minute: u8) {
        self.minute = minute.min(59);
    }

    /// Sets AM or PM.
    pub fn set_meridiem(&mut self, meridiem: Meridiem) {
        self.meridiem = meridiem;
    }

    /// Advances the hour, wrapping 12 -> 1.
    ///
    /// Landing on 12 flips the meridiem, so 11 AM becomes 12 PM.
    pub fn increment_hour(&mut self) {
        self.hour = if self.hour >= 12 { 1 } else { self.hour + 1 };
        if self.hour == 12 {
            self.meridiem = self.meridiem.toggled();
        }
    }

    /// Moves the hour back, wrapping 1 -> 12.
    ///
    /// Landing on 12 flips the meridiem, so 1 PM becomes 12 AM.
    pub fn decrement_hour(&mut self) {
        self.hour = if self.hour <= 1 { 12 } else { self.hour - 1 };
        if self.hour == 12 {
            self.meridiem = self.meridiem.toggled();
        }
    }

    /// Advances the minute, wrapping 59 -> 0 without touching the hour.
    pub fn increment_minute(&mut self) {
        self.minute = (self.minute + 1) % 60;
    }

    /// Moves the minute back, wrapping 0 -> 59 without touching the hour.
    pub fn decrement_minute(&mut self) {
        self.minute = if self.minute == 0 { 59 } else { self.minute - 1 };
    }

    /// Flips AM/PM.
    pub fn toggle_meridiem(&mut self) {
        self.meridiem = self.meridiem.toggled();
    }

    /// The time as a chrono value.
    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(
            u32::from(self.hour_24()),
            u32::from(self.minute),
            u32::from(self.second),
        )
        .unwrap_or(NaiveTime::MIN)
    }

    /// A new date-time with this time on `date`.
    pub fn apply_to(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.to_naive_time())
    }

    /// `H:MM AM`, the format exchanged with time pickers.
    pub fn picker_label(&self) -> String {
        format!("{}:{:02} {}", self.hour, self.minute, self.meridiem)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{:02}:{:02} {}",
            self.hour, self.minute, self.second, self.meridiem
        )
    }
}

/// Time sub-states of one picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeContexts {
    /// Time of a single-grid picker.
    pub single: TimeOfDay,
    /// Start time of a dual-grid picker.
    pub start: TimeOfDay,
    /// End time of a dual-grid picker.
    pub end: TimeOfDay,
}

impl Default for TimeContexts {
    fn default() -> Self {
        Self {
            single: TimeOfDay::new(1, 0, 0, Meridiem::Am),
            start: TimeOfDay::new(1, 0, 0, Meridiem::Am),
            end: TimeOfDay::new(2, 0, 0, Meridiem::Am),
        }
    }
}

impl TimeContexts {
    /// The state behind `context`.
    pub fn get(&self, context: TimeContext) -> TimeOfDay {
        match context {
            TimeContext::Single => self.single,
            TimeContext::Start => self.start,
            TimeContext::End => self.end,
        }
    }

    /// Mutable access to the state behind `context`.
    pub fn get_mut(&mut self, context: TimeContext) -> &mut TimeOfDay {
        match context {
            TimeContext::Single => &mut self.single,
            TimeContext::Start => &mut self.start,
            TimeContext::End => &mut self.end,
        }
    }

    /// Exchanges start and end, used when a range is flipped.
    pub fn swap_start_end(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }
}

/// Free-text hour/minute fields of one time context.
///
/// While the user types, the literal text is kept and shown back verbatim;
/// the minute is zero-padded only when the field loses focus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeEntry {
    raw_minute: Option<String>,
}

impl TimeEntry {
    /// Handles a keystroke in the hour field.
    ///
    /// Returns the clamped hour (1..=12) to store, or `None` while the field
    /// is empty.
    pub fn hour_input(text: &str) -> Option<u8> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let value = parse_leading_int(Some(text)).unwrap_or(0);
        Some(value.clamp(1, 12) as u8)
    }

    /// Handles the hour field losing focus; returns the hour and its text.
    ///
    /// An empty field restores `current`.
    pub fn hour_blur(text: &str, current: u8) -> (u8, String) {
        let hour = Self::hour_input(text).unwrap_or(clamp_hour12(current));
        (hour, hour.to_string())
    }

    /// Handles a keystroke in the minute field.
    ///
    /// Non-digits are dropped, at most two digits are kept and values above
    /// 59 become `59`. Returns the minute to store, or `None` while empty.
    pub fn minute_input(&mut self, text: &str) -> Option<u8> {
        let mut digits: String = text.chars().filter(char::is_ascii_digit).collect();
        digits.truncate(2);
        if digits.is_empty() {
            self.raw_minute = Some(digits);
            return None;
        }
        let mut value: u8 = digits.parse().unwrap_or(0);
        if value > 59 {
            value = 59;
            digits = "59".to_string();
        }
        self.raw_minute = Some(digits);
        Some(value)
    }

    /// Handles the minute field losing focus; returns the minute and its
    /// zero-padded text. The whole field is read and clamped to 59, and an
    /// empty field restores `current`.
    pub fn minute_blur(&mut self, text: &str, current: u8) -> (u8, String) {
        self.raw_minute = None;
        let digits: String = text.chars().filter(char::is_ascii_digit).collect();
        let value = if digits.is_empty() {
            current.min(59)
        } else {
            // Digits only, so a failed parse means the value overflowed.
            digits.parse::<u64>().map_or(59, |value| value.min(59) as u8)
        };
        (value, format!("{value:02}"))
    }

    /// Text to show in the minute field.
    pub fn minute_display(&self, current: u8) -> String {
        match &self.raw_minute {
            Some(raw) => raw.clone(),
            None => format!("{:02}", current.min(59)),
        }
    }

    /// Whether the user is mid-edit in the minute field.
    pub fn is_typing(&self) -> bool {
        self.raw_minute.is_some()
    }

    /// Drops any in-progress minute text.
    pub fn finish(&mut self) {
        self.raw_minute = None;
    }
}

fn clamp_hour12(hour: u8) -> u8 {
    hour.clamp(1, 12)
}

/// Parses the leading decimal digits of `text`, like a lenient `parseInt`.
pub(crate) fn parse_leading_int(text: Option<&str>) -> Option<i64> {
    let text = text?.trim();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text),
    };
    let digits: String = body.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|v| v * sign)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Meridiem::Am)]
    #[case(Meridiem::Pm)]
    fn twelve_hour_round_trips(#[case] meridiem: Meridiem) {
        for hour in 1..=12 {
            let h24 = to_24_hour(hour, meridiem);
            assert!(h24 <= 23);
            assert_eq!(to_12_hour(h24), (hour, meridiem));
        }
    }

    #[test]
    fn conversion_edges() {
        assert_eq!(to_24_hour(12, Meridiem::Am), 0);
        assert_eq!(to_24_hour(12, Meridiem::Pm), 12);
        assert_eq!(to_24_hour(1, Meridiem::Pm), 13);
        assert_eq!(to_12_hour(0), (12, Meridiem::Am));
        assert_eq!(to_12_hour(23), (11, Meridiem::Pm));
    }

    #[test]
    fn hour_increment_flips_meridiem_at_twelve() {
        let mut t = TimeOfDay::new(11, 30, 0, Meridiem::Am);
        t.increment_hour();
        assert_eq!((t.hour(), t.meridiem()), (12, Meridiem::Pm));
        t.increment_hour();
        assert_eq!((t.hour(), t.meridiem()), (1, Meridiem::Pm));
        assert_eq!(t.minute(), 30);
    }

    #[test]
    fn hour_decrement_flips_meridiem_at_twelve() {
        let mut t = TimeOfDay::new(1, 0, 0, Meridiem::Pm);
        t.decrement_hour();
        assert_eq!((t.hour(), t.meridiem()), (12, Meridiem::Am));
        t.decrement_hour();
        assert_eq!((t.hour(), t.meridiem()), (11, Meridiem::Am));
    }

    #[test]
    fn minute_wraps_without_touching_hour() {
        let mut t = TimeOfDay::new(3, 59, 0, Meridiem::Am);
        t.increment_minute();
        assert_eq!((t.hour(), t.minute()), (3, 0));
        t.decrement_minute();
        assert_eq!((t.hour(), t.minute()), (3, 59));
    }

    #[test]
    fn lenient_parse_handles_both_clocks() {
        assert_eq!(
            TimeOfDay::parse_lenient("7:05 pm"),
            TimeOfDay::new(7, 5, 0, Meridiem::Pm)
        );
        assert_eq!(
            TimeOfDay::parse_lenient("19:01:30"),
            TimeOfDay::new(7, 1, 30, Meridiem::Pm)
        );
        assert_eq!(
            TimeOfDay::parse_lenient("00:15"),
            TimeOfDay::new(12, 15, 0, Meridiem::Am)
        );
        assert_eq!(TimeOfDay::parse_lenient(""), TimeOfDay::midnight());
        assert_eq!(TimeOfDay::parse_lenient("garbage"), TimeOfDay::midnight());
    }

    #[test]
    fn apply_to_writes_24_hour_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let value = TimeOfDay::new(12, 45, 10, Meridiem::Pm).apply_to(date);
        assert_eq!(value, date.and_hms_opt(12, 45, 10).unwrap());
        let value = TimeOfDay::new(12, 0, 0, Meridiem::Am).apply_to(date);
        assert_eq!(value, date.and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn minute_typing_is_kept_verbatim_until_blur() {
        let mut entry = TimeEntry::default();
        assert_eq!(entry.minute_input("5"), Some(5));
        assert_eq!(entry.minute_display(5), "5");
        assert_eq!(entry.minute_input("75"), Some(59));
        assert_eq!(entry.minute_display(59), "59");
        assert_eq!(entry.minute_input("123"), Some(12));
        assert_eq!(entry.minute_blur("7", 12), (7, "07".to_string()));
        assert!(!entry.is_typing());
        assert_eq!(entry.minute_display(7), "07");
    }

    #[rstest]
    #[case("123", 59)]
    #[case("45", 45)]
    #[case("0007", 7)]
    #[case("99999999999999999999999", 59)]
    fn minute_blur_reads_the_whole_field(#[case] text: &str, #[case] expected: u8) {
        let mut entry = TimeEntry::default();
        let (minute, shown) = entry.minute_blur(text, 30);
        assert_eq!(minute, expected);
        assert_eq!(shown, format!("{expected:02}"));
    }

    #[test]
    fn empty_fields_restore_current_value() {
        let mut entry = TimeEntry::default();
        assert_eq!(entry.minute_input(""), None);
        assert_eq!(entry.minute_display(42), "");
        assert_eq!(entry.minute_blur("", 42), (42, "42".to_string()));
        assert_eq!(TimeEntry::hour_input(""), None);
        assert_eq!(TimeEntry::hour_input("15"), Some(12));
        assert_eq!(TimeEntry::hour_input("0"), Some(1));
        assert_eq!(TimeEntry::hour_blur("", 9), (9, "9".to_string()));
    }
}
