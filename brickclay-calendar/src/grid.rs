//! Month grids for calendar views.
//!
//! ## Usage
//!
//! Call [`build_grid`] with a year and a zero-based month to get the 6x7 cell
//! layout a calendar renders. Weeks always start on Monday and the grid always
//! has six rows, so switching months never changes the grid height.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// Number of rows in every month grid.
pub const GRID_ROWS: usize = 6;
/// Number of columns (days per week) in every month grid.
pub const GRID_COLUMNS: usize = 7;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Short weekday labels in grid column order.
pub const WEEKDAY_HEADERS: [&str; GRID_COLUMNS] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Which month a grid cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellMonth {
    /// Trailing days of the month before the displayed one.
    Previous,
    /// Days of the displayed month.
    Current,
    /// Leading days of the month after the displayed one.
    Next,
}

/// One day cell in a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarCell {
    /// Day of month shown in the cell (1..=31).
    pub day: u32,
    /// Month the cell belongs to.
    pub month: CellMonth,
    /// Calendar date the cell stands for.
    pub date: NaiveDate,
}

impl CalendarCell {
    /// Whether the cell belongs to the displayed month.
    pub fn is_current_month(&self) -> bool {
        self.month == CellMonth::Current
    }
}

/// A 6x7 month grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    cursor: MonthCursor,
    rows: [[CalendarCell; GRID_COLUMNS]; GRID_ROWS],
}

impl CalendarGrid {
    /// Month this grid displays.
    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    /// Rows of the grid, top to bottom.
    pub fn rows(&self) -> &[[CalendarCell; GRID_COLUMNS]; GRID_ROWS] {
        &self.rows
    }

    /// All 42 cells in reading order.
    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.rows.iter().flatten()
    }

    /// Cell at `row`/`column`, if both are in range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&CalendarCell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// A displayed month: zero-based `month` (0..=11) and `year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthCursor {
    /// Year shown.
    pub year: i32,
    /// Month shown, 0 = January.
    pub month: u32,
}

impl MonthCursor {
    /// Creates a cursor, folding out-of-range months into the year.
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year: year + (month / 12) as i32,
            month: month % 12,
        }
    }

    /// Cursor showing the month that contains `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    /// The following month, rolling December over into January.
    pub fn next(self) -> Self {
        if self.month >= 11 {
            Self {
                year: self.year + 1,
                month: 0,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month, rolling January back into December.
    pub fn prev(self) -> Self {
        if self.month == 0 {
            Self {
                year: self.year - 1,
                month: 11,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First day of the month, or `None` for years chrono cannot represent.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
    }

    /// Date for `day` of this month, if that day exists.
    pub fn date(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, day)
    }

    /// English month name.
    pub fn name(self) -> &'static str {
        month_name(self.month)
    }

    /// Builds the grid for this month.
    pub fn grid(self) -> CalendarGrid {
        build_grid(self.year, self.month)
    }
}

/// English name for a zero-based month; out-of-range values wrap.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month % 12) as usize]
}

/// Number of days in the zero-based `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let cursor = MonthCursor::new(year, month);
    match (cursor.first_day(), cursor.next().first_day()) {
        (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
        // Outside chrono's range; fall back to the proleptic Gregorian rule.
        _ => match cursor.month + 1 {
            2 if is_leap_year(cursor.year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        },
    }
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Builds the 6x7 grid for the zero-based `month` of `year`.
///
/// Leading cells hold the trailing days of the previous month, trailing cells
/// count up through the next month until all 42 cells are filled.
pub fn build_grid(year: i32, month: u32) -> CalendarGrid {
    let cursor = MonthCursor::new(year, month);
    // chrono covers roughly +-262000 years; clamp so the builder stays total.
    let first = cursor.first_day().unwrap_or(if year < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    });
    let leading = first.weekday().num_days_from_monday() as u64;
    let origin = first.checked_sub_days(Days::new(leading)).unwrap_or(first);
    let current_len = days_in_month(cursor.year, cursor.month);

    let mut rows = [[CalendarCell {
        day: 1,
        month: CellMonth::Current,
        date: first,
    }; GRID_COLUMNS]; GRID_ROWS];

    let prev_len = days_in_month(cursor.prev().year, cursor.prev().month);
    for (index, cell) in rows.iter_mut().flatten().enumerate() {
        let index = index as u32;
        let leading = leading as u32;
        let (day, month) = if index < leading {
            (prev_len - (leading - 1 - index), CellMonth::Previous)
        } else if index - leading < current_len {
            (index - leading + 1, CellMonth::Current)
        } else {
            (index - leading - current_len + 1, CellMonth::Next)
        };
        let date = origin
            .checked_add_days(Days::new(index as u64))
            .unwrap_or(origin);
        *cell = CalendarCell { day, month, date };
    }

    CalendarGrid { cursor, rows }
}

/// Weekday of the first day in the month, Monday = 0 through Sunday = 6.
pub fn first_weekday_index(year: i32, month: u32) -> u32 {
    MonthCursor::new(year, month)
        .first_day()
        .map(|d| d.weekday().num_days_from_monday())
        .unwrap_or(Weekday::Mon.num_days_from_monday())
}

/// `date` shifted by whole months, clamping the day to the target month.
pub fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let shifted = if delta >= 0 {
        date.checked_add_months(Months::new(delta as u32))
    } else {
        date.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}
