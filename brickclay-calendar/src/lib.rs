//! Framework-agnostic date and date-range selection for calendar widgets.
//!
//! # Usage
//!
//! Build a [`CalendarConfig`], create a [`DateRangePicker`] from it and feed
//! it the interactions your UI layer receives. The picker answers the
//! questions a renderer asks (which month to show, how each cell is
//! highlighted, what the input field reads) and emits a [`CalendarSelection`]
//! whenever the value changes.
//!
//! ```
//! use brickclay_calendar::{CalendarConfig, CalendarSelection, DateRangePicker, GridSide};
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let mut picker = DateRangePicker::new(CalendarConfig::default().auto_apply(true))
//!     .with_today(today)
//!     .on_selected(|selection: CalendarSelection| {
//!         println!("{:?}", selection.start_date);
//!     });
//!
//! picker.open();
//! picker.select_day(15, GridSide::Left);
//! picker.select_day(15, GridSide::Left);
//! assert_eq!(picker.active_key(), Some("Today"));
//! assert!(!picker.is_open());
//! ```
//!
//! Hosts with several pickers on screen mount each one on a shared
//! [`CalendarRegistry`] through [`CalendarInstance`], so opening one closes
//! the others.
#![deny(missing_docs, clippy::unwrap_used)]

pub mod callback;
pub mod config;
pub mod controlled;
pub mod error;
pub mod format;
pub mod grid;
pub mod manager;
pub mod picker;
pub mod presets;
pub mod schedule;
pub mod selection;
pub mod time;
pub mod time_picker;

pub use callback::{Callback, CallbackWith};
pub use config::{CalendarConfig, TimeFormat, parse_iso_date};
pub use controlled::ControlledValue;
pub use error::{CalendarError, Result};
pub use format::DisplayFormat;
pub use grid::{CalendarCell, CalendarGrid, CellMonth, MonthCursor, build_grid, month_name};
pub use manager::{CalendarRegistry, Registration};
pub use picker::{CalendarInstance, CellState, DateRangePicker, GridSide};
pub use presets::{CUSTOM_RANGE, NamedRange, RangePresets};
pub use schedule::{ScheduleTab, ScheduledDatePicker, ScheduledSelection};
pub use selection::{CalendarSelection, DateBounds, SelectionMode};
pub use time::{Meridiem, TimeContext, TimeOfDay};
pub use time_picker::{TimePickerGroup, TimePickerState};
