//! Scripted drivers for the brickclay calendar engine.
//!
//! Each driver replays a fixed interaction against real pickers and returns
//! the lines the command prints, so the same scripts double as smoke tests.

use std::sync::Arc;

use brickclay_calendar::{
    CalendarConfig, CalendarInstance, CalendarRegistry, CalendarSelection, DateRangePicker,
    GridSide, ScheduleTab, ScheduledDatePicker, ScheduledSelection, TimeContext,
    grid::WEEKDAY_HEADERS, schedule::format_schedule_date,
};
use chrono::NaiveDate;
use parking_lot::Mutex;

/// Installs the `tracing` subscriber used by the binary.
///
/// `RUST_LOG` wins; otherwise warnings plus the engine's info events are shown.
pub fn init_tracing() {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match tracing_subscriber::EnvFilter::try_new("warn,brickclay_calendar=info") {
            Ok(filter) => filter,
            Err(_) => tracing_subscriber::EnvFilter::new("warn"),
        },
    };

    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .try_init();
}

fn display_line(label: &str, picker: &DateRangePicker) -> String {
    let value = picker.display_value();
    let shown = if value.is_empty() {
        format!("<{}>", picker.placeholder())
    } else {
        value
    };
    let key = picker.active_key().unwrap_or("-");
    let state = if picker.is_open() { "open" } else { "closed" };
    format!("{label:<8} {shown:<40} [{key}] {state}")
}

/// Draws the grid shown on `side` as text.
///
/// Anchors are bracketed, in-range days are wrapped in parentheses, and days
/// outside the selectable bounds are replaced by `--`.
pub fn render_grid(picker: &DateRangePicker, side: GridSide) -> String {
    let grid = picker.grid(side);
    let cursor = grid.cursor();
    let mut out = format!("{} {}\n", cursor.name(), cursor.year);
    for header in WEEKDAY_HEADERS {
        out.push_str(&format!(" {header:>2} "));
    }
    out.push('\n');
    for row in grid.rows() {
        for cell in row {
            let state = picker.cell_state(cell);
            let text = if !state.current_month {
                "    ".to_string()
            } else if state.disabled {
                " -- ".to_string()
            } else if state.selected {
                format!("[{:>2}]", cell.day)
            } else if state.in_range {
                format!("({:>2})", cell.day)
            } else {
                format!(" {:>2} ", cell.day)
            };
            out.push_str(&text);
        }
        out.push('\n');
    }
    out
}

/// Lists presets with their spans, marking the active one.
pub fn render_presets(picker: &DateRangePicker) -> Vec<String> {
    picker
        .presets()
        .iter()
        .map(|range| {
            let marker = if picker.active_key() == Some(range.name.as_str()) {
                '*'
            } else {
                ' '
            };
            if range.is_custom_placeholder() {
                format!("{marker} {}", range.name)
            } else {
                format!("{marker} {:<14} {} .. {}", range.name, range.start, range.end)
            }
        })
        .collect()
}

/// Mounts three pickers on one registry and replays a short session.
pub fn demo(config: CalendarConfig, today: NaiveDate) -> Vec<String> {
    let mut lines = Vec::new();
    let registry = CalendarRegistry::new();
    let emitted: Arc<Mutex<Vec<CalendarSelection>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&emitted);

    let report = CalendarInstance::mount(
        DateRangePicker::new(config)
            .with_today(today)
            .on_selected(move |selection: CalendarSelection| sink.lock().push(selection)),
        &registry,
    );
    let due = CalendarInstance::mount(
        DateRangePicker::new(
            CalendarConfig::default()
                .single_date_picker(true)
                .auto_apply(true)
                .min_date(today),
        )
        .with_today(today),
        &registry,
    );
    let days = CalendarInstance::mount(
        DateRangePicker::new(
            CalendarConfig::default()
                .multi_date_selection(true)
                .inline(true),
        )
        .with_today(today),
        &registry,
    );

    let snapshot = |lines: &mut Vec<String>| {
        lines.push(display_line("report", &report.lock()));
        lines.push(display_line("due", &due.lock()));
        lines.push(display_line("days", &days.lock()));
    };
    snapshot(&mut lines);

    lines.push("-- pick a custom range with times".to_string());
    report.toggle();
    report.with(|picker| {
        let start = picker.start_context();
        picker.set_time_from_str(start, "9:00 AM");
        picker.set_time_from_str(TimeContext::End, "5:30 PM");
        picker.select_day(20, GridSide::Left);
        picker.hover_day(4, GridSide::Right);
        picker.select_day(4, GridSide::Right);
    });
    lines.push(render_grid(&report.lock(), GridSide::Left));
    report.with(DateRangePicker::apply);
    snapshot(&mut lines);

    lines.push("-- choose a preset".to_string());
    report.toggle();
    report.with(|picker| {
        let last = picker
            .presets()
            .iter()
            .filter(|range| !range.is_custom_placeholder())
            .last()
            .map(|range| range.name.clone());
        if let Some(name) = last {
            picker.choose_range(&name);
        }
    });
    lines.extend(render_presets(&report.lock()));
    report.with(DateRangePicker::apply);

    lines.push("-- opening one popup closes the other".to_string());
    report.toggle();
    due.toggle();
    snapshot(&mut lines);
    due.with(|picker| {
        if let Some(yesterday) = today.pred_opt() {
            picker.select_date(yesterday);
        }
        picker.select_date(today);
    });

    lines.push("-- toggle a few days inline".to_string());
    days.with(|picker| {
        for day in [3, 9, 3, 14] {
            picker.select_day(day, GridSide::Left);
        }
    });
    snapshot(&mut lines);

    registry.close_all();
    lines.push(format!(
        "report emitted {} value(s); {} picker(s) mounted",
        emitted.lock().len(),
        registry.len()
    ));
    lines
}

/// Replays a scheduling session across all three tabs.
pub fn schedule(today: NaiveDate) -> Vec<String> {
    let log: Arc<Mutex<Vec<ScheduledSelection>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let mut schedule = ScheduledDatePicker::new()
        .with_today(today)
        .on_scheduled(move |selection: ScheduledSelection| sink.lock().push(selection));
    let day = |offset: u64| {
        today
            .checked_add_days(chrono::Days::new(offset))
            .unwrap_or(today)
    };

    schedule.select_date(day(2));
    schedule.set_single_start_time("10:00 AM");
    schedule.set_single_end_time("11:30 AM");

    schedule.set_tab(ScheduleTab::Multiple);
    schedule.select_date(day(3));
    schedule.select_date(day(5));
    schedule.set_multiple_start_time(1, "2:00 PM");
    schedule.toggle_multiple_all_day(0);

    schedule.set_tab(ScheduleTab::Range);
    schedule.select_date(day(7));
    schedule.select_date(day(10));
    schedule.toggle_range_all_day();

    let mut lines = Vec::new();
    for selection in log.lock().iter() {
        lines.push(describe_schedule(selection));
    }
    lines
}

fn describe_schedule(selection: &ScheduledSelection) -> String {
    match selection.mode {
        ScheduleTab::Single => match &selection.single_date {
            Some(span) => format!(
                "single   {} {} - {}",
                format_schedule_date(span.start_date.date()),
                span.start_date.time(),
                span.end_date.time()
            ),
            None => "single   <none>".to_string(),
        },
        ScheduleTab::Multiple => {
            let days: Vec<String> = selection
                .multiple_dates
                .iter()
                .flatten()
                .map(|config| {
                    let when = if config.all_day {
                        "all day".to_string()
                    } else {
                        format!("{} - {}", config.start_time, config.end_time)
                    };
                    format!("{} ({when})", format_schedule_date(config.date.date()))
                })
                .collect();
            format!("multiple {}", days.join(", "))
        }
        ScheduleTab::Range => match &selection.date_range {
            Some(span) => format!(
                "range    {} .. {}{}",
                span.start_date,
                span.end_date,
                if span.all_day { " (all day)" } else { "" }
            ),
            None => "range    <none>".to_string(),
        },
    }
}
