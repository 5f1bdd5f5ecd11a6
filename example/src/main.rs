use std::path::PathBuf;

use anyhow::{Context, Result};
use brickclay_calendar::{CalendarConfig, DateRangePicker, GridSide, MonthCursor, parse_iso_date};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "example")]
#[command(version, about = "Drive the brickclay calendar engine from the terminal", long_about = None)]
struct Cli {
    /// Picker configuration (TOML)
    #[arg(short, long, default_value = "example/calendar.toml")]
    config: PathBuf,
    /// Date treated as today (YYYY-MM-DD), defaults to the local date
    #[arg(short, long)]
    today: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a session across several mounted pickers
    Demo,
    /// Print the month grid
    Grid {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },
    /// List the configured presets
    Presets,
    /// Replay a scheduling session
    Schedule,
}

fn parse_month(text: &str) -> Result<MonthCursor> {
    let first = parse_iso_date(&format!("{}-01", text.trim()))
        .with_context(|| format!("month `{text}` is not YYYY-MM"))?;
    Ok(MonthCursor::of(first))
}

fn main() -> Result<()> {
    example::init_tracing();
    let Cli {
        config,
        today,
        command,
    } = Cli::parse();

    let today: NaiveDate = match today {
        Some(text) => parse_iso_date(&text)?,
        None => chrono::Local::now().date_naive(),
    };
    let config = CalendarConfig::load(&config)
        .with_context(|| format!("loading {}", config.display()))?;
    tracing::info!(%today, mode = ?config.mode(), "configuration loaded");

    match command {
        Command::Demo => {
            for line in example::demo(config, today) {
                println!("{line}");
            }
        }
        Command::Grid { month } => {
            let mut picker = DateRangePicker::new(config.linked_calendars(true)).with_today(today);
            if let Some(month) = month {
                let target = parse_month(&month)?;
                while picker.cursor_for(GridSide::Left) < target {
                    picker.next_month();
                }
                while picker.cursor_for(GridSide::Left) > target {
                    picker.prev_month();
                }
            }
            print!("{}", example::render_grid(&picker, GridSide::Left));
            if picker.config().dual_calendar {
                println!();
                print!("{}", example::render_grid(&picker, GridSide::Right));
            }
        }
        Command::Presets => {
            let picker = DateRangePicker::new(config).with_today(today);
            for line in example::render_presets(&picker) {
                println!("{line}");
            }
        }
        Command::Schedule => {
            for line in example::schedule(today) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
