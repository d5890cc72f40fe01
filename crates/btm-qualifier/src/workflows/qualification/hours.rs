//! Opening-hours parsing for Places `weekday_text` lines such as
//! `"Monday: 9:00 AM – 9:00 PM"`.

use super::domain::{DaySchedule, StoreHours};
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_DAYS_OPEN: u8 = 5;
pub const MIN_AVERAGE_HOURS: f64 = 9.0;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const HOURS_UNAVAILABLE: &str = "Hours not available";
const CLOSED: &str = "Closed";
const OPEN_ALL_DAY: &str = "Open 24 hours";

fn range_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"\s*[–−-]\s*").expect("separator pattern compiles"))
}

fn clock_time() -> &'static Regex {
    static CLOCK: OnceLock<Regex> = OnceLock::new();
    CLOCK.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*([AaPp][Mm])?$").expect("clock pattern compiles")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ClockTime {
    hour: u32,
    minute: u32,
    meridiem: Option<Meridiem>,
}

impl ClockTime {
    fn parse(raw: &str) -> Option<Self> {
        let captures = clock_time().captures(raw.trim())?;
        let hour = captures.get(1)?.as_str().parse::<u32>().ok()?;
        let minute = match captures.get(2) {
            Some(minute) => minute.as_str().parse::<u32>().ok()?,
            None => 0,
        };
        let meridiem = captures.get(3).map(|period| {
            if period.as_str().eq_ignore_ascii_case("am") {
                Meridiem::Am
            } else {
                Meridiem::Pm
            }
        });

        if minute > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            meridiem,
        })
    }

    /// Fractional hour of day, `None` for impossible times.
    fn as_hours(&self, meridiem: Option<Meridiem>) -> Option<f64> {
        let hour = match meridiem {
            Some(_) if self.hour == 0 || self.hour > 12 => return None,
            Some(Meridiem::Am) if self.hour == 12 => 0,
            Some(Meridiem::Am) => self.hour,
            Some(Meridiem::Pm) if self.hour == 12 => 12,
            Some(Meridiem::Pm) => self.hour + 12,
            None if self.hour > 24 => return None,
            None => self.hour,
        };
        Some(hour as f64 + self.minute as f64 / 60.0)
    }
}

/// Hours covered by a single `start – end` range, wrapping past midnight.
fn range_hours(range: &str) -> Option<f64> {
    let parts: Vec<&str> = range_separator().split(range.trim()).collect();
    let [start, end] = parts.as_slice() else {
        return None;
    };

    let start = ClockTime::parse(start)?;
    let end = ClockTime::parse(end)?;
    // "5 – 11 PM": a bare start borrows the end's period and vice versa.
    let start_hours = start.as_hours(start.meridiem.or(end.meridiem))?;
    let end_hours = end.as_hours(end.meridiem.or(start.meridiem))?;

    if end_hours > start_hours {
        Some(end_hours - start_hours)
    } else {
        Some(24.0 - start_hours + end_hours)
    }
}

fn parse_day(line: &str) -> DaySchedule {
    let (day, hours) = match line.split_once(": ") {
        Some((day, hours)) if !hours.trim().is_empty() => (day.trim(), hours.trim()),
        Some((day, _)) => (day.trim(), CLOSED),
        None => (line.trim(), CLOSED),
    };

    let is_open = !hours.eq_ignore_ascii_case(CLOSED);
    let hours_count = if !is_open {
        0.0
    } else if hours.eq_ignore_ascii_case(OPEN_ALL_DAY) {
        24.0
    } else {
        hours.split(", ").filter_map(range_hours).sum()
    };

    DaySchedule {
        day: day.to_string(),
        hours: hours.to_string(),
        is_open,
        hours_count,
    }
}

fn unavailable_schedule() -> Vec<DaySchedule> {
    WEEKDAYS
        .iter()
        .map(|day| DaySchedule {
            day: day.to_string(),
            hours: HOURS_UNAVAILABLE.to_string(),
            is_open: false,
            hours_count: 0.0,
        })
        .collect()
}

pub(crate) fn parse_store_hours(weekday_text: Option<&[String]>) -> StoreHours {
    let lines = match weekday_text {
        Some(lines) if !lines.is_empty() => lines,
        _ => {
            return StoreHours {
                days_open: 0,
                average_hours_per_day: 0.0,
                meets_requirements: false,
                weekly_schedule: unavailable_schedule(),
            }
        }
    };

    let weekly_schedule: Vec<DaySchedule> = lines.iter().map(|line| parse_day(line)).collect();
    let days_open = weekly_schedule.iter().filter(|day| day.is_open).count() as u8;
    let total_hours: f64 = weekly_schedule.iter().map(|day| day.hours_count).sum();
    let average_hours_per_day = if days_open > 0 {
        total_hours / days_open as f64
    } else {
        0.0
    };

    StoreHours {
        days_open,
        average_hours_per_day,
        meets_requirements: days_open >= MIN_DAYS_OPEN && average_hours_per_day >= MIN_AVERAGE_HOURS,
        weekly_schedule,
    }
}
