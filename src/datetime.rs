// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Date parsing and display helpers. All times are interpreted in the local timezone so that
//! midnight typed in a dialog is local midnight, not UTC midnight.

use crate::error::ParseError;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Format used to prefill dialog fields and to show full timestamps.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted input formats, most specific first (seconds are optional).
const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses `YYYY-MM-DD HH:mm:ss` or `YYYY-MM-DD HH:mm` as a local timestamp.
/// Ambiguous local times (DST fall-back) resolve to the earlier instant; skipped ones fail.
pub fn parse_local(s: &str) -> Result<DateTime<Local>, ParseError> {
    let s = s.trim();
    for fmt in INPUT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            if let Some(dt) = naive.and_local_timezone(Local).earliest() {
                return Ok(dt);
            }
        }
    }
    Err(ParseError {
        input: s.to_string(),
    })
}

/// Local timestamp for a unix epoch, or `None` when out of range.
pub fn from_epoch(secs: i64) -> Option<DateTime<Local>> {
    Local.timestamp_opt(secs, 0).single()
}

/// Start of the given calendar day in local time.
pub fn local_midnight(day: NaiveDate) -> DateTime<Local> {
    let naive = day.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

pub fn format_datetime(dt: &DateTime<Local>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub fn format_time(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M").to_string()
}

/// Day header label, e.g. `Tuesday 05 March 2024`.
pub fn format_day(day: &NaiveDate) -> String {
    day.format("%A %d %B %Y").to_string()
}

/// `1h 30m` when at least an hour, else `45m`. Negative durations show as `0m`.
pub fn format_duration(d: Duration) -> String {
    let mins = d.num_minutes().max(0);
    let hours = mins / 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, mins % 60)
    } else {
        format!("{}m", mins)
    }
}

/// Tags as a bracketed suffix: `" [a,b]"`, or an empty string when there are none.
pub fn beautify_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(","))
    }
}
