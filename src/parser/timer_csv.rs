//! Rows of the wpaexporter "Timer Intervals by Process" export.
//!
//! Column layout (the first line of the file is the column names):
//!
//! ```text
//! Task Name, Process Name, Process, Interval (0x, 100 ns), Time (s), PID (0x), App Name
//! ```
//!
//! `SystemTimeResolutionRequestRundown` rows are emitted at trace end for every
//! process that still has the timer raised. They carry the process through
//! `App Name` and `PID` instead of the `Process` column.

use super::schema::EntityKey;
use super::xperf_dump::parse_entity;
use crate::utils::config::TIMER_RUNDOWN_TASK;

const TIMER_COLUMNS: usize = 7;

/// One timer resolution change (or rundown) for a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRow {
    pub owner: EntityKey,
    /// Requested timer interval in 100 ns units; zero means the request was released
    pub interval: u64,
    /// Microseconds since trace start
    pub timestamp_us: u64,
    pub rundown: bool,
}

/// Parse one data row of the export
///
/// **Public** - returns `None` for short or malformed rows
pub fn parse_timer_row(line: &str) -> Option<TimerRow> {
    let parts: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if parts.len() < TIMER_COLUMNS {
        return None;
    }
    let (task, process, interval, timestamp, pid, app_name) =
        (parts[0], parts[2], parts[3], parts[4], parts[5], parts[6]);

    let interval = parse_hex(interval)?;
    let timestamp_us = parse_seconds(timestamp)?;
    let rundown = task == TIMER_RUNDOWN_TASK;

    let owner = if rundown {
        let pid = u32::try_from(parse_hex(pid)?).ok()?;
        let image = app_name.rsplit(['\\', '/']).next().unwrap_or(app_name);
        if image.is_empty() {
            return None;
        }
        EntityKey::process(image, pid)
    } else {
        parse_entity(process)?
    };

    Some(TimerRow {
        owner,
        interval,
        timestamp_us,
        rundown,
    })
}

fn parse_hex(field: &str) -> Option<u64> {
    let hex = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X"))?;
    u64::from_str_radix(hex, 16).ok()
}

fn parse_seconds(field: &str) -> Option<u64> {
    let seconds = field.parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1e6).round() as u64)
}
