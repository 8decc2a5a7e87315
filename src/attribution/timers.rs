//! Time spent at each timer interrupt resolution, per process.
//!
//! Every row of the timer export is a change of the resolution a process
//! requested. The time between two changes is attributed to the level that
//! was active before the second one.
//!
//! A process that had the timer raised before tracing started only shows up
//! in the rundown at trace end. Rundown rows are therefore expanded into
//! synthetic events: a start at timestamp 0 when the process has no earlier
//! change, and a closing event at the rundown time. Real and synthetic
//! events then share one accumulation path.

use crate::aggregator::{AggregationTable, TimerLabel};
use crate::correlator::IngestStats;
use crate::parser::{parse_timer_row, read_lines, EntityKey, TimerRow};
use crate::utils::error::TraceError;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::BufRead;

/// One resolution change, real or synthesized from a rundown row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    pub owner: EntityKey,
    pub interval: u64,
    pub timestamp_us: u64,
    pub synthetic: bool,
}

/// What is known about one process's timer requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHistory {
    /// Changes read from the export
    pub changes: u64,
    /// Events added to close out or open intervals
    pub synthetic: u64,
    /// The first event, kept for processes with a single change
    pub first_interval: u64,
    pub first_timestamp_us: u64,
    last_interval: u64,
    last_timestamp_us: u64,
}

impl TimerHistory {
    /// True if the resolution was still raised when the trace ended
    pub fn raised_at_end(&self) -> bool {
        self.synthetic > 0
    }
}

/// Per-process timer slot state
///
/// **Public** - one instance per ingest pass
#[derive(Debug, Default)]
pub struct TimerAttributor {
    histories: HashMap<EntityKey, TimerHistory>,
    table: AggregationTable<TimerLabel>,
    final_timestamp_us: u64,
}

impl TimerAttributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand a row into the events it stands for
    pub fn expand(&self, row: TimerRow) -> Vec<TimerEvent> {
        let mut events = Vec::with_capacity(2);
        if row.rundown && !self.histories.contains_key(&row.owner) {
            events.push(TimerEvent {
                owner: row.owner.clone(),
                interval: row.interval,
                timestamp_us: 0,
                synthetic: true,
            });
        }
        events.push(TimerEvent {
            owner: row.owner,
            interval: row.interval,
            timestamp_us: row.timestamp_us,
            synthetic: row.rundown,
        });
        events
    }

    /// Apply one row of the export
    ///
    /// # Errors
    /// * `TraceError::NegativeDelta` - time went backwards for this process
    pub fn push_row(&mut self, line: usize, row: TimerRow) -> Result<(), TraceError> {
        self.final_timestamp_us = row.timestamp_us;
        for event in self.expand(row) {
            self.apply(line, event)?;
        }
        Ok(())
    }

    /// Close the segment ending at this event and open the next one
    pub fn apply(&mut self, line: usize, event: TimerEvent) -> Result<(), TraceError> {
        let Some(history) = self.histories.get_mut(&event.owner) else {
            self.histories.insert(
                event.owner,
                TimerHistory {
                    changes: u64::from(!event.synthetic),
                    synthetic: u64::from(event.synthetic),
                    first_interval: event.interval,
                    first_timestamp_us: event.timestamp_us,
                    last_interval: event.interval,
                    last_timestamp_us: event.timestamp_us,
                },
            );
            return Ok(());
        };

        let elapsed = event
            .timestamp_us
            .checked_sub(history.last_timestamp_us)
            .ok_or_else(|| TraceError::NegativeDelta {
                line,
                owner: event.owner.to_string(),
                what: "timestamp".to_string(),
                previous: history.last_timestamp_us,
                current: event.timestamp_us,
            })?;

        self.table
            .record(event.owner.clone(), TimerLabel(history.last_interval), elapsed);

        if event.synthetic {
            history.synthetic += 1;
        } else {
            history.changes += 1;
        }
        history.last_interval = event.interval;
        history.last_timestamp_us = event.timestamp_us;
        Ok(())
    }

    pub fn finish(self) -> (AggregationTable<TimerLabel>, HashMap<EntityKey, TimerHistory>, u64) {
        (self.table, self.histories, self.final_timestamp_us)
    }
}

/// Result of one pass over a timer interval export
#[derive(Debug, Clone)]
pub struct TimerProfile {
    /// process -> resolution level -> microseconds spent at that level
    pub table: AggregationTable<TimerLabel>,
    pub histories: HashMap<EntityKey, TimerHistory>,
    /// Timestamp of the last row, used as the trace duration
    pub trace_duration_us: u64,
    pub stats: IngestStats,
}

/// Stream a timer interval export and attribute time per resolution level
///
/// **Public** - main entry point for the timers pipeline
///
/// The first line holds column names and is skipped.
pub fn attribute_timers<R: BufRead>(reader: R) -> Result<TimerProfile, TraceError> {
    let mut attributor = TimerAttributor::new();
    let mut stats = IngestStats::default();

    for line in read_lines(reader).skip(1) {
        let (line_no, line) = line?;
        stats.lines += 1;
        match parse_timer_row(&line) {
            Some(row) => {
                stats.records += 1;
                attributor.push_row(line_no, row)?;
            }
            None => {
                if !line.trim().is_empty() {
                    warn!("Skipping timer row at line {}: {}", line_no, line.trim());
                }
                stats.malformed += 1;
            }
        }
    }

    let (table, histories, trace_duration_us) = attributor.finish();
    debug!("Timer ingest: {}", stats.summary());
    info!("Found timer requests from {} processes", histories.len());

    Ok(TimerProfile {
        table,
        histories,
        trace_duration_us,
        stats,
    })
}
