//! Trace dump parsing and record definitions.
//!
//! This module handles:
//! - Reading dump files line by line
//! - Decoding `xperf -a dumper` lines into typed records
//! - Decoding wpaexporter timer interval rows

pub mod lines;
pub mod schema;
pub mod timer_csv;
pub mod xperf_dump;

// Re-export main types
pub use lines::{read_lines, TraceLines};
pub use schema::{
    CounterReading, EntityKey, ProfileSample, Record, RecordKind, SchedulingTransition, StackFrame,
};
pub use timer_csv::{parse_timer_row, TimerRow};
pub use xperf_dump::{is_diagnostic, parse_counter_header, parse_entity, parse_record, record_kind};
