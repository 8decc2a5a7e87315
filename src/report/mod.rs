//! Ranking and rendering of aggregation tables.
//!
//! This module provides:
//! - Filtering, grouping and ordering of table entities
//! - Columnar text output for each pipeline
//! - The JSON report document

pub mod ranking;
pub mod schema;
pub mod text;

// Re-export main types and functions
pub use ranking::{rank, RankKey, ReportKey, ReportOptions, ReportRow, Threshold};
pub use schema::{Report, ReportEntry, ReportKind, ReportValue};
pub use text::{
    counter_table_header, format_counter_row, format_counter_table, format_stack_summary, format_timer_summary,
};
