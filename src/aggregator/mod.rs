//! Aggregation of correlated records into weight tables.
//!
//! This module provides:
//! - The nested entity -> label -> weight table
//! - Label types for stacks, counters and timer levels
//! - Collapsed stack building for sampled profiles

pub mod labels;
pub mod stack_builder;
pub mod table;

// Re-export main types and functions
pub use labels::{CounterLabel, StackLabel, TimerLabel};
pub use stack_builder::{build_stack_table, collapse_stack, escape_symbol, record_sample, thread_label, StackProfile};
pub use table::AggregationTable;
