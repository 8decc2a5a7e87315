//! Xperf Trace Studio
//!
//! Streaming correlation and aggregation of events exported from Windows
//! ETW traces by `xperf -a dumper` and wpaexporter.
//!
//! Three pipelines share one parser and one aggregation table:
//! - sampled profile events joined with their call stacks, collapsed per thread
//! - PMC snapshots joined with context switches, attributed as per-process deltas
//! - timer resolution changes, attributed as time spent at each level
//!
//! ## Getting Started
//!
//! ```bash
//! xperf -i trace.etl -o dump.txt -a dumper -stacktimeshifting
//! xperf-trace stacks dump.txt --threads 3 --flamegraph
//! ```

pub mod aggregator;
pub mod attribution;
pub mod classify;
pub mod commands;
pub mod correlator;
pub mod flamegraph;
pub mod output;
pub mod parser;
pub mod report;
pub mod utils;
