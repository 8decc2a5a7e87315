//! Build collapsed stacks from correlated samples.
//!
//! Collapsed stacks are the input format for flamegraph generation.
//! Format: "thread;root;...;leaf count"
//!
//! Example: "devenv.exe_8872_6148;ntdll.dll!RtlUserThreadStart;rsaenh.dll!TransformMD5 2"
//! The base frame names the process, pid and thread the samples came from.

use super::labels::StackLabel;
use super::table::AggregationTable;
use crate::correlator::{CorrelatedSample, IngestStats, PendingPolicy, StackCorrelator};
use crate::parser::{read_lines, EntityKey, StackFrame};
use crate::utils::config::STACK_ESCAPES;
use crate::utils::error::TraceError;
use log::{debug, info};
use std::io::BufRead;

/// Result of one pass over a dump with sampled profile stacks
#[derive(Debug, Clone)]
pub struct StackProfile {
    /// thread -> collapsed stack -> sample count
    pub table: AggregationTable<StackLabel>,
    pub stats: IngestStats,
}

impl StackProfile {
    pub fn total_samples(&self) -> u64 {
        self.table.grand_total()
    }

    pub fn thread_count(&self) -> usize {
        self.table.len()
    }
}

/// Stream a dump and count every sample under its collapsed stack
///
/// **Public** - main entry point for the stacks pipeline
///
/// # Arguments
/// * `reader` - `xperf -a dumper` output
/// * `policy` - what to do when a sample key is reused before its stack arrives
///
/// # Errors
/// * `TraceError::Io` - the reader failed
pub fn build_stack_table<R: BufRead>(reader: R, policy: PendingPolicy) -> Result<StackProfile, TraceError> {
    let mut correlator = StackCorrelator::new(policy);
    let mut table = AggregationTable::new();

    for line in read_lines(reader) {
        let (_, line) = line?;
        if let Some(correlated) = correlator.push_line(&line) {
            record_sample(&mut table, &correlated, 1);
        }
    }
    if let Some(correlated) = correlator.finish() {
        record_sample(&mut table, &correlated, 1);
    }

    let stats = correlator.stats().clone();
    debug!("Stack ingest: {}", stats.summary());
    info!(
        "Correlated {} samples across {} threads",
        table.grand_total(),
        table.len()
    );

    Ok(StackProfile { table, stats })
}

/// Attribute one correlated sample to its thread and collapsed stack
pub fn record_sample(table: &mut AggregationTable<StackLabel>, correlated: &CorrelatedSample, weight: u64) {
    let thread = correlated
        .sample
        .process
        .clone()
        .with_thread(correlated.sample.tid);
    let label = collapse_stack(&thread, &correlated.frames);
    table.record(thread, label, weight);
}

/// Collapse a leaf-first run of frames into a root-first label
///
/// The thread label becomes the base frame so flame graphs show where the
/// samples came from.
pub fn collapse_stack(thread: &EntityKey, frames: &[StackFrame]) -> StackLabel {
    let mut parts = Vec::with_capacity(frames.len() + 1);
    parts.push(thread_label(thread));
    parts.extend(frames.iter().rev().map(|frame| escape_symbol(&frame.symbol)));
    StackLabel(parts.join(";"))
}

/// `"name (pid)"` plus thread id as a single frame, e.g. `app.exe_1_9`
pub fn thread_label(entity: &EntityKey) -> String {
    let name: String = escape_symbol(&entity.name)
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect();
    match entity.tid {
        Some(tid) => format!("{}_{}_{}", name, entity.pid, tid),
        None => format!("{}_{}", name, entity.pid),
    }
}

/// Replace characters that break the collapsed stack format
///
/// `;` separates frames, spaces separate the count, and quotes confuse
/// flame graph renderers.
pub fn escape_symbol(symbol: &str) -> String {
    let mut escaped = String::with_capacity(symbol.len());
    for c in symbol.chars() {
        match STACK_ESCAPES.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => escaped.push_str(to),
            None => escaped.push(c),
        }
    }
    escaped
}
