//! Correlation of records that xperf emits separately for one occurrence.
//!
//! - Samples and their call stacks, joined on `{timestamp, thread id}`
//! - Counter snapshots and the context switch they were taken at, joined by adjacency

pub mod counter_pairing;
pub mod pending;
pub mod stack_pairing;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use counter_pairing::{CounterCorrelator, CounterPair};
pub use pending::{PendingPolicy, PendingTable};
pub use stack_pairing::{CorrelatedSample, PendingKey, StackCorrelator};

/// Per-run counters for everything that was absorbed instead of aborting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Lines seen
    pub lines: u64,
    /// Lines decoded into a record this pass cares about
    pub records: u64,
    /// Lines with a known kind prefix that did not decode (column headers included)
    pub malformed: u64,
    /// Correlated pairs emitted
    pub matched: u64,
    /// Samples dropped because they belong to the idle process
    pub idle_samples: u64,
    /// Samples that never received a stack
    pub unmatched_samples: u64,
    /// Stack runs with no pending sample
    pub unmatched_stacks: u64,
    /// Samples that arrived while their key was still pending
    pub key_collisions: u64,
    /// Diagnostic lines skipped between a Pmc and its CSwitch
    pub diagnostics_skipped: u64,
}

impl IngestStats {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} lines | {} records | {} malformed | {} matched | {} unmatched samples | {} unmatched stacks",
            self.lines,
            self.records,
            self.malformed,
            self.matched,
            self.unmatched_samples,
            self.unmatched_stacks
        )
    }
}
