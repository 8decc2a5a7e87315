//! Typed records decoded from `xperf -a dumper` output.
//!
//! Field layouts (column names as printed by xperf):
//!
//! ```text
//! SampledProfile, TimeStamp, Process Name ( PID), ThreadID, PrgrmCtr, CPU, ...
//! Stack,          TimeStamp, ThreadID, No., Address, Image!Function
//! Pmc,            TimeStamp, ThreadID, <counter>, <counter>, ...
//! CSwitch,        TimeStamp, New Process Name ( PID), New TID, ..., Old Process Name ( PID), Old TID, ..., CPU, ...
//! ```

use crate::utils::config::{IDLE_PROCESS_ID, IDLE_PROCESS_NAME};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a process, or of one thread within it
///
/// Equality is structural over every field; no normalization of the
/// name happens here. Merging by name is a reporting concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub name: String,
    pub pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tid: Option<u32>,
}

impl EntityKey {
    pub fn process(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
            tid: None,
        }
    }

    pub fn with_thread(mut self, tid: u32) -> Self {
        self.tid = Some(tid);
        self
    }

    /// The same entity at process granularity
    pub fn without_thread(&self) -> Self {
        Self::process(self.name.clone(), self.pid)
    }

    /// True for the idle sentinel `Idle (0)`, regardless of thread
    pub fn is_idle(&self) -> bool {
        self.pid == IDLE_PROCESS_ID && self.name == IDLE_PROCESS_NAME
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.pid)?;
        if let Some(tid) = self.tid {
            write!(f, " [{}]", tid)?;
        }
        Ok(())
    }
}

/// A `SampledProfile` event: the CPU was found running this thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSample {
    pub timestamp: u64,
    pub process: EntityKey,
    pub tid: u32,
    pub program_counter: u64,
    pub cpu: u32,
}

/// One `Stack` line. A full call stack is a run of these, leaf first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub timestamp: u64,
    pub tid: u32,
    pub depth: u32,
    pub address: u64,
    pub symbol: String,
}

/// A `Pmc` event: cumulative per-CPU hardware counter values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterReading {
    pub timestamp: u64,
    pub tid: u32,
    pub counters: Vec<u64>,
}

/// A `CSwitch` event: `new_process` starts running on `cpu`, `old_process` stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingTransition {
    pub timestamp: u64,
    pub new_process: EntityKey,
    pub new_tid: u32,
    pub old_process: EntityKey,
    pub old_tid: u32,
    pub cpu: u32,
}

/// Any record kind the correlator understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    ProfileSample(ProfileSample),
    StackFrame(StackFrame),
    CounterReading(CounterReading),
    SchedulingTransition(SchedulingTransition),
}

/// Record kind, as recognised from the literal first field alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    ProfileSample,
    StackFrame,
    CounterReading,
    SchedulingTransition,
}

impl RecordKind {
    /// Minimum number of comma-separated fields, including the kind token
    pub fn min_fields(self) -> usize {
        match self {
            RecordKind::ProfileSample => 6,
            RecordKind::StackFrame => 6,
            RecordKind::CounterReading => 4,
            RecordKind::SchedulingTransition => 17,
        }
    }
}
