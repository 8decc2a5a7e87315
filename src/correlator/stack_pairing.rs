//! Join `SampledProfile` events with the call stacks xperf emits for them.
//!
//! The dumper prints the stack for an event as a contiguous run of `Stack`
//! lines, leaf first, sharing the event's timestamp and thread id. Runs can
//! show up long after their sample and most runs belong to other events
//! (context switches, ready-thread events...), so samples wait in a pending
//! table keyed by `{timestamp, thread id}` until a run claims them.

use super::pending::{PendingPolicy, PendingTable};
use super::IngestStats;
use crate::parser::{parse_record, record_kind, ProfileSample, Record, RecordKind, StackFrame};
use log::{debug, trace};

/// Correlation key shared by a sample and its stack run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingKey {
    pub timestamp: u64,
    pub tid: u32,
}

impl PendingKey {
    fn of_sample(sample: &ProfileSample) -> Self {
        Self {
            timestamp: sample.timestamp,
            tid: sample.tid,
        }
    }

    fn of_frame(frame: &StackFrame) -> Self {
        Self {
            timestamp: frame.timestamp,
            tid: frame.tid,
        }
    }
}

/// A sample together with its call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedSample {
    pub sample: ProfileSample,
    /// Leaf first, as printed by xperf
    pub frames: Vec<StackFrame>,
}

/// A run of contiguous `Stack` lines. `key` is `None` when the first line
/// was not a usable frame (the column header), which discards the run.
#[derive(Debug)]
struct StackRun {
    key: Option<PendingKey>,
    frames: Vec<StackFrame>,
}

/// Streaming sample/stack correlator
///
/// **Public** - fed one line at a time by the stacks pipeline
#[derive(Debug)]
pub struct StackCorrelator {
    pending: PendingTable<PendingKey, ProfileSample>,
    run: Option<StackRun>,
    stats: IngestStats,
}

impl StackCorrelator {
    pub fn new(policy: PendingPolicy) -> Self {
        Self {
            pending: PendingTable::new(policy),
            run: None,
            stats: IngestStats::default(),
        }
    }

    /// Feed the next line of the dump
    ///
    /// # Returns
    /// The sample whose stack run was completed by this line, if any.
    /// A run is only known to be complete once a line that does not
    /// continue it arrives, so the match is reported one line late.
    pub fn push_line(&mut self, line: &str) -> Option<CorrelatedSample> {
        self.stats.lines += 1;
        let kind = record_kind(line);

        if kind == Some(RecordKind::StackFrame) {
            return self.extend_run(line);
        }

        let completed = self.complete_run();

        if kind == Some(RecordKind::ProfileSample) {
            match parse_record(line) {
                Some(Record::ProfileSample(sample)) => self.add_sample(sample),
                _ => self.stats.malformed += 1,
            }
        }

        completed
    }

    /// Flush the last run and give up on samples that never got a stack
    pub fn finish(&mut self) -> Option<CorrelatedSample> {
        let completed = self.complete_run();
        let unmatched = self.pending.drain_unmatched();
        if unmatched > 0 {
            debug!("{} samples never received a stack", unmatched);
        }
        self.stats.unmatched_samples += unmatched as u64;
        self.stats.key_collisions = self.pending.collisions();
        completed
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Number of samples still waiting for a stack
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn add_sample(&mut self, sample: ProfileSample) {
        self.stats.records += 1;
        if sample.process.is_idle() {
            self.stats.idle_samples += 1;
            return;
        }
        let key = PendingKey::of_sample(&sample);
        if self.pending.insert(key, sample) {
            trace!("Sample key {:?} reused before its stack arrived", key);
        }
    }

    fn extend_run(&mut self, line: &str) -> Option<CorrelatedSample> {
        let frame = match parse_record(line) {
            Some(Record::StackFrame(frame)) => Some(frame),
            _ => None,
        };

        let Some(frame) = frame else {
            self.stats.malformed += 1;
            if self.run.is_none() {
                self.run = Some(StackRun {
                    key: None,
                    frames: Vec::new(),
                });
            }
            return None;
        };
        self.stats.records += 1;

        let key = PendingKey::of_frame(&frame);
        let continues = matches!(&self.run, Some(run) if run.key == Some(key));
        if continues {
            if let Some(run) = self.run.as_mut() {
                run.frames.push(frame);
            }
            return None;
        }

        // A frame with a different key starts the next stack
        let completed = self.complete_run();
        self.run = Some(StackRun {
            key: Some(key),
            frames: vec![frame],
        });
        completed
    }

    fn complete_run(&mut self) -> Option<CorrelatedSample> {
        let run = self.run.take()?;
        let key = run.key?;

        match self.pending.take(&key) {
            Some(sample) => {
                self.stats.matched += 1;
                Some(CorrelatedSample {
                    sample,
                    frames: run.frames,
                })
            }
            None => {
                self.stats.unmatched_stacks += 1;
                None
            }
        }
    }
}

impl Default for StackCorrelator {
    fn default() -> Self {
        Self::new(PendingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(correlator: &mut StackCorrelator, lines: &[&str]) -> Vec<CorrelatedSample> {
        let mut out: Vec<CorrelatedSample> = lines.iter().filter_map(|l| correlator.push_line(l)).collect();
        out.extend(correlator.finish());
        out
    }

    #[test]
    fn test_sample_matches_later_stack() {
        let mut correlator = StackCorrelator::default();
        let out = feed(
            &mut correlator,
            &[
                "SampledProfile, 5, app.exe (1), 9, 0x10, 0, app.exe!main, app.exe!leaf, 1, Unbatched",
                "CSwitch, 6, a.exe (2), 3",
                "Stack, 5, 9, 1, 0x10, app.exe!leaf",
                "Stack, 5, 9, 2, 0x20, app.exe!mid",
                "Stack, 5, 9, 3, 0x30, app.exe!root",
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sample.tid, 9);
        let symbols: Vec<&str> = out[0].frames.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["app.exe!leaf", "app.exe!mid", "app.exe!root"]);
        assert_eq!(correlator.stats().matched, 1);
        assert_eq!(correlator.stats().malformed, 0);
        assert_eq!(correlator.stats().records, 4);
    }

    #[test]
    fn test_idle_samples_are_dropped() {
        let mut correlator = StackCorrelator::default();
        let out = feed(
            &mut correlator,
            &[
                "SampledProfile, 5, Idle (   0), 0, 0x10, 0",
                "Stack, 5, 0, 1, 0x10, ntoskrnl.exe!KiIdleLoop",
            ],
        );
        assert!(out.is_empty());
        assert_eq!(correlator.stats().idle_samples, 1);
        assert_eq!(correlator.stats().unmatched_stacks, 1);
    }

    #[test]
    fn test_stack_before_sample_does_not_match() {
        let mut correlator = StackCorrelator::default();
        let out = feed(
            &mut correlator,
            &[
                "Stack, 5, 9, 1, 0x10, app.exe!leaf",
                "SampledProfile, 5, app.exe (1), 9, 0x10, 0",
            ],
        );
        assert!(out.is_empty());
        assert_eq!(correlator.stats().unmatched_stacks, 1);
        assert_eq!(correlator.stats().unmatched_samples, 1);
    }

    #[test]
    fn test_header_run_is_discarded() {
        let mut correlator = StackCorrelator::default();
        let out = feed(
            &mut correlator,
            &[
                "SampledProfile, 5, app.exe (1), 9, 0x10, 0",
                "Stack,  TimeStamp,   ThreadID, No.,            Address,            Image!Function",
                "SampledProfile,  TimeStamp,     Process Name ( PID),   ThreadID,           PrgrmCtr, CPU",
            ],
        );
        assert!(out.is_empty());
        assert_eq!(correlator.stats().malformed, 2);
        assert_eq!(correlator.stats().unmatched_samples, 1);
    }

    #[test]
    fn test_adjacent_runs_with_different_keys_are_split() {
        let mut correlator = StackCorrelator::default();
        let out = feed(
            &mut correlator,
            &[
                "SampledProfile, 5, app.exe (1), 9, 0x10, 0",
                "SampledProfile, 7, app.exe (1), 9, 0x10, 0",
                "Stack, 5, 9, 1, 0x10, app.exe!a",
                "Stack, 7, 9, 1, 0x10, app.exe!b",
            ],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].frames[0].symbol, "app.exe!a");
        assert_eq!(out[1].frames[0].symbol, "app.exe!b");
    }

    #[test]
    fn test_key_reuse_policy_is_observable() {
        let lines = [
            "SampledProfile, 5, first.exe (1), 9, 0x10, 0",
            "SampledProfile, 5, second.exe (2), 9, 0x10, 0",
            "Stack, 5, 9, 1, 0x10, x!y",
        ];

        let mut overwrite = StackCorrelator::new(PendingPolicy::Overwrite);
        let out = feed(&mut overwrite, &lines);
        assert_eq!(out[0].sample.process.name, "second.exe");
        assert_eq!(overwrite.stats().key_collisions, 1);

        let mut keep_first = StackCorrelator::new(PendingPolicy::KeepFirst);
        let out = feed(&mut keep_first, &lines);
        assert_eq!(out[0].sample.process.name, "first.exe");
        assert_eq!(keep_first.stats().key_collisions, 1);
    }

    #[test]
    fn test_unmatched_sample_is_not_an_error() {
        let mut correlator = StackCorrelator::default();
        let out = feed(&mut correlator, &["SampledProfile, 5, app.exe (1), 9, 0x10, 0"]);
        assert!(out.is_empty());
        assert_eq!(correlator.stats().unmatched_samples, 1);
        assert_eq!(correlator.pending_len(), 0);
    }
}
