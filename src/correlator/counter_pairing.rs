//! Pair each `Pmc` record with the `CSwitch` it belongs to.
//!
//! When PMC sampling on context switch is enabled, xperf writes the counter
//! snapshot immediately before the context switch that triggered it:
//!
//! ```text
//!                     Pmc,      64662,       7720, 41066, 6977
//!                 CSwitch,      64662, RuntimeBroker.exe (3896), 7720, ...
//! ```
//!
//! The two are inseparable. At most one `Error: ` diagnostic line may sit in
//! between; anything else means the dump is corrupt and the run stops.

use super::IngestStats;
use crate::parser::{
    is_diagnostic, parse_counter_header, parse_record, record_kind, CounterReading, Record,
    RecordKind, SchedulingTransition,
};
use crate::utils::config::MAX_DIAGNOSTIC_SKIP;
use crate::utils::error::TraceError;
use log::debug;

const EXPECTED_CSWITCH: &str = "a CSwitch record";
const FOUND_PREVIEW_CHARS: usize = 60;

/// A counter snapshot and the context switch it was taken at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterPair {
    pub reading: CounterReading,
    pub transition: SchedulingTransition,
    /// Line number of the `CSwitch` record
    pub line: usize,
}

#[derive(Debug)]
enum PairState {
    Idle,
    SawCounter {
        reading: CounterReading,
        line: usize,
        skipped: usize,
    },
}

/// Streaming Pmc/CSwitch correlator
///
/// **Public** - fed one line at a time by the counters pipeline
#[derive(Debug)]
pub struct CounterCorrelator {
    state: PairState,
    counter_names: Option<Vec<String>>,
    width: Option<usize>,
    last_line: usize,
    stats: IngestStats,
}

impl CounterCorrelator {
    pub fn new() -> Self {
        Self {
            state: PairState::Idle,
            counter_names: None,
            width: None,
            last_line: 0,
            stats: IngestStats::default(),
        }
    }

    /// Feed line `line_no` of the dump
    ///
    /// # Returns
    /// * `Ok(Some(pair))` - this line completed a Pmc/CSwitch pair
    /// * `Ok(None)` - nothing to emit yet
    ///
    /// # Errors
    /// * `TraceError::BrokenPair` - a Pmc record is not followed by its CSwitch
    /// * `TraceError::CounterWidthMismatch` - a Pmc record has the wrong number of counters
    pub fn push_line(&mut self, line_no: usize, line: &str) -> Result<Option<CounterPair>, TraceError> {
        self.stats.lines += 1;
        self.last_line = line_no;

        match std::mem::replace(&mut self.state, PairState::Idle) {
            PairState::Idle => {
                self.observe_idle_line(line_no, line)?;
                Ok(None)
            }
            PairState::SawCounter {
                reading,
                line: counter_line,
                skipped,
            } => self.complete_pair(line_no, line, reading, counter_line, skipped),
        }
    }

    /// Signal end of input
    ///
    /// # Errors
    /// * `TraceError::BrokenPair` - the input ended between a Pmc and its CSwitch
    pub fn finish(&mut self) -> Result<(), TraceError> {
        if let PairState::SawCounter { line, .. } = std::mem::replace(&mut self.state, PairState::Idle) {
            return Err(TraceError::BrokenPair {
                line: self.last_line + 1,
                counter_line: line,
                expected: EXPECTED_CSWITCH,
                found: "end of input".to_string(),
            });
        }
        Ok(())
    }

    /// Counter column names, from the Pmc header or generated from the width
    pub fn counter_names(&self) -> Vec<String> {
        match (&self.counter_names, self.width) {
            (Some(names), _) => names.clone(),
            (None, Some(width)) => (1..=width).map(|i| format!("Counter{}", i)).collect(),
            (None, None) => Vec::new(),
        }
    }

    /// Number of counters per reading, once known
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    fn observe_idle_line(&mut self, line_no: usize, line: &str) -> Result<(), TraceError> {
        if record_kind(line) != Some(RecordKind::CounterReading) {
            return Ok(());
        }

        match parse_record(line) {
            Some(Record::CounterReading(reading)) => {
                self.stats.records += 1;
                let expected = *self.width.get_or_insert(reading.counters.len());
                if reading.counters.len() != expected {
                    return Err(TraceError::CounterWidthMismatch {
                        line: line_no,
                        expected,
                        found: reading.counters.len(),
                    });
                }
                self.state = PairState::SawCounter {
                    reading,
                    line: line_no,
                    skipped: 0,
                };
            }
            _ => match parse_counter_header(line) {
                Some(names) if self.counter_names.is_none() && self.width.is_none() => {
                    debug!("Counters: {}", names.join(", "));
                    self.width = Some(names.len());
                    self.counter_names = Some(names);
                }
                _ => self.stats.malformed += 1,
            },
        }
        Ok(())
    }

    fn complete_pair(
        &mut self,
        line_no: usize,
        line: &str,
        reading: CounterReading,
        counter_line: usize,
        skipped: usize,
    ) -> Result<Option<CounterPair>, TraceError> {
        if record_kind(line) == Some(RecordKind::SchedulingTransition) {
            if let Some(Record::SchedulingTransition(transition)) = parse_record(line) {
                self.stats.records += 1;
                self.stats.matched += 1;
                return Ok(Some(CounterPair {
                    reading,
                    transition,
                    line: line_no,
                }));
            }
            return Err(broken_pair(line_no, counter_line, format!("a malformed CSwitch record '{}'", preview(line))));
        }

        if is_diagnostic(line) && skipped < MAX_DIAGNOSTIC_SKIP {
            self.stats.diagnostics_skipped += 1;
            self.state = PairState::SawCounter {
                reading,
                line: counter_line,
                skipped: skipped + 1,
            };
            return Ok(None);
        }

        Err(broken_pair(line_no, counter_line, format!("'{}'", preview(line))))
    }
}

impl Default for CounterCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

fn broken_pair(line: usize, counter_line: usize, found: String) -> TraceError {
    TraceError::BrokenPair {
        line,
        counter_line,
        expected: EXPECTED_CSWITCH,
        found,
    }
}

fn preview(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() > FOUND_PREVIEW_CHARS {
        let cut: String = line.chars().take(FOUND_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PMC: &str = "                    Pmc,      64662,       7720, 41066, 6977";
    const CSWITCH: &str = "                CSwitch,      64662, RuntimeBroker.exe (3896),       7720,    8,   -1,          31,        0,      MsMpEng.exe (3016),      13212,    8,   -1,         Waiting,          WrQueue, Swapable,     14,   0,   4,   68564992,    0,    0";

    fn run(lines: &[&str]) -> Result<Vec<CounterPair>, TraceError> {
        let mut correlator = CounterCorrelator::new();
        let mut pairs = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            pairs.extend(correlator.push_line(i + 1, line)?);
        }
        correlator.finish()?;
        Ok(pairs)
    }

    #[test]
    fn test_adjacent_pair() {
        let pairs = run(&[PMC, CSWITCH]).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].reading.counters, vec![41066, 6977]);
        assert_eq!(pairs[0].transition.cpu, 0);
        assert_eq!(pairs[0].line, 2);
    }

    #[test]
    fn test_one_diagnostic_line_is_tolerated() {
        let pairs = run(&[
            PMC,
            "Error: Description for thread state (9) could not be found. Thread state array out of date!!",
            CSWITCH,
        ])
        .unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_two_diagnostic_lines_are_fatal() {
        let err = run(&[PMC, "Error: one", "Error: two", CSWITCH]).unwrap_err();
        match err {
            TraceError::BrokenPair { line, counter_line, .. } => {
                assert_eq!(line, 3);
                assert_eq!(counter_line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_other_record_after_pmc_is_fatal() {
        assert!(matches!(
            run(&[PMC, "SampledProfile, 5, a.exe (1), 9, 0x10, 0"]),
            Err(TraceError::BrokenPair { line: 2, .. })
        ));
        assert!(matches!(run(&[PMC, PMC]), Err(TraceError::BrokenPair { .. })));
    }

    #[test]
    fn test_malformed_cswitch_is_fatal() {
        assert!(matches!(
            run(&[PMC, "CSwitch, 64662, a.exe (1), 2"]),
            Err(TraceError::BrokenPair { .. })
        ));
    }

    #[test]
    fn test_end_of_input_after_pmc_is_fatal() {
        assert!(matches!(
            run(&[CSWITCH, PMC]),
            Err(TraceError::BrokenPair { line: 3, counter_line: 2, .. })
        ));
    }

    #[test]
    fn test_header_sets_names_and_width() {
        let mut correlator = CounterCorrelator::new();
        correlator
            .push_line(1, "Pmc,  TimeStamp,   ThreadID, BranchInstructions, BranchMispredictions")
            .unwrap();
        assert_eq!(correlator.counter_names(), vec!["BranchInstructions", "BranchMispredictions"]);
        let err = correlator.push_line(2, "Pmc, 10, 1, 5, 6, 7").unwrap_err();
        assert!(matches!(
            err,
            TraceError::CounterWidthMismatch { expected: 2, found: 3, .. }
        ));
    }

    #[test]
    fn test_names_default_from_width() {
        let mut correlator = CounterCorrelator::new();
        correlator.push_line(1, PMC).unwrap();
        correlator.push_line(2, CSWITCH).unwrap();
        assert_eq!(correlator.counter_names(), vec!["Counter1", "Counter2"]);
    }

    #[test]
    fn test_unpaired_cswitch_is_ignored() {
        let pairs = run(&[CSWITCH, CSWITCH]).unwrap();
        assert!(pairs.is_empty());
    }
}
