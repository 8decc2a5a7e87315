//! Turn cumulative per-CPU counter snapshots into per-process deltas.
//!
//! PMC values are cumulative per CPU, so they only increase when read on the
//! same CPU. A `CSwitch` marks when a thread *starts* running; the counts for
//! its timeslice are known at the *next* context switch on that CPU. So the
//! delta between two successive snapshots on a CPU belongs to the process in
//! the second switch's "old process" column.

use crate::aggregator::{AggregationTable, CounterLabel};
use crate::correlator::{CounterCorrelator, CounterPair, IngestStats};
use crate::parser::{read_lines, EntityKey};
use crate::utils::error::TraceError;
use log::{debug, info};
use std::collections::HashMap;
use std::io::BufRead;

/// Last snapshot seen on one CPU
#[derive(Debug, Clone)]
struct CpuBaseline {
    counters: Vec<u64>,
    timestamp: u64,
    running: EntityKey,
}

/// Counters consumed by one process during one timeslice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub entity: EntityKey,
    pub deltas: Vec<u64>,
    pub elapsed: u64,
}

/// Per-CPU baseline state
///
/// **Public** - one instance per ingest pass
#[derive(Debug, Default)]
pub struct CounterAttributor {
    baselines: HashMap<u32, CpuBaseline>,
}

impl CounterAttributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the deltas closed by this pair
    ///
    /// # Returns
    /// * `Ok(None)` - first snapshot on this CPU, or the timeslice belonged to the idle process
    /// * `Ok(Some(attribution))` - counters and elapsed time for the previously running process
    ///
    /// # Errors
    /// * `TraceError::EntityMismatch` - the old process is not the one the previous switch put on this CPU
    /// * `TraceError::NegativeDelta` - a counter or the timestamp decreased on this CPU
    pub fn attribute(&mut self, pair: &CounterPair) -> Result<Option<Attribution>, TraceError> {
        let transition = &pair.transition;
        let cpu = transition.cpu;

        let attribution = match self.baselines.get(&cpu) {
            Some(baseline) => {
                let attribution = compute_deltas(baseline, pair)?;
                if attribution.entity.is_idle() {
                    None
                } else {
                    Some(attribution)
                }
            }
            None => {
                debug!("First counter snapshot on CPU {} at line {}", cpu, pair.line);
                None
            }
        };

        self.baselines.insert(
            cpu,
            CpuBaseline {
                counters: pair.reading.counters.clone(),
                timestamp: transition.timestamp,
                running: transition.new_process.clone(),
            },
        );

        Ok(attribution)
    }

    /// Number of CPUs with a baseline
    pub fn cpu_count(&self) -> usize {
        self.baselines.len()
    }
}

fn compute_deltas(baseline: &CpuBaseline, pair: &CounterPair) -> Result<Attribution, TraceError> {
    let transition = &pair.transition;
    let owner = format!("CPU {}", transition.cpu);

    if transition.old_process != baseline.running {
        return Err(TraceError::EntityMismatch {
            line: pair.line,
            cpu: transition.cpu,
            expected: baseline.running.to_string(),
            found: transition.old_process.to_string(),
        });
    }

    let deltas = pair
        .reading
        .counters
        .iter()
        .zip(&baseline.counters)
        .enumerate()
        .map(|(i, (&current, &previous))| {
            current.checked_sub(previous).ok_or_else(|| TraceError::NegativeDelta {
                line: pair.line,
                owner: owner.clone(),
                what: format!("counter {}", i + 1),
                previous,
                current,
            })
        })
        .collect::<Result<Vec<u64>, TraceError>>()?;

    let elapsed = transition
        .timestamp
        .checked_sub(baseline.timestamp)
        .ok_or_else(|| TraceError::NegativeDelta {
            line: pair.line,
            owner,
            what: "timestamp".to_string(),
            previous: baseline.timestamp,
            current: transition.timestamp,
        })?;

    Ok(Attribution {
        entity: transition.old_process.clone(),
        deltas,
        elapsed,
    })
}

/// Result of one pass over a dump with PMC-on-context-switch data
#[derive(Debug, Clone)]
pub struct CounterProfile {
    /// process -> counter component -> summed value
    pub table: AggregationTable<CounterLabel>,
    pub counter_names: Vec<String>,
    pub stats: IngestStats,
}

impl CounterProfile {
    /// Labels of the full per-process vector, in display order
    pub fn labels(&self) -> Vec<CounterLabel> {
        let mut labels: Vec<CounterLabel> = (0..self.counter_names.len()).map(CounterLabel::Counter).collect();
        labels.push(CounterLabel::ContextSwitches);
        labels.push(CounterLabel::CpuTime);
        labels
    }
}

/// Add one attribution to the table
pub fn record_attribution(table: &mut AggregationTable<CounterLabel>, attribution: &Attribution) {
    for (i, delta) in attribution.deltas.iter().enumerate() {
        table.record(attribution.entity.clone(), CounterLabel::Counter(i), *delta);
    }
    table.record(attribution.entity.clone(), CounterLabel::ContextSwitches, 1);
    table.record(attribution.entity.clone(), CounterLabel::CpuTime, attribution.elapsed);
}

/// Stream a dump and attribute every counter delta to a process
///
/// **Public** - main entry point for the counters pipeline
///
/// # Errors
/// Any fatal correlation or consistency error aborts the pass; no partial
/// table is returned.
pub fn attribute_counters<R: BufRead>(reader: R) -> Result<CounterProfile, TraceError> {
    let mut correlator = CounterCorrelator::new();
    let mut attributor = CounterAttributor::new();
    let mut table = AggregationTable::new();

    for line in read_lines(reader) {
        let (line_no, line) = line?;
        if let Some(pair) = correlator.push_line(line_no, &line)? {
            if let Some(attribution) = attributor.attribute(&pair)? {
                record_attribution(&mut table, &attribution);
            }
        }
    }
    correlator.finish()?;

    let stats = correlator.stats().clone();
    debug!("Counter ingest: {}", stats.summary());
    info!(
        "Attributed counters for {} processes across {} CPUs",
        table.len(),
        attributor.cpu_count()
    );

    Ok(CounterProfile {
        table,
        counter_names: correlator.counter_names(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{CounterReading, SchedulingTransition};

    fn pair(line: usize, ts: u64, counters: &[u64], new: &EntityKey, old: &EntityKey) -> CounterPair {
        CounterPair {
            reading: CounterReading {
                timestamp: ts,
                tid: 1,
                counters: counters.to_vec(),
            },
            transition: SchedulingTransition {
                timestamp: ts,
                new_process: new.clone(),
                new_tid: 1,
                old_process: old.clone(),
                old_tid: 2,
                cpu: 3,
            },
            line,
        }
    }

    #[test]
    fn test_first_snapshot_is_baseline_only() {
        let mut attributor = CounterAttributor::new();
        let a = EntityKey::process("a.exe", 1);
        let b = EntityKey::process("b.exe", 2);
        assert_eq!(attributor.attribute(&pair(1, 10, &[10, 10], &a, &b)).unwrap(), None);
        assert_eq!(attributor.cpu_count(), 1);
    }

    #[test]
    fn test_entity_mismatch_is_fatal() {
        let mut attributor = CounterAttributor::new();
        let a = EntityKey::process("a.exe", 1);
        let b = EntityKey::process("b.exe", 2);
        attributor.attribute(&pair(1, 10, &[10], &a, &b)).unwrap();
        let err = attributor.attribute(&pair(3, 20, &[20], &a, &b)).unwrap_err();
        assert!(matches!(err, TraceError::EntityMismatch { line: 3, cpu: 3, .. }));
    }

    #[test]
    fn test_decreasing_counter_is_fatal() {
        let mut attributor = CounterAttributor::new();
        let a = EntityKey::process("a.exe", 1);
        let b = EntityKey::process("b.exe", 2);
        attributor.attribute(&pair(1, 10, &[10, 10], &a, &b)).unwrap();
        let err = attributor.attribute(&pair(3, 20, &[15, 9], &b, &a)).unwrap_err();
        match err {
            TraceError::NegativeDelta { what, previous, current, .. } => {
                assert_eq!(what, "counter 2");
                assert_eq!((previous, current), (10, 9));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_idle_timeslice_is_not_recorded() {
        let mut attributor = CounterAttributor::new();
        let idle = EntityKey::process("Idle", 0);
        let a = EntityKey::process("a.exe", 1);
        attributor.attribute(&pair(1, 10, &[10], &idle, &a)).unwrap();
        assert_eq!(attributor.attribute(&pair(3, 20, &[25], &a, &idle)).unwrap(), None);
        let next = attributor.attribute(&pair(5, 26, &[30], &idle, &a)).unwrap().unwrap();
        assert_eq!(next.entity, a);
        assert_eq!(next.deltas, vec![5]);
        assert_eq!(next.elapsed, 6);
    }
}
