//! Inner keys of the aggregation tables.

use crate::utils::config::TIMER_UNITS_PER_MS;
use std::fmt;

/// A collapsed call stack: `;`-separated, root first, thread label at the base
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackLabel(pub String);

impl StackLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One component of the per-process counter vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterLabel {
    /// Delta of the i-th PMC column (zero based)
    Counter(usize),
    /// Number of timeslices that ended for the process
    ContextSwitches,
    /// Summed timeslice length, in trace timestamp units
    CpuTime,
}

impl fmt::Display for CounterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterLabel::Counter(i) => write!(f, "counter{}", i + 1),
            CounterLabel::ContextSwitches => f.write_str("context_switches"),
            CounterLabel::CpuTime => f.write_str("cpu_time"),
        }
    }
}

/// A timer resolution level, in 100 ns units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerLabel(pub u64);

impl TimerLabel {
    pub fn as_millis(&self) -> f64 {
        self.0 as f64 / TIMER_UNITS_PER_MS
    }
}

impl fmt::Display for TimerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} ms", self.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_label_order_and_display() {
        let mut labels = vec![
            CounterLabel::CpuTime,
            CounterLabel::Counter(1),
            CounterLabel::ContextSwitches,
            CounterLabel::Counter(0),
        ];
        labels.sort();
        let names: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        assert_eq!(names, vec!["counter1", "counter2", "context_switches", "cpu_time"]);
    }

    #[test]
    fn test_timer_label_millis() {
        assert_eq!(TimerLabel(10_000).to_string(), "1.0 ms");
        assert_eq!(TimerLabel(156_250).as_millis(), 15.625);
    }
}
