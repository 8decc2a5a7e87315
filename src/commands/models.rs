use crate::aggregator::CounterLabel;
use crate::correlator::PendingPolicy;
use crate::utils::config::{DEFAULT_FLAMEGRAPH_WIDTH, DEFAULT_THREADS_TO_SHOW};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Arguments for the stacks command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct StacksArgs {
    /// `xperf -a dumper` output with sampled profile stacks
    pub input: PathBuf,

    /// Number of busiest threads to write collapsed stacks for
    pub threads: usize,

    /// Directory for collapsed stack files and flamegraphs
    pub output_dir: PathBuf,

    /// Also render an SVG flamegraph per thread
    pub flamegraph: bool,

    /// Flamegraph width in pixels
    pub width: usize,

    /// Only threads whose process name contains this
    pub filter: Option<String>,

    /// What to do when a sample key is reused before its stack arrives
    pub policy: PendingPolicy,

    /// Output path for JSON report (optional)
    pub output_json: Option<PathBuf>,
}

impl Default for StacksArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            threads: DEFAULT_THREADS_TO_SHOW,
            output_dir: PathBuf::from("."),
            flamegraph: false,
            width: DEFAULT_FLAMEGRAPH_WIDTH,
            filter: None,
            policy: PendingPolicy::default(),
            output_json: None,
        }
    }
}

/// Value the counter table is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Summed CPU time
    #[default]
    Time,
    /// Context switch count
    Switches,
    /// A PMC column, zero based
    Counter(usize),
}

impl SortKey {
    pub fn label(self) -> CounterLabel {
        match self {
            SortKey::Time => CounterLabel::CpuTime,
            SortKey::Switches => CounterLabel::ContextSwitches,
            SortKey::Counter(i) => CounterLabel::Counter(i),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    /// Accepts `time`, `switches` or `counterN` with N starting at 1
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" => Ok(SortKey::Time),
            "switches" => Ok(SortKey::Switches),
            other => other
                .strip_prefix("counter")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&n| n > 0)
                .map(|n| SortKey::Counter(n - 1))
                .ok_or_else(|| format!("unknown sort key '{}', expected time, switches or counterN", s)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Arguments for the counters command
#[derive(Debug, Clone, Default)]
pub struct CountersArgs {
    /// `xperf -a dumper` output with PMC-on-context-switch data
    pub input: PathBuf,

    /// Only processes whose name contains this
    pub filter: Option<String>,

    /// Merge processes sharing a name
    pub summarize_by_name: bool,

    pub sort_by: SortKey,

    /// Rows need more than this in the second counter; None picks the default
    pub min_counter: Option<u64>,

    /// Maximum number of rows to print
    pub limit: Option<usize>,

    /// Output path for JSON report (optional)
    pub output_json: Option<PathBuf>,
}

/// Arguments for the timers command
#[derive(Debug, Clone, Default)]
pub struct TimersArgs {
    /// wpaexporter CSV of timer resolution changes
    pub input: PathBuf,

    /// `xperf -a process -withcmdline` listing used to label Chrome processes
    pub processes: Option<PathBuf>,

    /// Output path for JSON report (optional)
    pub output_json: Option<PathBuf>,
}

/// Arguments for the classify command
#[derive(Debug, Clone, Default)]
pub struct ClassifyArgs {
    /// `xperf -a process -withcmdline` listing
    pub input: PathBuf,
}
