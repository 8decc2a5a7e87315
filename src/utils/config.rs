//! Configuration and constants for the CLI.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// The idle "process" that owns samples and timeslices when a CPU has nothing to run.
// xperf prints it as "Idle (   0)".
pub const IDLE_PROCESS_NAME: &str = "Idle";
pub const IDLE_PROCESS_ID: u32 = 0;

// Literal first-field tokens used by `xperf -a dumper`
pub const SAMPLED_PROFILE_TOKEN: &str = "SampledProfile";
pub const STACK_TOKEN: &str = "Stack";
pub const PMC_TOKEN: &str = "Pmc";
pub const CSWITCH_TOKEN: &str = "CSwitch";
pub const DIAGNOSTIC_PREFIX: &str = "Error: ";

/// Diagnostic lines tolerated between a Pmc record and its CSwitch
pub const MAX_DIAGNOSTIC_SKIP: usize = 1;

/// wpaexporter task name for the timer resolution rundown at trace end
pub const TIMER_RUNDOWN_TASK: &str = "SystemTimeResolutionRequestRundown";

/// Timer intervals are reported by ETW in 100 ns units
pub const TIMER_UNITS_PER_MS: f64 = 10_000.0;

/// How many threads get collapsed stack files by default
pub const DEFAULT_THREADS_TO_SHOW: usize = 1;

/// Counter report threshold on the second counter when summarizing by name
pub const DEFAULT_MIN_COUNTER: u64 = 500_000;

// Characters that collide with the collapsed stack format, and their replacements.
// An empty replacement removes the character.
pub const STACK_ESCAPES: &[(char, &str)] = &[(';', ":"), (' ', "_"), ('\'', "`"), ('"', "")];

pub const DEFAULT_FLAMEGRAPH_WIDTH: usize = 1200;
