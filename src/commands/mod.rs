//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod classify;
pub mod counters;
pub mod models;
pub mod stacks;
pub mod timers;
pub mod utils;

// Re-export main command functions
pub use classify::execute_classify;
pub use counters::execute_counters;
pub use models::{ClassifyArgs, CountersArgs, SortKey, StacksArgs, TimersArgs};
pub use stacks::{execute_stacks, validate_stacks_args};
pub use timers::execute_timers;
pub use utils::{display_schema, display_version, validate_report_file};
