//! Xperf Trace Studio CLI
//!
//! Correlates and summarizes CPU samples, performance counters and timer
//! requests from xperf trace dumps.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use xperf_trace_studio::commands::{
    display_schema, display_version, execute_classify, execute_counters, execute_stacks, execute_timers,
    validate_report_file, validate_stacks_args, ClassifyArgs, CountersArgs, SortKey, StacksArgs, TimersArgs,
};
use xperf_trace_studio::correlator::PendingPolicy;
use xperf_trace_studio::utils::config::{DEFAULT_FLAMEGRAPH_WIDTH, DEFAULT_THREADS_TO_SHOW};

/// Xperf Trace Studio - summaries and flamegraphs from xperf dumps
#[derive(Parser, Debug)]
#[command(name = "xperf-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Collapse sampled call stacks per thread (xperf -a dumper -stacktimeshifting)
    Stacks {
        /// Path to the dumper output
        input: PathBuf,

        /// Number of busiest threads to write collapsed stacks for
        #[arg(short, long, default_value_t = DEFAULT_THREADS_TO_SHOW)]
        threads: usize,

        /// Directory for collapsed stack files and flamegraphs
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Render an SVG flamegraph per thread
        #[arg(long)]
        flamegraph: bool,

        /// Flamegraph width in pixels
        #[arg(long, default_value_t = DEFAULT_FLAMEGRAPH_WIDTH)]
        width: usize,

        /// Only threads whose process name contains this (case-insensitive)
        #[arg(long)]
        filter: Option<String>,

        /// Keep the first sample when a {timestamp, thread} key is reused before its stack arrives
        #[arg(long)]
        keep_first: bool,

        /// Output path for JSON report
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Attribute PMC deltas to processes at each context switch
    Counters {
        /// Path to the dumper output with Pmc and CSwitch events
        input: PathBuf,

        /// Only processes whose name contains this (case-insensitive)
        #[arg(long)]
        filter: Option<String>,

        /// Keep one row per process instance instead of merging by name
        #[arg(long)]
        no_summarize: bool,

        /// time, switches or counterN
        #[arg(long, default_value = "time")]
        sort_by: SortKey,

        /// Rows need more than this in the second counter
        #[arg(long)]
        min_counter: Option<u64>,

        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,

        /// Output path for JSON report
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Summarize timer resolution requests from a wpaexporter CSV
    Timers {
        /// Path to the timer interval CSV
        input: PathBuf,

        /// xperf -a process -withcmdline listing to label Chrome processes
        #[arg(long, env = "XPERF_PROCESS_LISTING")]
        processes: Option<PathBuf>,

        /// Output path for JSON report
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Group Chrome processes by browser and type
    Classify {
        /// xperf -a process -withcmdline listing
        input: PathBuf,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Stacks {
            input,
            threads,
            output_dir,
            flamegraph,
            width,
            filter,
            keep_first,
            json,
        } => {
            let args = StacksArgs {
                input,
                threads,
                output_dir,
                flamegraph,
                width,
                filter,
                policy: if keep_first {
                    PendingPolicy::KeepFirst
                } else {
                    PendingPolicy::Overwrite
                },
                output_json: json,
            };

            // Validate args first
            validate_stacks_args(&args)?;
            execute_stacks(args)?;
        }

        Commands::Counters {
            input,
            filter,
            no_summarize,
            sort_by,
            min_counter,
            limit,
            json,
        } => {
            execute_counters(CountersArgs {
                input,
                filter,
                summarize_by_name: !no_summarize,
                sort_by,
                min_counter,
                limit,
                output_json: json,
            })?;
        }

        Commands::Timers { input, processes, json } => {
            execute_timers(TimersArgs {
                input,
                processes,
                output_json: json,
            })?;
        }

        Commands::Classify { input } => {
            execute_classify(ClassifyArgs { input })?;
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
