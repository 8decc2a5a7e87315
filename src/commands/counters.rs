//! Counters command implementation.
//!
//! Attributes PMC deltas recorded at each context switch to the process
//! that was switched out, then prints one row per process (or per name).

use super::models::{CountersArgs, SortKey};
use super::utils::open_input;
use crate::aggregator::CounterLabel;
use crate::attribution::{attribute_counters, CounterProfile};
use crate::output::write_report;
use crate::report::{format_counter_table, rank, RankKey, Report, ReportKind, ReportOptions, ReportRow, Threshold};
use crate::utils::config::DEFAULT_MIN_COUNTER;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the counters command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing input file, before streaming
/// * Broken Pmc/CSwitch pairing or inconsistent counter data, naming the line
/// * A sort key naming a counter the trace does not have
pub fn execute_counters(args: CountersArgs) -> Result<()> {
    let start_time = Instant::now();
    let reader = open_input(&args.input)?;

    info!("Attributing performance counters in {}...", args.input.display());
    let profile = attribute_counters(reader).context("Failed to attribute performance counters")?;
    debug!("Ingest: {}", profile.stats.summary());

    if let SortKey::Counter(i) = args.sort_by {
        if i >= profile.counter_names.len() {
            bail!(
                "Cannot sort by counter{}: the trace records {} counters",
                i + 1,
                profile.counter_names.len()
            );
        }
    }

    if let Some(filter) = &args.filter {
        println!("Printing per-process-data for processes that contain \"{}\"", filter);
    }

    let options = report_options(&args, profile.counter_names.len());
    let rows = rank(&profile.table, &options);
    println!("{}", format_counter_table(&rows, &profile.counter_names));

    if let Some(path) = &args.output_json {
        write_json(&args, &profile, &rows, path)?;
        info!("✓ Report written to: {}", path.display());
    }

    info!("Counters completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Ranking options for the counter table
///
/// Rows need more than the minimum in the second counter, which also keeps
/// the cnt1/cnt2 ratio defined. The minimum drops to zero when filtering.
pub fn report_options(args: &CountersArgs, counter_count: usize) -> ReportOptions<CounterLabel> {
    let min = args
        .min_counter
        .unwrap_or(if args.filter.is_some() { 0 } else { DEFAULT_MIN_COUNTER });
    let threshold = (counter_count >= 2).then_some(Threshold {
        key: RankKey::Label(CounterLabel::Counter(1)),
        min,
    });

    ReportOptions {
        rank_by: RankKey::Label(args.sort_by.label()),
        filter: args.filter.clone(),
        summarize_by_name: args.summarize_by_name,
        threshold,
        limit: args.limit,
    }
}

/// **Private** - internal helper for execute_counters
fn write_json(
    args: &CountersArgs,
    profile: &CounterProfile,
    rows: &[ReportRow<CounterLabel>],
    path: &std::path::Path,
) -> Result<()> {
    let report = Report::new(
        ReportKind::Counters,
        args.input.display().to_string(),
        args.sort_by.to_string(),
        profile.stats.clone(),
    )
    .with_rows(rows);
    write_report(&report, path).context("Failed to write report JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_depends_on_filter() {
        let args = CountersArgs::default();
        let options = report_options(&args, 2);
        assert_eq!(options.threshold.map(|t| t.min), Some(DEFAULT_MIN_COUNTER));
        assert_eq!(options.rank_by, RankKey::Label(CounterLabel::CpuTime));

        let args = CountersArgs {
            filter: Some("chrome".to_string()),
            ..Default::default()
        };
        assert_eq!(report_options(&args, 2).threshold.map(|t| t.min), Some(0));
    }

    #[test]
    fn test_single_counter_has_no_threshold() {
        let args = CountersArgs {
            min_counter: Some(10),
            ..Default::default()
        };
        assert!(report_options(&args, 1).threshold.is_none());
    }
}
