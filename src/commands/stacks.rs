//! Stacks command implementation.
//!
//! The stacks command:
//! 1. Correlates sampled profile events with their call stacks
//! 2. Ranks threads by sample count
//! 3. Writes collapsed stacks (and optionally a flamegraph) per top thread
//! 4. Writes the JSON report if requested

use super::models::StacksArgs;
use super::utils::{ensure_output_dir, open_input};
use crate::aggregator::{build_stack_table, thread_label, StackLabel, StackProfile};
use crate::flamegraph::{collapsed_lines, generate_flamegraph, FlamegraphConfig};
use crate::output::{write_collapsed, write_report, write_svg};
use crate::report::{format_stack_summary, rank, Report, ReportKind, ReportOptions, ReportRow};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

/// Execute the stacks command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing input file or unusable output directory, before streaming
/// * I/O errors while reading the dump
/// * File write errors
pub fn execute_stacks(args: StacksArgs) -> Result<()> {
    let start_time = Instant::now();
    let reader = open_input(&args.input)?;
    ensure_output_dir(&args.output_dir)?;

    info!("Step 1/3: Correlating samples and stacks in {}...", args.input.display());
    let profile = build_stack_table(reader, args.policy).context("Failed to read sampled profile")?;
    debug!("Ingest: {}", profile.stats.summary());

    let options = ReportOptions {
        filter: args.filter.clone(),
        limit: Some(args.threads),
        ..Default::default()
    };
    let rows = rank(&profile.table, &options);

    info!("Step 2/3: Writing collapsed stacks for {} threads...", rows.len());
    for (index, row) in rows.iter().enumerate() {
        write_thread_outputs(&args, index, row)?;
    }

    info!("Step 3/3: Writing report...");
    if let Some(path) = &args.output_json {
        write_json(&args, &profile, &rows, path)?;
        info!("✓ Report written to: {}", path.display());
    }

    println!(
        "{}",
        format_stack_summary(&rows, profile.total_samples(), profile.thread_count())
    );

    info!("Stacks completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Collapsed stack file and optional flamegraph for one thread
///
/// **Private** - internal helper for execute_stacks
fn write_thread_outputs(args: &StacksArgs, index: usize, row: &ReportRow<StackLabel>) -> Result<()> {
    let lines = collapsed_lines(row);
    let thread = row
        .key
        .entity()
        .map(thread_label)
        .unwrap_or_else(|| row.key.to_string());

    let collapsed_path = args.output_dir.join(format!("collapsed_stacks_{}.txt", index));
    info!("Writing {} samples to {}", row.total, collapsed_path.display());
    write_collapsed(&lines, &collapsed_path)
        .with_context(|| format!("Failed to write collapsed stacks for {}", thread))?;

    if args.flamegraph {
        let config = FlamegraphConfig::new()
            .with_title(format!("CPU Usage flame graph of {}", thread))
            .with_width(args.width);
        let svg = generate_flamegraph(&lines, Some(&config)).context("Failed to generate flamegraph")?;
        let svg_path = args.output_dir.join(format!("{}.svg", thread));
        write_svg(&svg, &svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", svg_path.display());
    }
    Ok(())
}

/// **Private** - internal helper for execute_stacks
fn write_json(args: &StacksArgs, profile: &StackProfile, rows: &[ReportRow<StackLabel>], path: &Path) -> Result<()> {
    let report = Report::new(
        ReportKind::Stacks,
        args.input.display().to_string(),
        "samples",
        profile.stats.clone(),
    )
    .with_rows(rows);
    write_report(&report, path).context("Failed to write report JSON")
}

/// Validate stacks arguments before any work is done
///
/// **Public** - called by main.rs before execute_stacks
pub fn validate_stacks_args(args: &StacksArgs) -> Result<()> {
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }
    if args.flamegraph && args.width == 0 {
        bail!("--width must be greater than 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threads_is_rejected() {
        let args = StacksArgs {
            threads: 0,
            ..Default::default()
        };
        assert!(validate_stacks_args(&args).is_err());
        assert!(validate_stacks_args(&StacksArgs::default()).is_ok());
    }
}
