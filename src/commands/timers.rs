//! Timers command implementation.
//!
//! Summarizes how long each process held each timer interrupt resolution.

use super::models::TimersArgs;
use super::utils::open_input;
use crate::attribution::attribute_timers;
use crate::classify::{ChromeProcessMap, ProcessClassifier};
use crate::output::write_report;
use crate::report::{format_timer_summary, rank, Report, ReportKind, ReportOptions};
use anyhow::{Context, Result};
use log::{debug, info};

/// Execute the timers command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing input files, before streaming
/// * Timestamps going backwards for a process
pub fn execute_timers(args: TimersArgs) -> Result<()> {
    let reader = open_input(&args.input)?;
    let listing = args.processes.as_deref().map(open_input).transpose()?;

    let classifier = listing
        .map(ChromeProcessMap::from_listing)
        .transpose()
        .context("Failed to read process listing")?;
    if let Some(map) = &classifier {
        info!("Identified {} Chrome processes", map.len());
    }

    info!("Summarizing timer requests in {}...", args.input.display());
    let profile = attribute_timers(reader).context("Failed to summarize timer intervals")?;
    debug!("Ingest: {}", profile.stats.summary());

    let rows = rank(&profile.table, &ReportOptions::default());
    let classifier = classifier.as_ref().map(|map| map as &dyn ProcessClassifier);
    println!("{}", format_timer_summary(&profile, &rows, classifier));

    if let Some(path) = &args.output_json {
        let report = Report::new(
            ReportKind::Timers,
            args.input.display().to_string(),
            "microseconds",
            profile.stats.clone(),
        )
        .with_rows(&rows);
        write_report(&report, path).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", path.display());
    }

    Ok(())
}
