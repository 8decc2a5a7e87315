use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Open an input file for streaming
///
/// Missing or unreadable inputs are reported here, before any line is read.
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    if !path.is_file() {
        bail!("Input file not found: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("Failed to open input file {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Create an output directory up front so a bad path fails before ingest
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        bail!("Output path is not a directory: {}", dir.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Cannot create output directory {}", dir.display()))
}

/// Validate a report JSON file
pub fn validate_report_file(file_path: &Path) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(file_path).context("Failed to read report")?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Kind: {:?}", report.kind);
    println!("  Source: {}", report.source);
    println!("  Ranked by: {}", report.rank_by);
    println!("  Rows: {}", report.rows.len());
    println!("  Ingest: {}", report.stats.summary());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Xperf Trace Studio Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  kind: string             - stacks, counters or timers");
        println!("  source: string           - Input file the report was built from");
        println!("  rank_by: string          - Value rows are ordered by");
        println!("  rows: array              - Ranked entities");
        println!("    key: string            - Process, thread or process name");
        println!("    total: number          - Sum over every label");
        println!("    rank_value: number     - Value used for ordering");
        println!("    breakdown: array       - {{label, value}} pairs sorted by label");
        println!("  stats: object            - Lines read, skipped and matched");
        println!("  generated_at: string     - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Xperf Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Correlates and summarizes CPU samples, performance counters and timer");
    println!("requests from xperf trace dumps.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_reported() {
        let err = open_input(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }

    #[test]
    fn test_output_dir_over_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(ensure_output_dir(file.path()).is_err());
    }
}
