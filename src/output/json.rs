//! JSON report output writer.
//!
//! Writes Report structs to JSON files with proper formatting.

use super::prepare_output_path;
use crate::report::Report;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &Report, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());
    prepare_output_path(output_path)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;

    info!(
        "Report written successfully ({} rows, {} bytes)",
        report.rows.len(),
        calculate_file_size(output_path)
    );
    Ok(())
}

/// Serialize a report to a string
pub fn report_to_string(report: &Report) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a report from a JSON file
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<Report, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path)?;
    let report: Report = serde_json::from_reader(BufReader::new(file))?;

    debug!("Report loaded: version {}, {} rows", report.version, report.rows.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::IngestStats;
    use crate::report::{ReportEntry, ReportKind, ReportValue};
    use tempfile::NamedTempFile;

    fn create_test_report() -> Report {
        let mut report = Report::new(ReportKind::Stacks, "trace.txt", "total", IngestStats::default());
        report.rows.push(ReportEntry {
            key: "app.exe (1) [9]".to_string(),
            total: 2,
            rank_value: 2,
            breakdown: vec![ReportValue {
                label: "app.exe_1_9;root;leaf".to_string(),
                value: 2,
            }],
        });
        report
    }

    #[test]
    fn test_write_and_read_report() {
        let report = create_test_report();
        let temp_file = NamedTempFile::new().unwrap();

        write_report(&report, temp_file.path()).unwrap();
        let loaded = read_report(temp_file.path()).unwrap();

        assert_eq!(loaded, report);
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/report.json");

        write_report(&create_test_report(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_read_invalid_json() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "{ not json").unwrap();
        assert!(matches!(
            read_report(temp_file.path()),
            Err(OutputError::SerializationFailed(_))
        ));
    }
}
