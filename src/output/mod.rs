//! Output writers for reports and flamegraphs.
//!
//! This module handles writing data to disk in various formats:
//! - JSON reports
//! - SVG flamegraphs
//! - Collapsed stack text files

pub mod collapsed;
pub mod json;
pub mod svg;

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

// Re-export main functions
pub use collapsed::write_collapsed;
pub use json::{read_report, report_to_string, write_report};
pub use svg::write_svg;

/// Reject unusable paths and create missing parent directories
///
/// **Private** - shared by every writer
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_rejected() {
        assert!(prepare_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_directory_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(prepare_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_parent_dirs_are_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("nested/dirs/out.txt");
        prepare_output_path(&nested).unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }
}
