//! Collapsed stack file writer, one "stack count" line per unique stack.

use super::prepare_output_path;
use crate::utils::error::OutputError;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write collapsed stack lines, newline terminated
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is invalid
pub fn write_collapsed(lines: &[String], output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    prepare_output_path(output_path)?;

    let mut writer = BufWriter::new(File::create(output_path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    info!("Wrote {} collapsed stacks to {}", lines.len(), output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_newline_terminated() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("collapsed_stacks_0.txt");
        let lines = vec!["t;a 1".to_string(), "t;a;b 2".to_string()];

        write_collapsed(&lines, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "t;a 1\nt;a;b 2\n");
    }
}
