//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Fatal errors raised while streaming a trace dump
///
/// Any of these means the aggregate totals can no longer be trusted,
/// so the run stops instead of emitting a partial report.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("I/O error while reading trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected {expected} after the Pmc record at line {counter_line}, found {found}")]
    BrokenPair {
        line: usize,
        counter_line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Line {line}: expected {expected} performance counters, found {found}")]
    CounterWidthMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: old process mismatch on CPU {cpu}, {found} versus {expected}")]
    EntityMismatch {
        line: usize,
        cpu: u32,
        expected: String,
        found: String,
    },

    #[error("Line {line}: {what} went backwards for {owner} ({previous} -> {current})")]
    NegativeDelta {
        line: usize,
        owner: String,
        what: String,
        previous: u64,
        current: u64,
    },
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,

    #[error("Flamegraph rendering failed: {0}")]
    GenerationFailed(String),

    #[error("Rendered SVG is not valid UTF-8")]
    InvalidSvg(#[from] std::string::FromUtf8Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
