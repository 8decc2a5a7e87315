//! Shared constants and error types.

pub mod error;
pub mod config;

// Re-export commonly used error types for convenience
pub use error::{FlamegraphError, OutputError, TraceError};
