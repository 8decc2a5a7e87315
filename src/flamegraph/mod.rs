//! Flamegraph generation using the inferno library.
//!
//! This module converts ranked thread stacks into collapsed stack lines and
//! interactive SVG flamegraphs.

pub mod collapsed;
pub mod generator;

// Re-export main types
pub use collapsed::collapsed_lines;
pub use generator::{generate_flamegraph, FlamegraphConfig};
