//! JSON report schema.
//!
//! The same document shape is used for every pipeline so downstream tools
//! only need one reader.

use super::ranking::ReportRow;
use crate::correlator::IngestStats;
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which pipeline produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Stacks,
    Counters,
    Timers,
}

/// One labelled value inside a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportValue {
    pub label: String,
    pub value: u64,
}

/// One ranked entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// "name (pid)", "name (pid) [tid]" or a bare process name when summarized
    pub key: String,
    pub total: u64,
    pub rank_value: u64,
    pub breakdown: Vec<ReportValue>,
}

/// Serialized report
///
/// **Public** - written by `--json` and read back by `validate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub version: String,
    pub kind: ReportKind,
    /// Input file the report was built from
    pub source: String,
    /// Description of the value rows are ranked by
    pub rank_by: String,
    pub rows: Vec<ReportEntry>,
    pub stats: IngestStats,
    /// ISO 8601 timestamp
    pub generated_at: String,
}

impl Report {
    pub fn new(kind: ReportKind, source: impl Into<String>, rank_by: impl Into<String>, stats: IngestStats) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            kind,
            source: source.into(),
            rank_by: rank_by.into(),
            rows: Vec::new(),
            stats,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Append ranked rows, labels rendered with `Display`
    pub fn with_rows<L: Display>(mut self, rows: &[ReportRow<L>]) -> Self {
        self.rows.extend(rows.iter().map(|row| ReportEntry {
            key: row.key.to_string(),
            total: row.total,
            rank_value: row.rank_value,
            breakdown: row
                .breakdown
                .iter()
                .map(|(label, value)| ReportValue {
                    label: label.to_string(),
                    value: *value,
                })
                .collect(),
        }));
        self
    }
}
