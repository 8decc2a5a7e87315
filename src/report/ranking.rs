//! Rank aggregated entities for display.
//!
//! Filtering happens first, then optional merging by process name, then
//! sorting by the chosen value (descending) with the key as tie breaker so
//! identical input always produces identical output.

use crate::aggregator::AggregationTable;
use crate::parser::EntityKey;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Identity of a report row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportKey {
    /// One process or thread
    Entity(EntityKey),
    /// Every process sharing this name
    Name(String),
}

impl ReportKey {
    pub fn name(&self) -> &str {
        match self {
            ReportKey::Entity(entity) => &entity.name,
            ReportKey::Name(name) => name,
        }
    }

    pub fn entity(&self) -> Option<&EntityKey> {
        match self {
            ReportKey::Entity(entity) => Some(entity),
            ReportKey::Name(_) => None,
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKey::Entity(entity) => write!(f, "{}", entity),
            ReportKey::Name(name) => f.write_str(name),
        }
    }
}

/// Which value orders the rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankKey<L> {
    /// Sum over every label
    Total,
    /// One label's value
    Label(L),
}

/// Keep only rows whose value for `key` is strictly greater than `min`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold<L> {
    pub key: RankKey<L>,
    pub min: u64,
}

/// Ranking configuration
#[derive(Debug, Clone)]
pub struct ReportOptions<L> {
    pub rank_by: RankKey<L>,
    /// Case-insensitive substring the process name must contain
    pub filter: Option<String>,
    /// Merge entities sharing a process name, dropping pid and tid
    pub summarize_by_name: bool,
    pub threshold: Option<Threshold<L>>,
    pub limit: Option<usize>,
}

impl<L> Default for ReportOptions<L> {
    fn default() -> Self {
        Self {
            rank_by: RankKey::Total,
            filter: None,
            summarize_by_name: false,
            threshold: None,
            limit: None,
        }
    }
}

/// One ranked entity with its per-label breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow<L> {
    pub key: ReportKey,
    /// Sorted by label
    pub breakdown: Vec<(L, u64)>,
    pub total: u64,
    /// The value the row was ranked by
    pub rank_value: u64,
}

impl<L: PartialEq> ReportRow<L> {
    pub fn value(&self, label: &L) -> u64 {
        self.breakdown
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    fn value_for(&self, key: &RankKey<L>) -> u64 {
        match key {
            RankKey::Total => self.total,
            RankKey::Label(label) => self.value(label),
        }
    }
}

/// Produce ordered report rows from an aggregation table
///
/// **Public** - main entry point for reporting
///
/// # Arguments
/// * `table` - Populated aggregation table
/// * `options` - Filter, grouping, ranking and threshold settings
///
/// # Returns
/// Rows sorted by rank value descending, ties broken by key ascending
pub fn rank<L>(table: &AggregationTable<L>, options: &ReportOptions<L>) -> Vec<ReportRow<L>>
where
    L: Eq + Hash + Ord + Clone,
{
    let filter = options.filter.as_ref().map(|f| f.to_lowercase());
    let mut groups: HashMap<ReportKey, HashMap<L, u64>> = HashMap::new();

    for (entity, labels) in table.iter() {
        if let Some(filter) = &filter {
            if !entity.name.to_lowercase().contains(filter.as_str()) {
                continue;
            }
        }
        let key = if options.summarize_by_name {
            ReportKey::Name(entity.name.clone())
        } else {
            ReportKey::Entity(entity.clone())
        };
        let group = groups.entry(key).or_default();
        for (label, value) in labels {
            *group.entry(label.clone()).or_insert(0) += value;
        }
    }

    let mut rows: Vec<ReportRow<L>> = groups
        .into_iter()
        .map(|(key, labels)| {
            let mut breakdown: Vec<(L, u64)> = labels.into_iter().collect();
            breakdown.sort_by(|a, b| a.0.cmp(&b.0));
            let total = breakdown.iter().map(|(_, v)| v).sum();
            let mut row = ReportRow {
                key,
                breakdown,
                total,
                rank_value: 0,
            };
            row.rank_value = row.value_for(&options.rank_by);
            row
        })
        .filter(|row| match &options.threshold {
            Some(threshold) => row.value_for(&threshold.key) > threshold.min,
            None => true,
        })
        .collect();

    rows.sort_by(|a, b| b.rank_value.cmp(&a.rank_value).then_with(|| a.key.cmp(&b.key)));

    if let Some(limit) = options.limit {
        rows.truncate(limit);
    }
    rows
}
