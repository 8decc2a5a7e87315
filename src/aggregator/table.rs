//! Two-level accumulation table: entity -> label -> summed weight.

use crate::parser::EntityKey;
use std::collections::HashMap;
use std::hash::Hash;

/// Nested weight table filled during one ingest pass
///
/// **Public** - shared by the stack, counter and timer pipelines
///
/// Accumulation is a plain sum, so the final table does not depend on the
/// order in which attributions were recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationTable<L: Eq + Hash> {
    entries: HashMap<EntityKey, HashMap<L, u64>>,
}

impl<L: Eq + Hash> Default for AggregationTable<L> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<L: Eq + Hash + Clone> AggregationTable<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to `table[entity][label]`, creating entries as needed
    pub fn record(&mut self, entity: EntityKey, label: L, weight: u64) {
        *self.entries.entry(entity).or_default().entry(label).or_insert(0) += weight;
    }

    /// Add every value of `other` into this table
    pub fn merge(&mut self, other: &AggregationTable<L>) {
        for (entity, labels) in &other.entries {
            let target = self.entries.entry(entity.clone()).or_default();
            for (label, weight) in labels {
                *target.entry(label.clone()).or_insert(0) += weight;
            }
        }
    }

    pub fn value(&self, entity: &EntityKey, label: &L) -> u64 {
        self.entries
            .get(entity)
            .and_then(|labels| labels.get(label))
            .copied()
            .unwrap_or(0)
    }

    /// Sum over every label of one entity
    pub fn total(&self, entity: &EntityKey) -> u64 {
        self.entries
            .get(entity)
            .map(|labels| labels.values().sum())
            .unwrap_or(0)
    }

    /// Sum over the whole table
    pub fn grand_total(&self) -> u64 {
        self.entries.values().flat_map(|labels| labels.values()).sum()
    }

    pub fn get(&self, entity: &EntityKey) -> Option<&HashMap<L, u64>> {
        self.entries.get(entity)
    }

    pub fn contains(&self, entity: &EntityKey) -> bool {
        self.entries.contains_key(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &HashMap<L, u64>)> {
        self.entries.iter()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
