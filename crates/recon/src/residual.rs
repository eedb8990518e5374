//! Run accumulator: the only mutable state of a reconciliation pass.
//!
//! Holds the dataset being built plus the bookkeeping that yields the two
//! residual sets once every entity has been seen.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;

use log::warn;

use crate::model::{CatalogEntry, Conflict, DisplayRecord, EntityRecord, MatchResult, MatchStage};

#[derive(Debug, Default)]
pub struct Accumulator {
    matches: Vec<MatchResult>,
    dataset: IndexMap<String, DisplayRecord>,
    /// Target identifier → source name currently holding its dataset entry.
    owners: HashMap<String, String>,
    conflicts: Vec<Conflict>,
    unmatched: Vec<EntityRecord>,
    used_ids: HashSet<String>,
    seen: HashSet<String>,
}

/// Everything a finished pass produced.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub matches: Vec<MatchResult>,
    pub dataset: IndexMap<String, DisplayRecord>,
    pub conflicts: Vec<Conflict>,
    pub unmatched: Vec<EntityRecord>,
    pub unused: Vec<CatalogEntry>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, source_name: &str) -> bool {
        self.seen.contains(source_name)
    }

    pub fn is_used(&self, target_id: &str) -> bool {
        self.used_ids.contains(target_id)
    }

    pub fn matched_count(&self) -> usize {
        self.matches.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }

    /// Store an accepted match. A later match for an identifier that is
    /// already in the dataset replaces the earlier entry and is recorded
    /// as a conflict.
    pub fn record_match(&mut self, entity: &EntityRecord, result: MatchResult, display: DisplayRecord) {
        self.seen.insert(entity.name.clone());
        let id = result.target_id.clone();

        if let Some(previous) = self.owners.insert(id.clone(), entity.name.clone()) {
            warn!(
                "target {} ('{}'): '{}' overwrites '{}'",
                id, result.target_name, entity.name, previous
            );
            self.conflicts.push(Conflict {
                target_id: id.clone(),
                overwritten_source: previous,
                winning_source: entity.name.clone(),
            });
        }

        self.dataset.insert(id.clone(), display);
        self.used_ids.insert(id);
        self.matches.push(result);
    }

    pub fn record_miss(&mut self, entity: &EntityRecord) {
        self.seen.insert(entity.name.clone());
        self.unmatched.push(entity.clone());
    }

    /// Matches per stage, every stage listed.
    pub fn stage_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> =
            MatchStage::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
        for m in &self.matches {
            *counts.entry(m.stage.as_str().to_string()).or_default() += 1;
        }
        counts
    }

    /// Close the pass. Catalog entries whose identifier no match claimed
    /// become the unused residual, in catalog order.
    pub fn finish(self, catalog: &[CatalogEntry]) -> Reconciled {
        let unused = catalog
            .iter()
            .filter(|entry| !self.used_ids.contains(&entry.target_id))
            .cloned()
            .collect();
        Reconciled {
            matches: self.matches,
            dataset: self.dataset,
            conflicts: self.conflicts,
            unmatched: self.unmatched,
            unused,
        }
    }
}
