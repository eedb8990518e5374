//! Candidate matcher: the ordered stage cascade.
//!
//! Every stage looks at all (source variant × target variant) pairs and
//! collects the pairs it accepts in iteration order. The first stage that
//! accepts anything decides the match; later stages are never evaluated for
//! that entity. Within a stage the first accepted pair wins and the match is
//! flagged `ambiguous` when the accepted pairs name more than one identifier.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::config::MatcherConfig;
use crate::expand::{expand, expand_target, VariantSet};
use crate::model::{CatalogEntry, EntityRecord, MatchResult, MatchStage, ReconInput};
use crate::normalize::{has_latin_letter, unify_dots, Normalizer};
use crate::overrides::Overrides;
use crate::project::project;
use crate::residual::Accumulator;
use crate::similarity::ratio;

/// A catalog entry with its precomputed variants.
#[derive(Debug, Clone)]
struct IndexedTarget {
    name: String,
    /// Raw name with unified middle dots, searched by the special-case stage.
    dotted_name: String,
    target_id: String,
    variants: VariantSet,
}

#[derive(Debug, Clone)]
struct Candidate<'t> {
    target: &'t IndexedTarget,
    source_variant: String,
    target_variant: String,
    score: Option<f64>,
}

/// What one stage saw for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTrace {
    pub stage: MatchStage,
    pub accepted: usize,
}

/// Full cascade trace for one entity, for the `explain` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub source_name: String,
    pub variants: Vec<String>,
    /// Evaluated stages in order. Disabled stages are absent.
    pub stages: Vec<StageTrace>,
    pub result: Option<MatchResult>,
}

pub struct Reconciler {
    config: MatcherConfig,
    normalizer: Normalizer,
    overrides: Overrides,
    targets: Vec<IndexedTarget>,
    /// Normalized alias → canonical source name.
    reverse_aliases: HashMap<String, String>,
}

impl Reconciler {
    /// Precompute catalog variants and the reverse alias index for one run.
    pub fn new(config: MatcherConfig, overrides: Overrides, input: &ReconInput) -> Self {
        let normalizer = Normalizer::from_overrides(&overrides);
        let targets = index_catalog(&normalizer, &input.catalog);
        let reverse_aliases = build_reverse_index(&normalizer, input);
        debug!(
            "matcher ready: {} targets, {} reverse aliases",
            targets.len(),
            reverse_aliases.len()
        );
        Self {
            config,
            normalizer,
            overrides,
            targets,
            reverse_aliases,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Match every entity in order, feeding hits and misses into `acc`.
    ///
    /// Calling this over disjoint chunks of the source collection with the
    /// same accumulator gives the same result as one call over all of it.
    pub fn reconcile_into(&self, entities: &[EntityRecord], acc: &mut Accumulator) {
        for entity in entities {
            if acc.has_seen(&entity.name) {
                warn!("source '{}' appears more than once; keeping the first", entity.name);
                continue;
            }
            match self.match_entity(entity) {
                Some(result) => acc.record_match(entity, result, project(&entity.attributes)),
                None => acc.record_miss(entity),
            }
        }
    }

    pub fn match_entity(&self, entity: &EntityRecord) -> Option<MatchResult> {
        self.explain(entity).result
    }

    /// Run the cascade for one entity and keep the per-stage trace.
    pub fn explain(&self, entity: &EntityRecord) -> Explanation {
        let source = expand(&self.normalizer, &entity.name, &entity.aliases);
        let mut stages = Vec::new();
        let mut result = None;

        for stage in self.config.enabled_stages() {
            let candidates = self.run_stage(stage, entity, &source);
            stages.push(StageTrace {
                stage,
                accepted: candidates.len(),
            });
            if let Some(m) = accept(entity, stage, &candidates) {
                debug!(
                    "'{}' → '{}' ({}) via {} [{} ≈ {}]",
                    m.source_name, m.target_name, m.target_id, stage, m.source_variant, m.target_variant
                );
                result = Some(m);
                break;
            }
        }

        if result.is_none() {
            debug!("'{}' unmatched after {} stages", entity.name, stages.len());
        }

        Explanation {
            source_name: entity.name.clone(),
            variants: source.as_slice().to_vec(),
            stages,
            result,
        }
    }

    fn run_stage<'t>(
        &'t self,
        stage: MatchStage,
        entity: &EntityRecord,
        source: &VariantSet,
    ) -> Vec<Candidate<'t>> {
        match stage {
            MatchStage::Exact => self.exact(source),
            MatchStage::ReverseAlias => self.reverse_alias(entity, source),
            MatchStage::SpecialCase => self.special_case(source),
            MatchStage::Containment => self.containment(source),
            MatchStage::CaseInsensitive => self.case_insensitive(source),
            MatchStage::Fuzzy => self.fuzzy(source),
            MatchStage::SubstringFallback => self.substring_fallback(source),
        }
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    fn exact<'t>(&'t self, source: &VariantSet) -> Vec<Candidate<'t>> {
        let mut out = Vec::new();
        for sv in source.iter() {
            for target in &self.targets {
                if target.variants.contains(sv) {
                    out.push(candidate(target, sv, sv, None));
                }
            }
        }
        out
    }

    fn reverse_alias<'t>(&'t self, entity: &EntityRecord, source: &VariantSet) -> Vec<Candidate<'t>> {
        let mut out = Vec::new();
        for sv in source.iter() {
            let Some(canonical) = self.reverse_aliases.get(sv) else {
                continue;
            };
            if *canonical == entity.name {
                continue;
            }
            let canonical_variants = expand(&self.normalizer, canonical, &[] as &[String]);
            for hit in self.exact(&canonical_variants) {
                out.push(Candidate {
                    source_variant: sv.to_string(),
                    ..hit
                });
            }
        }
        out
    }

    fn special_case<'t>(&'t self, source: &VariantSet) -> Vec<Candidate<'t>> {
        let mut out = Vec::new();
        for sv in source.iter() {
            for (fragment, target_fragment) in &self.overrides.special_cases {
                if !sv.contains(fragment.as_str()) {
                    continue;
                }
                let wanted = unify_dots(target_fragment);
                for target in &self.targets {
                    if target.dotted_name.contains(&wanted) {
                        out.push(candidate(target, sv, &target.dotted_name, None));
                    } else if let Some(tv) = target.variants.iter().find(|tv| tv.contains(&wanted)) {
                        out.push(candidate(target, sv, tv, None));
                    }
                }
            }
        }
        out
    }

    fn containment<'t>(&'t self, source: &VariantSet) -> Vec<Candidate<'t>> {
        let min_len = self.config.min_variant_len;
        let mut out = Vec::new();
        for sv in source.long(min_len) {
            for target in &self.targets {
                for tv in target.variants.long(min_len) {
                    if !(sv.contains(tv) || tv.contains(sv)) {
                        continue;
                    }
                    let score = ratio(sv, tv);
                    if score > self.config.containment_threshold {
                        out.push(candidate(target, sv, tv, Some(score)));
                    }
                }
            }
        }
        out
    }

    fn case_insensitive<'t>(&'t self, source: &VariantSet) -> Vec<Candidate<'t>> {
        let mut out = Vec::new();
        for sv in source.iter().filter(|v| has_latin_letter(v)) {
            let folded = sv.to_lowercase();
            for target in &self.targets {
                for tv in target.variants.iter().filter(|v| has_latin_letter(v)) {
                    if tv.to_lowercase() == folded {
                        out.push(candidate(target, sv, tv, None));
                    }
                }
            }
        }
        out
    }

    /// Best pair only, plus any pair with exactly the same score so the
    /// ambiguity flag can see it.
    fn fuzzy<'t>(&'t self, source: &VariantSet) -> Vec<Candidate<'t>> {
        let min_len = self.config.min_variant_len;
        let mut best_score = self.config.fuzzy_threshold;
        let mut out: Vec<Candidate<'t>> = Vec::new();
        for sv in source.long(min_len) {
            for target in &self.targets {
                for tv in target.variants.long(min_len) {
                    let score = ratio(sv, tv);
                    if score > best_score {
                        best_score = score;
                        out.clear();
                        out.push(candidate(target, sv, tv, Some(score)));
                    } else if score == best_score && !out.is_empty() {
                        out.push(candidate(target, sv, tv, Some(score)));
                    }
                }
            }
        }
        out
    }

    fn substring_fallback<'t>(&'t self, source: &VariantSet) -> Vec<Candidate<'t>> {
        let min_len = self.config.min_variant_len;
        let mut out = Vec::new();
        for sv in source.long(min_len) {
            for target in &self.targets {
                for tv in target.variants.long(min_len) {
                    if sv.contains(tv) || tv.contains(sv) {
                        out.push(candidate(target, sv, tv, None));
                    }
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn candidate<'t>(target: &'t IndexedTarget, sv: &str, tv: &str, score: Option<f64>) -> Candidate<'t> {
    Candidate {
        target,
        source_variant: sv.to_string(),
        target_variant: tv.to_string(),
        score,
    }
}

fn accept(entity: &EntityRecord, stage: MatchStage, candidates: &[Candidate<'_>]) -> Option<MatchResult> {
    let first = candidates.first()?;
    let ambiguous = candidates
        .iter()
        .any(|c| c.target.target_id != first.target.target_id);
    Some(MatchResult {
        source_name: entity.name.clone(),
        target_id: first.target.target_id.clone(),
        target_name: first.target.name.clone(),
        stage,
        source_variant: first.source_variant.clone(),
        target_variant: first.target_variant.clone(),
        score: first.score,
        ambiguous,
    })
}

fn index_catalog(normalizer: &Normalizer, catalog: &[CatalogEntry]) -> Vec<IndexedTarget> {
    catalog
        .iter()
        .map(|entry| IndexedTarget {
            name: entry.name.clone(),
            dotted_name: unify_dots(&entry.name),
            target_id: entry.target_id.clone(),
            variants: expand_target(normalizer, &entry.name),
        })
        .filter(|t| !t.variants.is_empty())
        .collect()
}

/// Every entity alias and every external alias-table entry, keyed by the
/// normalized alias. The first canonical name seen for an alias keeps it.
fn build_reverse_index(normalizer: &Normalizer, input: &ReconInput) -> HashMap<String, String> {
    let sources = input
        .entities
        .iter()
        .map(|e| (e.name.as_str(), e.aliases.as_slice()))
        .chain(input.alias_table.iter().map(|(n, a)| (n.as_str(), a.as_slice())));

    let mut index = HashMap::new();
    for (canonical, aliases) in sources {
        let canonical_key = normalizer.normalize(canonical);
        for alias in aliases {
            let key = normalizer.normalize(alias);
            if key.is_empty() || key == canonical_key {
                continue;
            }
            match index.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(canonical.to_string());
                }
                Entry::Occupied(slot) => {
                    if slot.get() != canonical {
                        warn!(
                            "alias '{}' claimed by both '{}' and '{}'; keeping '{}'",
                            slot.key(),
                            slot.get(),
                            canonical,
                            slot.get()
                        );
                    }
                }
            }
        }
    }
    index
}
