use log::info;

use crate::config::ReconConfig;
use crate::matcher::Reconciler;
use crate::model::{ReconInput, ReconMeta, ReconResult, ReconSummary};
use crate::residual::{Accumulator, Reconciled};

/// Run reconciliation per config. Returns matches, dataset, residuals + summary.
///
/// Per-entity outcomes never fail the run: a miss lands in `unmatched`, an
/// overwrite lands in `conflicts`.
pub fn run(config: &ReconConfig, input: &ReconInput) -> ReconResult {
    let reconciler = Reconciler::new(config.matcher.clone(), config.override_tables(), input);
    let mut acc = Accumulator::new();
    reconciler.reconcile_into(&input.entities, &mut acc);
    let stage_counts = acc.stage_counts();
    let reconciled = acc.finish(&input.catalog);

    let summary = compute_summary(input, &reconciled, stage_counts);
    info!(
        "{}: {}/{} matched ({:.1}%), {} unmatched, {} unused targets, {} conflicts",
        config.name,
        summary.matched,
        summary.total_entities,
        summary.match_rate(),
        summary.unmatched,
        summary.unused_targets,
        summary.conflicts
    );

    ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        matches: reconciled.matches,
        conflicts: reconciled.conflicts,
        dataset: reconciled.dataset,
        unmatched: reconciled.unmatched,
        unused: reconciled.unused,
        skipped: input.skipped.clone(),
    }
}

fn compute_summary(
    input: &ReconInput,
    reconciled: &Reconciled,
    stage_counts: std::collections::BTreeMap<String, usize>,
) -> ReconSummary {
    ReconSummary {
        total_entities: reconciled.matches.len() + reconciled.unmatched.len(),
        matched: reconciled.matches.len(),
        unmatched: reconciled.unmatched.len(),
        dataset_entries: reconciled.dataset.len(),
        catalog_entries: input.catalog.len(),
        unused_targets: reconciled.unused.len(),
        ambiguous: reconciled.matches.iter().filter(|m| m.ambiguous).count(),
        conflicts: reconciled.conflicts.len(),
        skipped_records: input.skipped.len(),
        stage_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogEntry, EntityRecord, MatchStage};

    fn entity(name: &str, aliases: &[&str], acquisition: &str) -> EntityRecord {
        let mut e = EntityRecord::new(name);
        e.aliases = aliases.iter().map(|a| a.to_string()).collect();
        e.attributes.acquisition = acquisition.into();
        e
    }

    fn sample_input() -> ReconInput {
        ReconInput {
            entities: vec![
                entity("阿尔托莉雅·潘德拉贡（Alter）", &["黑呆"], "圣晶石常驻"),
                entity("阿育王", &[], "期间限定"),
                entity("不存在的从者", &[], "其他"),
                entity("阿尔托莉雅·潘德拉贡〔Alter〕", &[], "圣晶石常驻&剧情限定"),
            ],
            catalog: vec![
                CatalogEntry::new("阿尔托莉雅·潘德拉贡〔Alter〕", "ID1"),
                CatalogEntry::new("阿育王AshokaAshoka", "ID2"),
                CatalogEntry::new("梅林", "150"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn full_run_partitions_sources() {
        let config = ReconConfig::named("sample");
        let input = sample_input();
        let result = run(&config, &input);

        assert_eq!(result.summary.total_entities, 4);
        assert_eq!(result.summary.matched, 3);
        assert_eq!(result.summary.unmatched, 1);
        assert_eq!(result.unmatched[0].name, "不存在的从者");

        let matched: Vec<&str> = result.matches.iter().map(|m| m.source_name.as_str()).collect();
        for e in &input.entities {
            let in_matched = matched.contains(&e.name.as_str());
            let in_unmatched = result.unmatched.iter().any(|u| u.name == e.name);
            assert!(in_matched ^ in_unmatched, "{} must be in exactly one set", e.name);
        }
    }

    #[test]
    fn later_source_wins_shared_target() {
        let result = run(&ReconConfig::named("sample"), &sample_input());
        assert_eq!(result.summary.dataset_entries, 2);
        assert_eq!(result.summary.conflicts, 1);
        assert_eq!(result.conflicts[0].target_id, "ID1");
        assert_eq!(result.conflicts[0].winning_source, "阿尔托莉雅·潘德拉贡〔Alter〕");
        // the winner's acquisition splits into two entries
        assert_eq!(result.dataset["ID1"].acquisition.len(), 2);
    }

    #[test]
    fn dataset_keys_come_from_matches() {
        let result = run(&ReconConfig::named("sample"), &sample_input());
        for id in result.dataset.keys() {
            assert!(result.matches.iter().any(|m| &m.target_id == id));
        }
        let unused: Vec<&str> = result.unused.iter().map(|c| c.target_id.as_str()).collect();
        assert_eq!(unused, ["150"]);
    }

    #[test]
    fn stage_counts_in_summary() {
        let result = run(&ReconConfig::named("sample"), &sample_input());
        let counts = &result.summary.stage_counts;
        assert_eq!(counts[MatchStage::Exact.as_str()], 2);
        assert_eq!(counts[MatchStage::SpecialCase.as_str()], 1);
        assert_eq!(counts.values().sum::<usize>(), result.summary.matched);
    }

    #[test]
    fn runs_are_deterministic() {
        let config = ReconConfig::named("sample");
        let input = sample_input();
        let a = run(&config, &input);
        let b = run(&config, &input);
        assert_eq!(a.matches, b.matches);
        assert_eq!(a.dataset, b.dataset);
        assert_eq!(a.unmatched, b.unmatched);
        assert_eq!(a.unused, b.unused);
        assert_eq!(a.conflicts, b.conflicts);
    }

    #[test]
    fn chunked_run_matches_single_pass() {
        let config = ReconConfig::named("sample");
        let input = sample_input();
        let single = run(&config, &input);

        let reconciler = Reconciler::new(config.matcher.clone(), config.override_tables(), &input);
        let mut acc = Accumulator::new();
        let (head, tail) = input.entities.split_at(2);
        reconciler.reconcile_into(head, &mut acc);
        reconciler.reconcile_into(tail, &mut acc);
        let chunked = acc.finish(&input.catalog);

        assert_eq!(chunked.matches, single.matches);
        assert_eq!(chunked.dataset, single.dataset);
        assert_eq!(chunked.unmatched, single.unmatched);
        assert_eq!(chunked.unused, single.unused);
    }

    #[test]
    fn empty_input() {
        let result = run(&ReconConfig::named("empty"), &ReconInput::default());
        assert_eq!(result.summary.total_entities, 0);
        assert_eq!(result.summary.match_rate(), 0.0);
        assert!(result.dataset.is_empty());
    }
}
