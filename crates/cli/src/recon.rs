//! `srecon run | validate | explain`: config-driven reconciliation.

use std::path::{Path, PathBuf};

use servant_recon::ingest::{enrich_aliases, load_input};
use servant_recon::matcher::Explanation;
use servant_recon::model::{EntityRecord, MatchStage, ReconInput};
use servant_recon::persist::{render_dataset, render_report, render_unmatched, render_unused};
use servant_recon::{ReconConfig, ReconError, Reconciler};

use crate::exit_codes::{
    EXIT_RECON_CONFLICT, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME, EXIT_RECON_UNMATCHED,
    EXIT_USAGE,
};
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn runtime_err(err: ReconError) -> CliError {
    recon_err(EXIT_RECON_RUNTIME, err.to_string())
}

fn read_file(path: &Path) -> Result<String, ReconError> {
    std::fs::read_to_string(path).map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write every output next to its destination, then move them into place.
/// If any staged write fails, the staged files are removed and no
/// destination is touched.
fn write_outputs(writes: &[(PathBuf, String)]) -> Result<(), ReconError> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(writes.len());
    for (path, contents) in writes {
        let tmp = staging_path(path);
        if let Err(e) = std::fs::write(&tmp, contents) {
            for done in &staged {
                let _ = std::fs::remove_file(done);
            }
            return Err(ReconError::Io(format!("cannot write {}: {e}", path.display())));
        }
        staged.push(tmp);
    }
    for (tmp, (path, _)) in staged.iter().zip(writes) {
        std::fs::rename(tmp, path)
            .map_err(|e| ReconError::Io(format!("cannot move output into {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

/// Read and validate a config. Returns it with the directory its paths are relative to.
fn load_config(config_path: &Path) -> Result<(ReconConfig, PathBuf), CliError> {
    let config_str = read_file(config_path).map_err(runtime_err)?;
    let config = ReconConfig::from_toml(&config_str).map_err(|e| CliError {
        code: EXIT_RECON_INVALID_CONFIG,
        message: e.to_string(),
        hint: Some(format!("run `srecon validate {}` after fixing it", config_path.display())),
    })?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((config, base_dir))
}

fn load_documents(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, ReconError> {
    let entities = read_file(&base_dir.join(&config.inputs.entities))?;
    let catalog = read_file(&base_dir.join(&config.inputs.catalog))?;
    let aliases = match &config.inputs.aliases {
        Some(path) => Some(read_file(&base_dir.join(path))?),
        None => None,
    };
    load_input(&entities, &catalog, aliases.as_deref(), &config.override_tables())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let (config, base_dir) = load_config(&config_path)?;
    let input = load_documents(&config, &base_dir).map_err(runtime_err)?;

    let result = servant_recon::run(&config, &input);

    // Render everything before touching the filesystem so a failure leaves no partial output.
    let report = render_report(&result).map_err(runtime_err)?;
    let mut writes: Vec<(PathBuf, String)> = Vec::new();
    let outputs = &config.output;
    if let Some(path) = &outputs.dataset {
        writes.push((base_dir.join(path), render_dataset(&result).map_err(runtime_err)?));
    }
    if let Some(path) = &outputs.unmatched {
        writes.push((base_dir.join(path), render_unmatched(&result).map_err(runtime_err)?));
    }
    if let Some(path) = &outputs.unused {
        writes.push((base_dir.join(path), render_unused(&result).map_err(runtime_err)?));
    }
    if let Some(path) = &outputs.report {
        writes.push((base_dir.join(path), report.clone()));
    }
    if let Some(path) = output_file {
        writes.push((path, report.clone()));
    }

    write_outputs(&writes).map_err(runtime_err)?;

    if json_output {
        println!("{report}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {}/{} matched ({:.1}%), {} unmatched, {} unused targets",
        result.meta.config_name,
        s.matched,
        s.total_entities,
        s.match_rate(),
        s.unmatched,
        s.unused_targets,
    );
    let stages: Vec<String> = s
        .stage_counts
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(stage, n)| format!("{stage} {n}"))
        .collect();
    if !stages.is_empty() {
        eprintln!("stages: {}", stages.join(", "));
    }
    if s.ambiguous > 0 || s.conflicts > 0 || s.skipped_records > 0 {
        eprintln!(
            "{} ambiguous, {} conflicts, {} skipped records",
            s.ambiguous, s.conflicts, s.skipped_records
        );
    }

    if s.conflicts > 0 && config.fail_on_conflict {
        let ids: Vec<&str> = result.conflicts.iter().map(|c| c.target_id.as_str()).collect();
        return Err(CliError {
            code: EXIT_RECON_CONFLICT,
            message: format!("{} target conflicts (fail_on_conflict): {}", s.conflicts, ids.join(", ")),
            hint: Some("add aliases or overrides so each target is claimed once".into()),
        });
    }
    if strict && s.unmatched > 0 {
        return Err(recon_err(
            EXIT_RECON_UNMATCHED,
            format!("{} unmatched entities (--strict)", s.unmatched),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, _) = load_config(&config_path)?;
    let stages: Vec<&str> = config.matcher.enabled_stages().map(|s| s.as_str()).collect();
    eprintln!(
        "valid: \"{}\" ({} of {} stages: {})",
        config.name,
        stages.len(),
        MatchStage::ALL.len(),
        stages.join(", ")
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// explain
// ---------------------------------------------------------------------------

pub fn cmd_explain(config_path: PathBuf, name: String, json_output: bool) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(recon_err(EXIT_USAGE, "name must not be empty"));
    }

    let (config, base_dir) = load_config(&config_path)?;
    let input = load_documents(&config, &base_dir).map_err(runtime_err)?;
    let overrides = config.override_tables();

    let entity = match input.entities.iter().find(|e| e.name == name) {
        Some(e) => e.clone(),
        None => {
            log::info!("'{name}' is not in the entity collection; matching the bare name");
            let mut e = EntityRecord::new(name);
            enrich_aliases(&mut e, &overrides);
            e
        }
    };

    let reconciler = Reconciler::new(config.matcher.clone(), overrides, &input);
    let explanation = reconciler.explain(&entity);

    if json_output {
        let json = serde_json::to_string_pretty(&explanation)
            .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    } else {
        print_explanation(&explanation);
    }
    Ok(())
}

fn print_explanation(x: &Explanation) {
    println!("{}", x.source_name);
    println!("  variants: {}", x.variants.join(" | "));
    for trace in &x.stages {
        println!("  {:<20} {} accepted", trace.stage.as_str(), trace.accepted);
    }
    match &x.result {
        Some(m) => {
            let score = m.score.map(|s| format!(" score {s:.3}")).unwrap_or_default();
            let ambiguous = if m.ambiguous { " (ambiguous)" } else { "" };
            println!(
                "  → {} [{}] via {}: '{}' ≈ '{}'{score}{ambiguous}",
                m.target_name, m.target_id, m.stage, m.source_variant, m.target_variant
            );
        }
        None => println!("  → unmatched"),
    }
}
