// End-to-end tests for the `srecon` binary.
// Run with: cargo test -p servant-recon-cli --test cli_tests -- --nocapture
//
// Every test copies the engine fixtures into a fresh temp dir so outputs
// never land in the source tree.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const FIXTURES: [&str; 4] = ["entities.json", "catalog.json", "aliases.json", "fgo.recon.toml"];

fn srecon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_srecon"))
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures")
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in FIXTURES {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn run(args: &[&str]) -> Output {
    srecon().args(args).output().expect("spawn srecon")
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("exit code")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    serde_json::from_str(&text).unwrap()
}

fn config_path(dir: &TempDir) -> String {
    dir.path().join("fgo.recon.toml").to_string_lossy().into_owned()
}

// ===========================================================================
// srecon run
// ===========================================================================

#[test]
fn run_writes_every_configured_output() {
    let dir = workspace();
    let out = run(&["run", &config_path(&dir)]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let dataset = read_json(&dir.path().join("fgo_data.json"));
    assert_eq!(dataset.as_object().unwrap().len(), 8);
    assert_eq!(dataset["220"]["职阶"]["月癌"]["text"], "月癌");

    let unmatched = read_json(&dir.path().join("unmatched.json"));
    assert!(unmatched.get("谜之从者Z").is_some());

    let unused = read_json(&dir.path().join("unused.json"));
    assert_eq!(unused["玉藻前"]["target_id"], "62");

    let report = read_json(&dir.path().join("report.json"));
    assert_eq!(report["summary"]["matched"], 9);

    let err = stderr(&out);
    assert!(err.contains("9/10 matched"), "summary missing: {err}");
    assert!(err.contains("wrote"), "{err}");
}

#[test]
fn run_json_prints_one_report_to_stdout() {
    let dir = workspace();
    let out = run(&["run", &config_path(&dir), "--json"]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let report: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{stdout}"));
    assert_eq!(report["meta"]["config_name"], "FGO wiki → catalog");
    assert_eq!(report["summary"]["stage_counts"]["fuzzy"], 1);
    assert_eq!(report["conflicts"][0]["target_id"], "2");
}

#[test]
fn run_output_flag_writes_report_copy() {
    let dir = workspace();
    let extra = dir.path().join("copy.json");
    let out = run(&["run", &config_path(&dir), "--output", extra.to_str().unwrap()]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
    assert_eq!(read_json(&extra)["summary"]["unmatched"], 1);
}

#[test]
fn strict_run_with_unmatched_exits_5_after_writing() {
    let dir = workspace();
    let out = run(&["run", &config_path(&dir), "--strict"]);
    assert_eq!(code(&out), 5);
    assert!(stderr(&out).contains("1 unmatched"));
    assert!(dir.path().join("fgo_data.json").exists());
}

#[test]
fn fail_on_conflict_exits_6() {
    let dir = workspace();
    let toml = std::fs::read_to_string(dir.path().join("fgo.recon.toml")).unwrap();
    let path = dir.path().join("conflict.recon.toml");
    std::fs::write(&path, format!("fail_on_conflict = true\n{toml}")).unwrap();

    let out = run(&["run", path.to_str().unwrap()]);
    assert_eq!(code(&out), 6, "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("conflicts"), "{err}");
    assert!(err.contains("hint:"), "{err}");
}

#[test]
fn corrupt_input_exits_4_and_writes_nothing() {
    let dir = workspace();
    std::fs::write(dir.path().join("entities.json"), "[1, 2]").unwrap();

    let out = run(&["run", &config_path(&dir)]);
    assert_eq!(code(&out), 4);
    assert!(stderr(&out).contains("entities"));
    for name in ["fgo_data.json", "unmatched.json", "unused.json", "report.json"] {
        assert!(!dir.path().join(name).exists(), "{name} must not be written");
    }
}

#[test]
fn unwritable_output_leaves_other_outputs_untouched() {
    let dir = workspace();
    let path = dir.path().join("partial.recon.toml");
    std::fs::write(
        &path,
        "name = \"partial\"\n[inputs]\nentities = \"entities.json\"\ncatalog = \"catalog.json\"\n\
         [output]\ndataset = \"fgo_data.json\"\nreport = \"no_such_dir/report.json\"\n",
    )
    .unwrap();

    let out = run(&["run", path.to_str().unwrap()]);
    assert_eq!(code(&out), 4);
    assert!(stderr(&out).contains("no_such_dir"), "{}", stderr(&out));
    assert!(!dir.path().join("fgo_data.json").exists());
    assert!(!dir.path().join("fgo_data.json.tmp").exists());
}

#[test]
fn missing_input_file_exits_4() {
    let dir = workspace();
    std::fs::remove_file(dir.path().join("catalog.json")).unwrap();
    let out = run(&["run", &config_path(&dir)]);
    assert_eq!(code(&out), 4);
    assert!(stderr(&out).contains("cannot read"));
}

#[test]
fn invalid_config_exits_3() {
    let dir = workspace();
    let path = dir.path().join("bad.recon.toml");
    std::fs::write(
        &path,
        "name = \"bad\"\n[inputs]\nentities = \"entities.json\"\ncatalog = \"catalog.json\"\n[matcher]\nfuzzy_threshold = 1.5\n",
    )
    .unwrap();

    let out = run(&["run", path.to_str().unwrap()]);
    assert_eq!(code(&out), 3);
    assert!(stderr(&out).contains("fuzzy_threshold"));
}

// ===========================================================================
// srecon validate
// ===========================================================================

#[test]
fn validate_reports_enabled_stages() {
    let out = run(&["validate", fixtures_dir().join("strict.recon.toml").to_str().unwrap()]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("5 of 7 stages"), "{err}");
    assert!(!err.contains("fuzzy"), "{err}");
}

#[test]
fn validate_rejects_unknown_stage() {
    let dir = workspace();
    let path = dir.path().join("typo.recon.toml");
    std::fs::write(
        &path,
        "name = \"typo\"\n[inputs]\nentities = \"e.json\"\ncatalog = \"c.json\"\n[matcher]\ndisabled_stages = [\"fuzzzy\"]\n",
    )
    .unwrap();
    let out = run(&["validate", path.to_str().unwrap()]);
    assert_eq!(code(&out), 3);
}

// ===========================================================================
// srecon normalize
// ===========================================================================

#[test]
fn normalize_json_lists_variants() {
    let out = run(&["normalize", "阿尔托莉雅・潘德拉贡〔Alter〕", "阿育王AshokaAshoka", "--json"]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows[0]["input"], "阿尔托莉雅・潘德拉贡〔Alter〕");
    assert_eq!(rows[0]["normalized"], "阿尔托莉雅·潘德拉贡");

    let variants: Vec<&str> = rows[1]["variants"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(variants[0], "阿育王AshokaAshoka");
    assert!(variants.contains(&"阿育王"));
    assert!(variants.contains(&"AshokaAshoka"));
}

#[test]
fn normalize_text_includes_aliases() {
    let out = run(&["normalize", "所罗门", "--alias", "罗曼"]);
    assert_eq!(code(&out), 0);
    let stdout = String::from_utf8_lossy(&out.stdout);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("所罗门"));
    assert!(stdout.contains("  罗曼"), "{stdout}");
}

#[test]
fn normalize_without_names_is_usage_error() {
    let out = run(&["normalize"]);
    assert_eq!(code(&out), 2);
}

// ===========================================================================
// srecon explain
// ===========================================================================

#[test]
fn explain_traces_stages_until_the_match() {
    let dir = workspace();
    let out = run(&["explain", &config_path(&dir), "BB", "--json"]);
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let x: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(x["source_name"], "BB");
    assert_eq!(x["result"]["stage"], "case_insensitive");
    assert_eq!(x["result"]["target_id"], "220");

    let stages: Vec<&str> = x["stages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["stage"].as_str())
        .collect();
    assert_eq!(stages.last(), Some(&"case_insensitive"));
    assert_eq!(x["stages"][0]["accepted"], 0);
}

#[test]
fn explain_unmatched_name_in_text() {
    let dir = workspace();
    let out = run(&["explain", &config_path(&dir), "谜之从者Z"]);
    assert_eq!(code(&out), 0);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("谜之从者Z\n"), "{stdout}");
    assert!(stdout.contains("→ unmatched"), "{stdout}");
}

#[test]
fn explain_blank_name_is_usage_error() {
    let dir = workspace();
    let out = run(&["explain", &config_path(&dir), "  "]);
    assert_eq!(code(&out), 2);
}
