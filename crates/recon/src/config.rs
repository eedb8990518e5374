use serde::Deserialize;

use crate::error::ReconError;
use crate::model::MatchStage;
use crate::overrides::{Overrides, OverridesConfig};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub overrides: OverridesConfig,
    /// Treat a same-target overwrite as a failed run (CLI exit code).
    #[serde(default)]
    pub fail_on_conflict: bool,
}

// ---------------------------------------------------------------------------
// Inputs + Output
// ---------------------------------------------------------------------------

/// Input file paths, relative to the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputsConfig {
    pub entities: String,
    pub catalog: String,
    #[serde(default)]
    pub aliases: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub unmatched: Option<String>,
    #[serde(default)]
    pub unused: Option<String>,
    #[serde(default)]
    pub report: Option<String>,
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// Containment stage: ratio must be strictly above this.
    #[serde(default = "default_containment_threshold")]
    pub containment_threshold: f64,
    /// Fuzzy stage: best ratio must be strictly above this.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Shortest variant (in chars) considered by the substring and
    /// similarity stages.
    #[serde(default = "default_min_variant_len")]
    pub min_variant_len: usize,
    #[serde(default)]
    pub disabled_stages: Vec<MatchStage>,
}

fn default_containment_threshold() -> f64 {
    0.5
}

fn default_fuzzy_threshold() -> f64 {
    0.7
}

fn default_min_variant_len() -> usize {
    2
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            containment_threshold: default_containment_threshold(),
            fuzzy_threshold: default_fuzzy_threshold(),
            min_variant_len: default_min_variant_len(),
            disabled_stages: Vec::new(),
        }
    }
}

impl MatcherConfig {
    pub fn is_enabled(&self, stage: MatchStage) -> bool {
        !self.disabled_stages.contains(&stage)
    }

    /// Enabled stages in cascade order.
    pub fn enabled_stages(&self) -> impl Iterator<Item = MatchStage> + '_ {
        MatchStage::ALL.into_iter().filter(|s| self.is_enabled(*s))
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config for in-memory runs with no input paths.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: InputsConfig::default(),
            output: OutputConfig::default(),
            matcher: MatcherConfig::default(),
            overrides: OverridesConfig::default(),
            fail_on_conflict: false,
        }
    }

    /// Effective override tables: built-in defaults merged with `[overrides]`.
    pub fn override_tables(&self) -> Overrides {
        Overrides::from_config(&self.overrides)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        for (key, value) in [
            ("containment_threshold", self.matcher.containment_threshold),
            ("fuzzy_threshold", self.matcher.fuzzy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconError::ConfigValidation(format!(
                    "matcher.{key} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.matcher.min_variant_len == 0 {
            return Err(ReconError::ConfigValidation(
                "matcher.min_variant_len must be at least 1".into(),
            ));
        }

        if self.matcher.enabled_stages().next().is_none() {
            return Err(ReconError::ConfigValidation(
                "matcher.disabled_stages disables every stage".into(),
            ));
        }

        self.override_tables().validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "FGO wiki → catalog"

[inputs]
entities = "servants.json"
catalog = "catalog.json"
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = ReconConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "FGO wiki → catalog");
        assert_eq!(config.inputs.entities, "servants.json");
        assert!(config.inputs.aliases.is_none());
        assert_eq!(config.matcher.containment_threshold, 0.5);
        assert_eq!(config.matcher.fuzzy_threshold, 0.7);
        assert_eq!(config.matcher.min_variant_len, 2);
        assert_eq!(config.matcher.enabled_stages().count(), 7);
        assert!(!config.fail_on_conflict);
        assert!(config.output.report.is_none());
    }

    #[test]
    fn parse_full() {
        let input = format!(
            r#"fail_on_conflict = true
{MINIMAL}
[output]
dataset = "out/fgo_data.json"
unmatched = "out/unmatched.json"
unused = "out/unused.json"
report = "out/report.json"

[matcher]
containment_threshold = 0.6
fuzzy_threshold = 0.8
min_variant_len = 3
disabled_stages = ["fuzzy", "substring_fallback"]

[overrides]
mode = "extend"
spelling = [["阿尔托利亚", "阿尔托莉雅"]]
special_cases = [["黑王", "阿尔托莉雅·潘德拉贡"]]

[overrides.nicknames]
"玛修·基列莱特" = ["学妹"]
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        assert!(config.fail_on_conflict);
        assert_eq!(config.output.dataset.as_deref(), Some("out/fgo_data.json"));
        assert_eq!(config.matcher.min_variant_len, 3);
        assert!(!config.matcher.is_enabled(MatchStage::Fuzzy));
        assert!(config.matcher.is_enabled(MatchStage::Containment));

        let tables = config.override_tables();
        assert_eq!(
            tables.spelling.last(),
            Some(&("阿尔托利亚".to_string(), "阿尔托莉雅".to_string()))
        );
        assert_eq!(tables.nicknames_for("玛修·基列莱特"), ["学妹"]);
    }

    #[test]
    fn reject_unknown_stage() {
        let input = format!("{MINIMAL}\n[matcher]\ndisabled_stages = [\"levenshtein\"]\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_threshold_out_of_range() {
        let input = format!("{MINIMAL}\n[matcher]\nfuzzy_threshold = 1.5\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("fuzzy_threshold"), "{err}");
    }

    #[test]
    fn reject_zero_min_len() {
        let input = format!("{MINIMAL}\n[matcher]\nmin_variant_len = 0\n");
        assert!(ReconConfig::from_toml(&input).is_err());
    }

    #[test]
    fn reject_all_stages_disabled() {
        let input = format!(
            "{MINIMAL}\n[matcher]\ndisabled_stages = [\"exact\", \"reverse_alias\", \"special_case\", \
             \"containment\", \"case_insensitive\", \"fuzzy\", \"substring_fallback\"]\n"
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("every stage"), "{err}");
    }

    #[test]
    fn reject_spelling_override_completed_by_neighbours() {
        let input = format!(
            "{MINIMAL}\n[overrides]\nmode = \"replace\"\nspelling = [[\"ab\", \"b\"]]\n"
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
        assert!(err.to_string().contains("re-triggers"), "{err}");
    }

    #[test]
    fn reject_self_triggering_spelling_override() {
        let input = format!("{MINIMAL}\n[overrides]\nspelling = [[\"王\", \"阿育王\"]]\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn reject_missing_inputs() {
        let err = ReconConfig::from_toml("name = \"x\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn named_config_is_valid() {
        ReconConfig::named("in-memory").validate().unwrap();
    }
}
