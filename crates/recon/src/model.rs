use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder the extraction step writes for attributes it could not read.
pub const UNKNOWN: &str = "未知";

/// Placeholder for a missing acquisition method.
pub const UNKNOWN_ACQUISITION: &str = "未知途径";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Categorical attributes of a source entity, one raw string each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attributes {
    #[serde(rename = "稀有度")]
    pub rarity: String,
    #[serde(rename = "职阶")]
    pub class: String,
    #[serde(rename = "宝具色卡")]
    pub np_card: String,
    #[serde(rename = "宝具类型")]
    pub np_type: String,
    #[serde(rename = "获取途径")]
    pub acquisition: String,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            rarity: UNKNOWN.into(),
            class: UNKNOWN.into(),
            np_card: UNKNOWN.into(),
            np_type: UNKNOWN.into(),
            acquisition: UNKNOWN_ACQUISITION.into(),
        }
    }
}

/// A single source entity (catalog A), keyed by its primary name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub wiki_id: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
    #[serde(rename = "别名")]
    pub aliases: Vec<String>,
    #[serde(rename = "图片URL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wiki_id: None,
            attributes: Attributes::default(),
            aliases: Vec::new(),
            image_url: None,
        }
    }
}

/// One target catalog entry (catalog B). Identifiers are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub target_id: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_id: target_id.into(),
        }
    }
}

/// A source record the ingest step refused, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub name: String,
    pub reason: String,
}

/// Pre-loaded collections for one run. Order of `entities` and `catalog`
/// is the iteration order of the run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub entities: Vec<EntityRecord>,
    pub catalog: Vec<CatalogEntry>,
    /// External alias table: canonical source name → aliases.
    pub alias_table: Vec<(String, Vec<String>)>,
    pub skipped: Vec<SkippedRecord>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Cascade stages in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Exact,
    ReverseAlias,
    SpecialCase,
    Containment,
    CaseInsensitive,
    Fuzzy,
    SubstringFallback,
}

impl MatchStage {
    pub const ALL: [MatchStage; 7] = [
        Self::Exact,
        Self::ReverseAlias,
        Self::SpecialCase,
        Self::Containment,
        Self::CaseInsensitive,
        Self::Fuzzy,
        Self::SubstringFallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::ReverseAlias => "reverse_alias",
            Self::SpecialCase => "special_case",
            Self::Containment => "containment",
            Self::CaseInsensitive => "case_insensitive",
            Self::Fuzzy => "fuzzy",
            Self::SubstringFallback => "substring_fallback",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The accepted match for one source entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub source_name: String,
    pub target_id: String,
    pub target_name: String,
    pub stage: MatchStage,
    pub source_variant: String,
    pub target_variant: String,
    /// Similarity ratio, for the stages that compute one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// More than one distinct identifier was acceptable at the winning stage.
    pub ambiguous: bool,
}

/// A later match overwrote an earlier dataset entry for the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub target_id: String,
    pub overwritten_source: String,
    pub winning_source: String,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// How one label is shown: optional icon reference plus text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendering {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub text: String,
}

impl Rendering {
    pub fn text(text: impl Into<String>) -> Self {
        Self { icon: None, text: text.into() }
    }

    pub fn with_icon(icon: impl Into<String>, text: impl Into<String>) -> Self {
        Self { icon: Some(icon.into()), text: text.into() }
    }
}

/// Label → rendering, in projection order.
pub type AttributeDisplay = IndexMap<String, Rendering>;

/// Display-oriented projection of one entity's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    #[serde(rename = "稀有度")]
    pub rarity: AttributeDisplay,
    #[serde(rename = "职阶")]
    pub class: AttributeDisplay,
    #[serde(rename = "宝具色卡")]
    pub np_card: AttributeDisplay,
    #[serde(rename = "宝具类型")]
    pub np_type: AttributeDisplay,
    #[serde(rename = "获取途径")]
    pub acquisition: AttributeDisplay,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub total_entities: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub dataset_entries: usize,
    pub catalog_entries: usize,
    pub unused_targets: usize,
    pub ambiguous: usize,
    pub conflicts: usize,
    pub skipped_records: usize,
    pub stage_counts: BTreeMap<String, usize>,
}

impl ReconSummary {
    /// Matched share of the source collection, in percent.
    pub fn match_rate(&self) -> f64 {
        if self.total_entities == 0 {
            return 0.0;
        }
        self.matched as f64 * 100.0 / self.total_entities as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub matches: Vec<MatchResult>,
    pub conflicts: Vec<Conflict>,
    /// Target identifier → projected record, in order of first claim.
    pub dataset: IndexMap<String, DisplayRecord>,
    #[serde(serialize_with = "serialize_by_name")]
    pub unmatched: Vec<EntityRecord>,
    pub unused: Vec<CatalogEntry>,
    pub skipped: Vec<SkippedRecord>,
}

/// Entity records as `{ name: record }`, in list order.
pub fn serialize_by_name<S: serde::Serializer>(
    records: &[EntityRecord],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(records.iter().map(|r| (&r.name, r)))
}
