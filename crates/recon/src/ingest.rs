//! Parse the JSON input collections into engine records.
//!
//! Inputs arrive as strings; the caller does the file IO. A document that
//! is not valid JSON or not an object is fatal. A single record that is
//! malformed is skipped and reported, and the rest of the collection loads.

use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ReconError;
use crate::model::{Attributes, CatalogEntry, EntityRecord, ReconInput, SkippedRecord, UNKNOWN, UNKNOWN_ACQUISITION};
use crate::overrides::Overrides;

/// Alias-file entry meaning "no alias known".
pub const ALIAS_PLACEHOLDER: &str = "---";

// ---------------------------------------------------------------------------
// Raw shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn unknown_acquisition() -> String {
    UNKNOWN_ACQUISITION.to_string()
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(rename = "稀有度", alias = "rarity", default = "unknown")]
    rarity: String,
    #[serde(rename = "职阶", alias = "class", default = "unknown")]
    class: String,
    #[serde(rename = "宝具色卡", alias = "np_card", default = "unknown")]
    np_card: String,
    #[serde(rename = "宝具类型", alias = "np_type", default = "unknown")]
    np_type: String,
    #[serde(rename = "获取途径", alias = "acquisition", default = "unknown_acquisition")]
    acquisition: String,
    #[serde(rename = "别名", alias = "aliases", default)]
    aliases: Vec<String>,
    #[serde(rename = "图片URL", alias = "image_url", default)]
    image_url: Option<String>,
}

impl RawEntity {
    fn into_record(self, name: &str) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            wiki_id: self.id.map(RawId::into_string),
            attributes: Attributes {
                rarity: self.rarity,
                class: self.class,
                np_card: self.np_card,
                np_type: self.np_type,
                acquisition: self.acquisition,
            },
            aliases: self.aliases,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAliasEntry {
    #[serde(default)]
    aliases: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

fn parse_object(input: &str, json: &str) -> Result<Map<String, Value>, ReconError> {
    let json = json.trim_start_matches('\u{feff}');
    let value: Value = serde_json::from_str(json).map_err(|e| ReconError::InputParse {
        input: input.to_string(),
        message: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ReconError::InputParse {
            input: input.to_string(),
            message: format!("top level must be an object, got {}", kind_of(&other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn skip(skipped: &mut Vec<SkippedRecord>, input: &str, name: &str, reason: String) {
    warn!("{input}: skipping '{name}': {reason}");
    skipped.push(SkippedRecord {
        name: name.to_string(),
        reason: format!("{input}: {reason}"),
    });
}

/// `{ name: { "id", "稀有度", ..., "别名": [..] } }`, in document order.
pub fn parse_entities(json: &str) -> Result<(Vec<EntityRecord>, Vec<SkippedRecord>), ReconError> {
    let map = parse_object("entities", json)?;
    let mut records = Vec::with_capacity(map.len());
    let mut skipped = Vec::new();

    for (name, value) in map {
        if name.trim().is_empty() {
            skip(&mut skipped, "entities", &name, "empty name".into());
            continue;
        }
        match serde_json::from_value::<RawEntity>(value) {
            Ok(raw) => records.push(raw.into_record(&name)),
            Err(e) => skip(&mut skipped, "entities", &name, e.to_string()),
        }
    }
    Ok((records, skipped))
}

/// `{ name: id }` with a string or numeric id, in document order.
pub fn parse_catalog(json: &str) -> Result<(Vec<CatalogEntry>, Vec<SkippedRecord>), ReconError> {
    let map = parse_object("catalog", json)?;
    let mut entries = Vec::with_capacity(map.len());
    let mut skipped = Vec::new();

    for (name, value) in map {
        if name.trim().is_empty() {
            skip(&mut skipped, "catalog", &name, "empty name".into());
            continue;
        }
        match serde_json::from_value::<RawId>(value) {
            Ok(id) => entries.push(CatalogEntry::new(name, id.into_string())),
            Err(_) => skip(&mut skipped, "catalog", &name, "id must be a string or a number".into()),
        }
    }
    Ok((entries, skipped))
}

/// `{ canonical_name: { "aliases": [..] } }`. Placeholder aliases are dropped.
pub fn parse_alias_table(
    json: &str,
) -> Result<(Vec<(String, Vec<String>)>, Vec<SkippedRecord>), ReconError> {
    let map = parse_object("aliases", json)?;
    let mut table = Vec::with_capacity(map.len());
    let mut skipped = Vec::new();

    for (name, value) in map {
        match serde_json::from_value::<RawAliasEntry>(value) {
            Ok(entry) => {
                let aliases: Vec<String> = entry
                    .aliases
                    .into_iter()
                    .filter(|a| a.trim() != ALIAS_PLACEHOLDER && !a.trim().is_empty())
                    .collect();
                if !aliases.is_empty() {
                    table.push((name, aliases));
                }
            }
            Err(e) => skip(&mut skipped, "aliases", &name, e.to_string()),
        }
    }
    Ok((table, skipped))
}

// ---------------------------------------------------------------------------
// Alias enrichment
// ---------------------------------------------------------------------------

/// Clean and extend an entity's alias list in place.
///
/// Drops aliases equal to the primary name and duplicates, then appends
/// separator variants of the name (`·` → space, spaces removed), the parts
/// of a `的`/`之` compound longer than one char, and curated nicknames.
pub fn enrich_aliases(entity: &mut EntityRecord, overrides: &Overrides) {
    let name = entity.name.clone();
    let mut aliases: Vec<String> = Vec::with_capacity(entity.aliases.len());
    let push = |alias: String, aliases: &mut Vec<String>| {
        if alias != name && !alias.is_empty() && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    };

    for alias in std::mem::take(&mut entity.aliases) {
        push(alias, &mut aliases);
    }

    push(name.replace(['·', '・'], " "), &mut aliases);
    push(name.replace(' ', ""), &mut aliases);

    let parts: Vec<&str> = name.split(['的', '之']).collect();
    if parts.len() > 1 {
        for part in parts {
            if part.chars().count() > 1 {
                push(part.to_string(), &mut aliases);
            }
        }
    }

    for nick in overrides.nicknames_for(&name) {
        push(nick.clone(), &mut aliases);
    }

    entity.aliases = aliases;
}

/// Parse all three documents and enrich entity aliases.
pub fn load_input(
    entities_json: &str,
    catalog_json: &str,
    aliases_json: Option<&str>,
    overrides: &Overrides,
) -> Result<ReconInput, ReconError> {
    let (mut entities, mut skipped) = parse_entities(entities_json)?;
    let (catalog, catalog_skipped) = parse_catalog(catalog_json)?;
    skipped.extend(catalog_skipped);

    let alias_table = match aliases_json {
        Some(json) => {
            let (table, alias_skipped) = parse_alias_table(json)?;
            skipped.extend(alias_skipped);
            table
        }
        None => Vec::new(),
    };

    for entity in &mut entities {
        enrich_aliases(entity, overrides);
    }

    Ok(ReconInput {
        entities,
        catalog,
        alias_table,
        skipped,
    })
}
