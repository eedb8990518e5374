//! Name normalization and script helpers.
//!
//! Pipeline (see [`Normalizer::normalize`]):
//! 1. Unify the katakana middle dot `・` into `·`
//! 2. Drop round-bracket qualifiers, ASCII or full-width: `(Saber)`, `（Alter）`
//! 3. Drop variant tags in tortoise-shell brackets: `〔Lily〕`
//! 4. Keep only the part before the first `/`
//! 5. Apply the ordered spelling table
//! 6. Trim

use std::sync::LazyLock;

use regex::Regex;

use crate::overrides::Overrides;

/// Katakana middle dot, used by Japanese-sourced names.
pub const FOREIGN_DOT: char = '\u{30FB}';

/// Middle dot used by the Chinese-language sources.
pub const NATIVE_DOT: char = '\u{00B7}';

static RE_PAREN_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[（(].*?[）)]").expect("Invalid regex"));

static RE_VARIANT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"〔.*?〕").expect("Invalid regex"));

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::default);

/// Normalize with the built-in spelling table.
pub fn normalize(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(raw)
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    spelling: Vec<(String, String)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_overrides(&Overrides::default())
    }
}

impl Normalizer {
    pub fn new(spelling: Vec<(String, String)>) -> Self {
        Self { spelling }
    }

    pub fn from_overrides(overrides: &Overrides) -> Self {
        Self::new(overrides.spelling.clone())
    }

    /// Canonical form of a raw name. Total and idempotent for closed
    /// spelling tables (see [`Overrides::validate`]).
    pub fn normalize(&self, raw: &str) -> String {
        let unified = unify_dots(raw);
        let no_paren = RE_PAREN_QUALIFIER.replace_all(&unified, "");
        let no_tag = RE_VARIANT_TAG.replace_all(&no_paren, "");
        let primary = no_tag.split('/').next().unwrap_or("");

        let mut name = primary.to_string();
        for (from, to) in &self.spelling {
            if name.contains(from.as_str()) {
                name = name.replace(from.as_str(), to);
            }
        }

        name.trim().to_string()
    }
}

pub fn unify_dots(raw: &str) -> String {
    raw.replace(FOREIGN_DOT, &NATIVE_DOT.to_string())
}

/// CJK unified ideographs plus hiragana/katakana.
pub fn is_native_script(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c) || ('\u{3040}'..='\u{30FF}').contains(&c)
}

/// Latin-range letters and digits.
pub fn is_foreign_script(c: char) -> bool {
    c.is_alphanumeric() && (c as u32) < 0x3040
}

pub fn native_projection(name: &str) -> String {
    name.chars().filter(|c| is_native_script(*c)).collect()
}

pub fn foreign_projection(name: &str) -> String {
    name.chars().filter(|c| is_foreign_script(*c)).collect()
}

/// Remove every whitespace character, including the ideographic space.
pub fn collapse_whitespace(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn has_latin_letter(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_alphabetic())
}
