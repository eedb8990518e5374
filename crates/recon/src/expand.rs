//! Variant expansion for source entities and catalog entries.

use crate::normalize::{
    collapse_whitespace, foreign_projection, is_foreign_script, is_native_script,
    native_projection, Normalizer,
};

/// Ordered, deduplicated set of name variants. Never contains "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSet {
    variants: Vec<String>,
}

impl VariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless empty or already present. Returns true if added.
    pub fn insert(&mut self, variant: impl Into<String>) -> bool {
        let variant = variant.into();
        if variant.is_empty() || self.variants.contains(&variant) {
            return false;
        }
        self.variants.push(variant);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(String::as_str)
    }

    /// Variants of at least `min_len` chars, for the containment and
    /// similarity stages.
    pub fn long(&self, min_len: usize) -> impl Iterator<Item = &str> {
        self.iter().filter(move |v| char_len(v) >= min_len)
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.variants
    }
}

impl<'a> IntoIterator for &'a VariantSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.variants.iter()
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// All variants worth trying for a source entity.
///
/// Order: primary, aliases, script decomposition, native-only projection,
/// whitespace-collapsed primary.
pub fn expand<S: AsRef<str>>(normalizer: &Normalizer, primary: &str, aliases: &[S]) -> VariantSet {
    let mut set = VariantSet::new();
    let name = normalizer.normalize(primary);
    set.insert(name.clone());

    for alias in aliases {
        set.insert(normalizer.normalize(alias.as_ref()));
    }

    if let Some((native, foreign)) = split_mixed_script(&name) {
        set.insert(native);
        set.insert(foreign);
    }

    set.insert(native_projection(&name));
    set.insert(collapse_whitespace(&name));
    set
}

/// Variants of a catalog entry name: normalized and whitespace-collapsed.
///
/// No script decomposition on this side: a decomposed catalog name would
/// exact-match bare native names before the curated special-case table
/// gets a chance to map them.
pub fn expand_target(normalizer: &Normalizer, name: &str) -> VariantSet {
    let mut set = VariantSet::new();
    let normalized = normalizer.normalize(name);
    let collapsed = collapse_whitespace(&normalized);
    set.insert(normalized);
    set.insert(collapsed);
    set
}

/// Split a name like `阿育王AshokaAshoka` into its native and Latin runs.
///
/// Returns `None` unless both runs are non-empty and together cover at
/// least 80% of the name's letters and digits.
pub fn split_mixed_script(name: &str) -> Option<(String, String)> {
    let significant = name.chars().filter(|c| c.is_alphanumeric()).count();
    let native = native_projection(name);
    let foreign = foreign_projection(name);
    if native.is_empty() || foreign.is_empty() {
        return None;
    }

    let covered = name
        .chars()
        .filter(|c| is_native_script(*c) || is_foreign_script(*c))
        .count();
    if covered * 5 < significant * 4 {
        return None;
    }
    Some((native, foreign))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> Normalizer {
        Normalizer::default()
    }

    #[test]
    fn primary_first_then_aliases() {
        let set = expand(&n(), "阿尔托莉雅·潘德拉贡（Alter）", &["黑呆", "黑saber"]);
        let v: Vec<&str> = set.iter().collect();
        assert_eq!(v[0], "阿尔托莉雅·潘德拉贡");
        assert_eq!(v[1], "黑呆");
        assert_eq!(v[2], "黑saber");
        assert!(set.contains("阿尔托莉雅潘德拉贡"));
    }

    #[test]
    fn duplicate_aliases_collapse() {
        let set = expand(&n(), "贞德", &["村姑", "村姑", "贞德", ""]);
        assert_eq!(set.as_slice(), ["贞德", "村姑"]);
    }

    #[test]
    fn mixed_script_name_is_split() {
        let set = expand(&n(), "图坦卡蒙Tutankhamun", &[] as &[&str]);
        assert!(set.contains("图坦卡蒙Tutankhamun"));
        assert!(set.contains("图坦卡蒙"));
        assert!(set.contains("Tutankhamun"));
    }

    #[test]
    fn split_requires_both_runs() {
        assert_eq!(split_mixed_script("玉藻前"), None);
        assert_eq!(split_mixed_script("BB"), None);
        assert_eq!(
            split_mixed_script("阿育王AshokaAshoka"),
            Some(("阿育王".into(), "AshokaAshoka".into()))
        );
    }

    #[test]
    fn split_requires_coverage() {
        // Hangul is neither native nor Latin for this purpose.
        assert_eq!(split_mixed_script("가나다라마A阿"), None);
    }

    #[test]
    fn whitespace_collapsed_variant() {
        let set = expand(&n(), "基督山伯爵 爱德蒙·唐泰斯", &[] as &[&str]);
        assert!(set.contains("基督山伯爵爱德蒙·唐泰斯"));
    }

    #[test]
    fn target_side_has_no_script_split() {
        let set = expand_target(&n(), "阿育王AshokaAshoka");
        assert_eq!(set.as_slice(), ["阿育王AshokaAshoka"]);
    }

    #[test]
    fn target_side_normalizes() {
        let set = expand_target(&n(), "基督山伯爵 爱德蒙・唐泰斯（Avenger）");
        assert_eq!(
            set.as_slice(),
            ["基督山伯爵 爱德蒙·唐泰斯", "基督山伯爵爱德蒙·唐泰斯"]
        );
    }

    #[test]
    fn long_filters_short_variants() {
        let set = expand(&n(), "BB", &["B"]);
        let long: Vec<&str> = set.long(2).collect();
        assert_eq!(long, ["BB"]);
        assert!(set.contains("B"));
    }
}
