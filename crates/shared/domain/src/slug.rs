//! Slug derivation and duplicate resolution for store names.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::{DomainError, DomainResult};

static APOSTROPHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"['\u{2019}]").expect("apostrophe pattern is valid"));

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("separator pattern is valid"));

/// Derive a URL-safe slug from a display name.
///
/// Apostrophes vanish ("Javi's" -> "javis"), every other run of non
/// alphanumeric characters collapses into a single dash.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let without_apostrophes = APOSTROPHES.replace_all(&lowered, "");
    NON_ALPHANUMERIC
        .replace_all(&without_apostrophes, "-")
        .trim_matches('-')
        .to_string()
}

/// Case-insensitive matcher for `base` and its numbered variants (`base-2`, ...).
pub fn slug_family(base: &str) -> Regex {
    RegexBuilder::new(&format!(r"^({})(-[0-9]*)?$", regex::escape(base)))
        .case_insensitive(true)
        .build()
        .expect("escaped slug pattern is valid")
}

/// Pick the slug for a store given how many existing slugs share its base.
pub fn disambiguate(base: &str, existing_matches: usize) -> String {
    if existing_matches == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, existing_matches + 1)
    }
}

/// Compute a collision-free slug for `name` against candidate slugs already stored.
///
/// `candidates` may contain unrelated slugs; only members of the base's family count.
pub fn unique_slug<S: AsRef<str>>(name: &str, candidates: &[S]) -> DomainResult<String> {
    let base = slugify(name);
    if base.is_empty() {
        return Err(DomainError::validation(
            "Store name must contain at least one letter or digit",
        ));
    }

    let family = slug_family(&base);
    let matches = candidates
        .iter()
        .filter(|slug| family.is_match(slug.as_ref()))
        .count();

    Ok(disambiguate(&base, matches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_strips_apostrophes_and_punctuation() {
        assert_eq!(slugify("Javi's Coffee"), "javis-coffee");
        assert_eq!(slugify("  Wes & Co. -- Bakery!  "), "wes-co-bakery");
        assert_eq!(slugify("Café Olé"), "caf-ol");
    }

    #[test]
    fn test_slugify_empty_for_symbols_only() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slug_family_matches_numbered_variants_only() {
        let family = slug_family("wes");
        assert!(family.is_match("wes"));
        assert!(family.is_match("WES-2"));
        assert!(family.is_match("wes-15"));
        assert!(!family.is_match("wes-coffee"));
        assert!(!family.is_match("wesley"));
    }

    #[test]
    fn test_slug_family_escapes_base() {
        let family = slug_family("a.b");
        assert!(family.is_match("a.b"));
        assert!(!family.is_match("axb"));
    }

    #[test]
    fn test_unique_slug_first_store_keeps_base() {
        let existing: Vec<String> = vec![];
        assert_eq!(unique_slug("Javi's Coffee", &existing).unwrap(), "javis-coffee");
    }

    #[test]
    fn test_unique_slug_same_name_gets_suffixes() {
        let mut existing: Vec<String> = vec![];
        let mut produced = vec![];
        for _ in 0..3 {
            let slug = unique_slug("Javi's Coffee", &existing).unwrap();
            existing.push(slug.clone());
            produced.push(slug);
        }
        assert_eq!(produced, vec!["javis-coffee", "javis-coffee-2", "javis-coffee-3"]);
    }

    #[test]
    fn test_unique_slug_ignores_unrelated_candidates() {
        let existing = ["javis-coffee-house", "coffee"];
        assert_eq!(unique_slug("Javi's Coffee", &existing).unwrap(), "javis-coffee");
    }

    #[test]
    fn test_unique_slug_counts_members_not_gaps() {
        // After `wes` is renamed away only `wes-2` remains; the count rule yields `wes-2` again.
        let existing = ["wes-2"];
        assert_eq!(unique_slug("Wes", &existing).unwrap(), "wes-2");
    }

    #[test]
    fn test_unique_slug_rejects_unsluggable_name() {
        let existing: [&str; 0] = [];
        assert!(matches!(
            unique_slug("???", &existing),
            Err(DomainError::Validation(_))
        ));
    }
}
