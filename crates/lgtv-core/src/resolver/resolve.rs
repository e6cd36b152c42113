//! The resolution algorithm.

use tracing::{debug, trace};

use super::alias::AliasTable;
use crate::domain::catalog::AppCatalogEntry;

/// Which tier produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// Matched against the TV's live catalog.
    Catalog,
    /// Taken from the static alias table.
    Alias,
}

/// The candidates worth trying for one requested app name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A catalog entry matched.  Its id is the only candidate and is tried once.
    Catalog { id: String, title: String },
    /// No catalog match; the alias table supplied these ids, in order.
    Alias(Vec<String>),
    /// Nothing to try.
    Unresolvable,
}

impl Resolution {
    /// Ordered candidate identifiers (empty when unresolvable).
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            Resolution::Catalog { id, .. } => vec![id.as_str()],
            Resolution::Alias(ids) => ids.iter().map(String::as_str).collect(),
            Resolution::Unresolvable => Vec::new(),
        }
    }

    pub fn tier(&self) -> Option<ResolutionTier> {
        match self {
            Resolution::Catalog { .. } => Some(ResolutionTier::Catalog),
            Resolution::Alias(_) => Some(ResolutionTier::Alias),
            Resolution::Unresolvable => None,
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Resolution::Unresolvable)
    }
}

/// Resolves `requested` to candidate identifiers.
///
/// With a catalog, every entry is scanned once in catalog order; an entry
/// matches when, after lower-casing both sides, the requested name contains
/// the title or the title contains the requested name.  The first match
/// short-circuits.  Entries with an empty title never match.
///
/// Without a catalog match, `requested` is looked up verbatim in `aliases`.
/// A blank request resolves to nothing.
pub fn resolve(
    requested: &str,
    catalog: Option<&[AppCatalogEntry]>,
    aliases: &AliasTable,
) -> Resolution {
    if requested.trim().is_empty() {
        return Resolution::Unresolvable;
    }

    if let Some(entries) = catalog {
        let wanted = requested.to_lowercase();
        for entry in entries {
            let title = entry.title.to_lowercase();
            if title.is_empty() {
                continue;
            }
            if title.contains(&wanted) || wanted.contains(&title) {
                debug!(
                    "resolved '{requested}' via catalog: '{}' -> {}",
                    entry.title, entry.id
                );
                return Resolution::Catalog {
                    id: entry.id.clone(),
                    title: entry.title.clone(),
                };
            }
            trace!("catalog entry '{}' does not match '{requested}'", entry.title);
        }
    }

    match aliases.get(requested) {
        Some(ids) if !ids.is_empty() => {
            debug!("resolved '{requested}' via alias table: {ids:?}");
            Resolution::Alias(ids.to_vec())
        }
        _ => {
            debug!("'{requested}' is unresolvable");
            Resolution::Unresolvable
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(entries: &[(&str, &str)]) -> Vec<AppCatalogEntry> {
        entries
            .iter()
            .map(|(id, title)| AppCatalogEntry::new(*id, *title))
            .collect()
    }

    #[test]
    fn test_exact_title_match_returns_catalog_id() {
        // Arrange
        let apps = catalog(&[("youtube.leanback.v4", "YouTube")]);

        // Act
        let res = resolve("YouTube", Some(apps.as_slice()), &AliasTable::builtin());

        // Assert
        assert_eq!(res.candidates(), vec!["youtube.leanback.v4"]);
        assert_eq!(res.tier(), Some(ResolutionTier::Catalog));
    }

    #[test]
    fn test_request_contained_in_title_matches() {
        let apps = catalog(&[("x", "Amazon Prime Video")]);
        let res = resolve("Prime Video", Some(apps.as_slice()), &AliasTable::new());
        assert_eq!(res.candidates(), vec!["x"]);
    }

    #[test]
    fn test_title_contained_in_request_matches() {
        let apps = catalog(&[("netflix", "Netflix")]);
        let res = resolve("Netflix Kids Profile", Some(apps.as_slice()), &AliasTable::new());
        assert_eq!(res.candidates(), vec!["netflix"]);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let apps = catalog(&[("hulu", "HULU")]);
        let res = resolve("hulu", Some(apps.as_slice()), &AliasTable::new());
        assert_eq!(res.candidates(), vec!["hulu"]);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        // Both titles contain "tv"; catalog order decides.
        let apps = catalog(&[("live", "Live TV"), ("apple", "Apple TV")]);
        let res = resolve("TV", Some(apps.as_slice()), &AliasTable::new());
        assert_eq!(
            res,
            Resolution::Catalog {
                id: "live".into(),
                title: "Live TV".into()
            }
        );
    }

    #[test]
    fn test_catalog_match_takes_precedence_over_alias() {
        let apps = catalog(&[("espn.v2", "ESPN")]);
        let res = resolve("ESPN", Some(apps.as_slice()), &AliasTable::builtin());
        assert_eq!(res.candidates(), vec!["espn.v2"]);
    }

    #[test]
    fn test_no_catalog_falls_back_to_full_alias_list() {
        let res = resolve("ESPN", None, &AliasTable::builtin());
        assert_eq!(
            res.candidates(),
            vec!["espn", "com.espn.webostv", "com.espn.app"]
        );
        assert_eq!(res.tier(), Some(ResolutionTier::Alias));
    }

    #[test]
    fn test_empty_catalog_falls_back_to_alias() {
        let res = resolve("Hulu", Some(&[][..]), &AliasTable::builtin());
        assert_eq!(res, Resolution::Alias(vec!["hulu".into()]));
    }

    #[test]
    fn test_catalog_miss_falls_back_to_alias() {
        let apps = catalog(&[("netflix", "Netflix")]);
        let res = resolve("Peacock", Some(apps.as_slice()), &AliasTable::builtin());
        assert_eq!(res.candidates().len(), 3);
        assert_eq!(res.candidates()[0], "com.peacocktv.peacocktv");
    }

    #[test]
    fn test_alias_tier_is_exact_match_only() {
        let res = resolve("espn", None, &AliasTable::builtin());
        assert!(res.is_unresolvable());
    }

    #[test]
    fn test_unknown_app_is_unresolvable() {
        let apps = catalog(&[("netflix", "Netflix")]);
        let res = resolve("Unknown Streaming App", Some(apps.as_slice()), &AliasTable::builtin());
        assert!(res.is_unresolvable());
        assert!(res.candidates().is_empty());
        assert_eq!(res.tier(), None);
    }

    #[test]
    fn test_blank_request_is_unresolvable_even_with_catalog() {
        let apps = catalog(&[("netflix", "Netflix")]);
        assert!(resolve("", Some(apps.as_slice()), &AliasTable::builtin()).is_unresolvable());
        assert!(resolve("   ", Some(apps.as_slice()), &AliasTable::builtin()).is_unresolvable());
    }

    #[test]
    fn test_empty_title_never_matches() {
        let apps = catalog(&[("ghost", ""), ("hulu", "Hulu")]);
        let res = resolve("Hulu", Some(apps.as_slice()), &AliasTable::new());
        assert_eq!(res.candidates(), vec!["hulu"]);
    }

    #[test]
    fn test_alias_with_no_ids_is_unresolvable() {
        let table = AliasTable::from_entries([("Empty", Vec::<String>::new())]);
        assert!(resolve("Empty", None, &table).is_unresolvable());
    }
}
