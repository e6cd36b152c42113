//! Integration tests for app-name resolution through the public crate API.
//!
//! # Purpose
//!
//! These tests pin the observable contract the session controller relies on:
//!
//! - A catalog match always yields exactly one candidate and short-circuits.
//! - The alias fallback yields the full identifier list, untruncated and in
//!   table order.
//! - A name known to neither tier yields no candidates at all, which the
//!   controller reports as "could not find app" without touching the TV.

use lgtv_core::{resolve, AliasTable, AppCatalogEntry, Resolution, ResolutionTier};

/// A catalog as a typical webOS TV reports it: system apps mixed with
/// streaming apps, in launcher order.
fn living_room_catalog() -> Vec<AppCatalogEntry> {
    vec![
        AppCatalogEntry::new("com.webos.app.livetv", "Live TV"),
        AppCatalogEntry::new("com.webos.app.browser", "Web Browser"),
        AppCatalogEntry::new("netflix", "Netflix"),
        AppCatalogEntry::new("youtube.leanback.v4", "YouTube"),
        AppCatalogEntry::new("amazon", "Amazon Prime Video"),
        AppCatalogEntry::new("com.disney.disneyplus-prod", "Disney+"),
    ]
}

#[test]
fn test_every_builtin_alias_resolves_without_catalog() {
    let aliases = AliasTable::builtin();

    for name in aliases.names() {
        let res = resolve(name, None, &aliases);
        assert_eq!(res.tier(), Some(ResolutionTier::Alias), "alias {name}");
        assert_eq!(
            res.candidates(),
            aliases
                .get(name)
                .unwrap()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_quick_launch_names_hit_catalog_when_installed() {
    // Arrange
    let catalog = living_room_catalog();
    let aliases = AliasTable::builtin();

    // Act / Assert: each installed app resolves to its catalog id.
    let cases = [
        ("Netflix", "netflix"),
        ("YouTube", "youtube.leanback.v4"),
        ("Prime Video", "amazon"),
        ("Disney+", "com.disney.disneyplus-prod"),
    ];
    for (name, id) in cases {
        let res = resolve(name, Some(catalog.as_slice()), &aliases);
        assert_eq!(res.candidates(), vec![id], "resolving {name}");
        assert_eq!(res.tier(), Some(ResolutionTier::Catalog));
    }
}

#[test]
fn test_uninstalled_app_falls_back_to_alias_list() {
    let catalog = living_room_catalog();
    let res = resolve("ESPN", Some(catalog.as_slice()), &AliasTable::builtin());
    assert_eq!(
        res,
        Resolution::Alias(vec![
            "espn".to_string(),
            "com.espn.webostv".to_string(),
            "com.espn.app".to_string(),
        ])
    );
}

#[test]
fn test_unknown_app_yields_no_candidates() {
    let catalog = living_room_catalog();
    let res = resolve(
        "Unknown Streaming App",
        Some(catalog.as_slice()),
        &AliasTable::builtin(),
    );
    assert_eq!(res, Resolution::Unresolvable);
    assert!(res.candidates().is_empty());
}

#[test]
fn test_custom_alias_table_is_honoured() {
    let aliases = AliasTable::from_entries([("Crunchyroll", ["crunchyroll", "com.crunchyroll"])]);
    let res = resolve("Crunchyroll", None, &aliases);
    assert_eq!(res.candidates(), vec!["crunchyroll", "com.crunchyroll"]);
}
