//! Static fallback table: canonical app name → known identifiers.

/// Built-in aliases, in the order their identifiers should be attempted.
const BUILTIN: &[(&str, &[&str])] = &[
    ("Netflix", &["netflix"]),
    ("YouTube", &["youtube.leanback.v4", "youtube"]),
    ("Prime Video", &["amazon", "primevideo"]),
    ("Disney+", &["com.disney.disneyplus-prod", "disney"]),
    ("Hulu", &["hulu"]),
    ("Apple TV", &["com.apple.appletv", "appletv"]),
    ("HBO Max", &["com.hbo.hbonow", "hbomax", "com.hbo.max"]),
    (
        "Peacock",
        &["com.peacocktv.peacocktv", "peacock", "com.peacocktv"],
    ),
    ("ESPN", &["espn", "com.espn.webostv", "com.espn.app"]),
    (
        "Food Network",
        &["com.scripts.foodnetwork", "foodnetwork", "com.foodnetwork"],
    ),
    ("Paramount+", &["com.cbs.app", "paramountplus", "com.paramount"]),
];

/// Read-only mapping from a canonical app name to an ordered list of
/// candidate device identifiers.
///
/// Lookup is an exact match on the canonical name.  Insertion order of names
/// is preserved so front ends can list them in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, Vec<String>)>,
}

impl AliasTable {
    /// An empty table; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the remote, covering the quick-launch apps.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN
                .iter()
                .map(|(name, ids)| (*name, ids.iter().copied())),
        )
    }

    /// Builds a table from `(name, ids)` pairs.  A repeated name replaces
    /// the earlier entry's identifiers but keeps its position.
    pub fn from_entries<N, I, S>(entries: impl IntoIterator<Item = (N, I)>) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, ids) in entries {
            table.insert(name, ids);
        }
        table
    }

    /// Adds or replaces the identifiers for `name`.
    pub fn insert<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        ids: impl IntoIterator<Item = S>,
    ) {
        let name = name.into();
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = ids,
            None => self.entries.push((name, ids)),
        }
    }

    /// Returns the candidate identifiers for the exact canonical `name`.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ids)| ids.as_slice())
    }

    /// Canonical names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
