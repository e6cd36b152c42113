//! Installed-application catalog entries.

use serde::{Deserialize, Serialize};

/// One application installed on the TV, as reported by a catalog listing.
///
/// Entries are transient: they are fetched from the device on demand,
/// treated as an immutable snapshot for one resolution, and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppCatalogEntry {
    /// Device-specific identifier passed to the launch request
    /// (e.g. `"youtube.leanback.v4"`).
    pub id: String,
    /// Human-readable title shown on the TV's launcher (e.g. `"YouTube"`).
    pub title: String,
}

impl AppCatalogEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
