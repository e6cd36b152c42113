//! App-name resolution: human name in, device identifiers out.
//!
//! # Two tiers (for beginners)
//!
//! TV apps have opaque identifiers (`"youtube.leanback.v4"`,
//! `"com.disney.disneyplus-prod"`) that differ between firmware versions and
//! regions.  Users only know names.  Resolution therefore works in two tiers:
//!
//! 1. **Catalog** – when the TV's live app list is available, look for an
//!    installed app whose title and the requested name contain one another.
//!    The first match wins and yields exactly one identifier.
//! 2. **Alias** – otherwise look the name up in a static [`AliasTable`] of
//!    identifiers known to have been used for that app.  All of them are
//!    returned, in order, for the caller to try one after another.
//!
//! Resolution is a pure function: it performs no I/O and does not decide how
//! many candidates to try or how long to wait between them.  That policy
//! belongs to the session controller.

pub mod alias;
pub mod resolve;

pub use alias::AliasTable;
pub use resolve::{resolve, Resolution, ResolutionTier};
