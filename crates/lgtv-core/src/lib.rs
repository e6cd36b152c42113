//! # lgtv-core
//!
//! Shared library for the LG TV remote containing the command vocabulary,
//! the error taxonomy, and the app-name resolver.
//!
//! This crate has zero dependencies on sockets, async runtimes, or UI
//! frameworks.  Everything that talks to a television lives in
//! `lgtv-remote`; this crate only describes *what* can be asked of one.
//!
//! # Architecture overview (for beginners)
//!
//! The remote lets a synchronous front end (a CLI, a GUI button handler)
//! drive a smart TV whose client library is asynchronous.  Every request a
//! user can make is a [`Command`] value.  Commands are executed one at a
//! time against a single live session, and each produces an [`Outcome`] or
//! a [`RemoteError`].
//!
//! - **`domain`** – Commands, buttons, catalog entries, and the session
//!   snapshot that callers may observe.
//!
//! - **`error`** – The failure taxonomy shared by every layer: not
//!   connected, pairing required, device failure, timeout, unresolvable app.
//!
//! - **`resolver`** – Turns a human app name such as `"Netflix"` into the
//!   device identifiers worth trying, first by matching the TV's live app
//!   catalog and then by falling back to a built-in alias table.

pub mod domain;
pub mod error;
pub mod resolver;

// Re-export the most-used types at the crate root so callers can write
// `lgtv_core::Command` instead of `lgtv_core::domain::command::Command`.
pub use domain::catalog::AppCatalogEntry;
pub use domain::command::{Button, Command, Outcome, ParseButtonError};
pub use domain::session::{ConnectionState, SessionSnapshot};
pub use error::{LaunchAttempt, RemoteError};
pub use resolver::{resolve, AliasTable, Resolution, ResolutionTier};
