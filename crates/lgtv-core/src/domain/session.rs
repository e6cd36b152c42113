//! Session lifecycle state and the snapshot exposed to callers.
//!
//! # Connection lifecycle (for beginners)
//!
//! ```text
//! Disconnected ──► Connecting ──► Connected
//!       ▲              │              │
//!       │              ▼              │
//!       │           Failed ───────────┤ (connect again)
//!       └───────── disconnect ◄───────┘
//! ```
//!
//! Only the worker that owns the session ever changes this state.  Everyone
//! else sees a [`SessionSnapshot`] copied out through the command queue, so a
//! snapshot may already be stale by the time the caller reads it.

use serde::{Deserialize, Serialize};

/// Connection state of the single live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection has been attempted, or the session was closed.
    #[default]
    Disconnected,
    /// A connect attempt is in progress (possibly waiting on a pairing prompt).
    Connecting,
    /// The device accepted the connection; commands may be issued.
    Connected,
    /// The most recent connect attempt failed.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Point-in-time copy of the session's observable fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Address of the TV the session targets, once a connect was attempted.
    pub endpoint_address: Option<String>,
    /// Pairing key issued by the TV, if one is held.
    pub pairing_key: Option<String>,
    /// Current connection state.
    pub connection_state: ConnectionState,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
