//! The failure taxonomy shared by every layer of the remote.
//!
//! # Propagation rules (for beginners)
//!
//! | Variant          | Where it starts              | Retried?                      |
//! |------------------|------------------------------|-------------------------------|
//! | `NotConnected`   | local precondition check     | never                         |
//! | `MissingAddress` | blank TV address             | never                         |
//! | `AuthRequired`   | TV refused the pairing key   | never (user must re-pair)     |
//! | `Device`         | device client I/O/protocol   | next candidate during launch  |
//! | `TimedOut`       | caller's wait on the bridge  | by the caller, not per launch |
//! | `Unresolvable`   | resolver found no candidates | never                         |
//! | `BridgeClosed`   | command worker has stopped   | never                         |
//! | `LaunchFailed`   | every launch candidate erred | never                         |
//!
//! No variant is ever allowed to stop the worker: a failing command is turned
//! into one of these values and delivered to whoever submitted it.

use std::time::Duration;

use thiserror::Error;

/// One failed launch attempt recorded while walking a candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchAttempt {
    /// The candidate identifier that was tried.
    pub app_id: String,
    /// Display form of the error the attempt produced.
    pub error: String,
}

/// Errors surfaced to callers of the remote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// A device operation was attempted before a session was connected.
    /// Detected locally; no request reaches the TV.
    #[error("not connected to a TV")]
    NotConnected,

    /// No TV address was given, or it was only whitespace.  Detected
    /// locally; nothing is submitted.
    #[error("no TV address given; enter the TV's IP address")]
    MissingAddress,

    /// The TV refused the stored pairing key and is asking for a new pairing.
    #[error("the TV rejected the stored pairing key; pair again to continue")]
    AuthRequired,

    /// Transport or protocol failure reported by the device client.
    #[error("device error: {0}")]
    Device(String),

    /// The caller stopped waiting.  The command may still complete on the
    /// worker afterwards.
    #[error("timed out after {0:?} waiting for the TV")]
    TimedOut(Duration),

    /// The resolver produced no candidate identifiers for this app name.
    #[error("could not find app '{0}'")]
    Unresolvable(String),

    /// The command worker has shut down and accepts no more work.
    #[error("command bridge is closed")]
    BridgeClosed,

    /// Every candidate identifier for an app failed to launch.
    #[error("could not launch '{app}': all {} candidate id(s) failed", attempts.len())]
    LaunchFailed {
        app: String,
        attempts: Vec<LaunchAttempt>,
    },
}

impl RemoteError {
    /// Returns `true` when a launch loop must stop instead of trying the
    /// next candidate.
    ///
    /// `Device` is the only per-attempt failure.  `TimedOut` is terminal: the
    /// abandoned command is still queued on the worker and may yet succeed,
    /// so submitting another candidate could launch a second app.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteError::Device(_))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
