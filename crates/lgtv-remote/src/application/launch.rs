//! Launch policy: walk an ordered candidate list until the TV accepts one.
//!
//! The alias table may list several identifiers for one app because vendors
//! rename their apps between firmware releases.  [`attempt_in_order`] tries
//! them one at a time:
//!
//! - It stops at the first candidate whose launch request returns `Ok`.
//!   `Ok` means the TV *accepted* the request, not that the app started.
//! - A per-candidate device error is recorded and logged, then the next
//!   candidate is tried after a short pause.
//! - Any other error ends the loop immediately and is returned as is.  For
//!   `NotConnected` or `BridgeClosed` no other candidate could succeed.  For
//!   `TimedOut` the abandoned launch is still pending on the worker, so
//!   trying another id could start a second app.
//! - If every candidate fails, the recorded attempts are returned inside
//!   [`RemoteError::LaunchFailed`].

use std::time::Duration;

use lgtv_core::{LaunchAttempt, RemoteError, ResolutionTier};
use tracing::{info, warn};

/// Describes a launch request the TV accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    /// The app name the user asked for.
    pub app: String,
    /// The identifier the TV accepted.
    pub app_id: String,
    /// Which resolution tier supplied `app_id`.
    pub tier: ResolutionTier,
    /// Candidates that failed before `app_id` was accepted.
    pub failed_attempts: Vec<LaunchAttempt>,
}

/// Tries `candidates` in order with `try_launch`, pausing `pause` between
/// attempts, and stops at the first success.
///
/// # Errors
///
/// - The first terminal error (see [`RemoteError::is_terminal`]).
/// - [`RemoteError::LaunchFailed`] when every candidate failed.
/// - [`RemoteError::Unresolvable`] when `candidates` is empty.
pub fn attempt_in_order<F>(
    app: &str,
    candidates: &[&str],
    pause: Duration,
    mut try_launch: F,
) -> Result<LaunchReport, RemoteError>
where
    F: FnMut(&str) -> Result<(), RemoteError>,
{
    if candidates.is_empty() {
        return Err(RemoteError::Unresolvable(app.to_string()));
    }

    let mut failed_attempts = Vec::new();
    for (index, app_id) in candidates.iter().enumerate() {
        if index > 0 && !pause.is_zero() {
            std::thread::sleep(pause);
        }

        match try_launch(app_id) {
            Ok(()) => {
                info!(
                    "launch of '{app}' accepted with id {app_id} (attempt {} of {})",
                    index + 1,
                    candidates.len()
                );
                return Ok(LaunchReport {
                    app: app.to_string(),
                    app_id: (*app_id).to_string(),
                    tier: ResolutionTier::Alias,
                    failed_attempts,
                });
            }
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => {
                warn!("launch of '{app}' with id {app_id} failed: {e}");
                failed_attempts.push(LaunchAttempt {
                    app_id: (*app_id).to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    Err(RemoteError::LaunchFailed {
        app: app.to_string(),
        attempts: failed_attempts,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
