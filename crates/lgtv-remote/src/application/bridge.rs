//! CommandBridge: run device commands on one dedicated worker, wait from anywhere.
//!
//! # Why a bridge? (for beginners)
//!
//! The TV client is asynchronous and its transport is not reentrant: two
//! requests written to the same WebSocket at once would interleave their
//! replies.  Front ends, on the other hand, are synchronous: a button
//! handler wants to call `volume_up()` and get an answer.
//!
//! The bridge resolves both sides:
//!
//! ```text
//! caller thread A ─┐                        ┌─────────── worker thread ───────────┐
//! caller thread B ─┼─ submit() ── queue ──► │ current-thread tokio runtime        │
//! caller thread C ─┘     ▲                  │   loop { recv → session.execute }   │
//!                        └── reply channel ◄┤                                     │
//!                                           └─────────────────────────────────────┘
//! ```
//!
//! - Every command is evaluated by exactly one worker, in the order the queue
//!   accepted it, so no two device calls ever overlap.
//! - `submit` blocks the calling thread on a per-call reply channel with a
//!   timeout.  A timeout only ends the *wait*: the worker still runs the
//!   command to completion and its reply is discarded.
//! - A command that panics is caught and reported as a device error; the
//!   worker keeps serving later commands.
//!
//! # Shutdown
//!
//! [`CommandBridge::shutdown`] raises a stop flag and closes the queue, then
//! returns immediately.  The worker finishes the command it is running (if
//! any), drops everything still queued (those callers receive
//! [`RemoteError::BridgeClosed`]), closes the device connection, and exits.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use futures_util::FutureExt;
use lgtv_core::{Command, Outcome, RemoteError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use super::device::DeviceClient;
use super::session::DeviceSession;

/// Name given to the worker OS thread (visible in debuggers and panics).
const WORKER_THREAD_NAME: &str = "lgtv-bridge";

/// Correlates one in-flight command with the caller waiting for it.
///
/// Owned by the bridge: created by `submit`, consumed by the worker.  The
/// reply channel has room for exactly one value, so delivering a result
/// never blocks the worker even if the caller has stopped listening.
struct PendingCall {
    command: Command,
    reply: SyncSender<Result<Outcome, RemoteError>>,
}

/// Serializes device commands onto a dedicated worker thread.
///
/// `CommandBridge` is `Sync`: share it between caller threads behind an
/// `Arc` (or by reference) and call [`submit`](Self::submit) from each.
pub struct CommandBridge {
    queue: Mutex<Option<UnboundedSender<PendingCall>>>,
    stopping: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CommandBridge {
    /// Starts the worker thread, moving `client` into a fresh session it owns.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the tokio runtime or the OS thread cannot be
    /// created.
    pub fn start(client: Box<dyn DeviceClient>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = unbounded_channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let session = DeviceSession::new(client);

        let worker_stopping = Arc::clone(&stopping);
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(run_worker(session, rx, worker_stopping));
            })?;

        info!("command bridge started");
        Ok(Self {
            queue: Mutex::new(Some(tx)),
            stopping,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Submits `command` and blocks until the worker answers or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::TimedOut`] when the wait exceeded `timeout`.  The
    ///   command may still run (or have run) on the worker.
    /// - [`RemoteError::BridgeClosed`] when the bridge is shut down, either
    ///   before the command was accepted or while it was still queued.
    /// - Any error the session produced while evaluating the command.
    pub fn submit(&self, command: Command, timeout: Duration) -> Result<Outcome, RemoteError> {
        let (reply, result) = sync_channel(1);
        let label = command.name();

        {
            let guard = self
                .queue
                .lock()
                .map_err(|_| RemoteError::Device("command queue lock poisoned".into()))?;
            let queue = guard.as_ref().ok_or(RemoteError::BridgeClosed)?;
            queue
                .send(PendingCall { command, reply })
                .map_err(|_| RemoteError::BridgeClosed)?;
        }
        debug!("submitted {label}; waiting up to {timeout:?}");

        match result.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                warn!("{label} timed out after {timeout:?}; it may still complete on the worker");
                Err(RemoteError::TimedOut(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(RemoteError::BridgeClosed),
        }
    }

    /// Asks the worker to stop taking new work and returns without waiting.
    ///
    /// Calling `shutdown` more than once is harmless.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Ok(mut queue) = self.queue.lock() {
            if queue.take().is_some() {
                info!("command bridge shutdown requested");
            }
        }
    }

    /// Returns `true` while the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .map(|w| w.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Shuts down and waits for the worker thread to exit.
    ///
    /// Blocks for as long as the command currently executing takes.
    pub fn join(&self) {
        self.shutdown();
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("command bridge worker panicked during shutdown");
            }
        }
    }
}

impl Drop for CommandBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The worker loop: dequeue, evaluate, reply, repeat.
async fn run_worker(
    mut session: DeviceSession,
    mut rx: UnboundedReceiver<PendingCall>,
    stopping: Arc<AtomicBool>,
) {
    while let Some(call) = rx.recv().await {
        if stopping.load(Ordering::SeqCst) {
            debug!("dropping queued {} during shutdown", call.command.name());
            continue;
        }

        let label = call.command.name();
        debug!("executing {}", call.command);
        let result = match AssertUnwindSafe(session.execute(call.command))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!("{label} panicked on the worker: {detail}");
                Err(RemoteError::Device(format!("{label} panicked: {detail}")))
            }
        };

        if call.reply.try_send(result).is_err() {
            debug!("caller stopped waiting for {label}; result discarded");
        }
    }

    if session.state().is_connected() {
        if let Err(e) = session.disconnect().await {
            warn!("closing the TV connection during shutdown failed: {e}");
        }
    }
    info!("command bridge worker stopped");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device::MockDeviceClient;
    use lgtv_core::ConnectionState;

    const WAIT: Duration = Duration::from_secs(5);

    fn connect_cmd() -> Command {
        Command::Connect {
            address: "10.0.0.5".into(),
            pairing_key: None,
        }
    }

    #[test]
    fn test_status_round_trips_through_worker() {
        // Arrange
        let bridge = CommandBridge::start(Box::new(MockDeviceClient::new())).unwrap();

        // Act
        let outcome = bridge.submit(Command::Status, WAIT).unwrap();

        // Assert
        match outcome {
            Outcome::Status(snap) => {
                assert_eq!(snap.connection_state, ConnectionState::Disconnected)
            }
            other => panic!("expected status, got {other:?}"),
        }
        bridge.join();
    }

    #[test]
    fn test_not_connected_is_reported_and_worker_survives() {
        let bridge = CommandBridge::start(Box::new(MockDeviceClient::new())).unwrap();

        assert_eq!(
            bridge.submit(Command::VolumeUp, WAIT),
            Err(RemoteError::NotConnected)
        );
        assert!(bridge.submit(Command::Status, WAIT).is_ok());
        bridge.join();
    }

    #[test]
    fn test_panicking_command_is_reported_as_device_error() {
        // Arrange: the mock panics on launch
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_launch_app()
            .returning(|_| panic!("launch handler exploded"));
        mock.expect_volume_up().returning(|| Ok(()));
        mock.expect_disconnect().returning(|| Ok(()));
        let bridge = CommandBridge::start(Box::new(mock)).unwrap();
        bridge.submit(connect_cmd(), WAIT).unwrap();

        // Act
        let result = bridge.submit(Command::LaunchApp("netflix".into()), WAIT);

        // Assert: the panic became a device error and the worker still serves
        match result {
            Err(RemoteError::Device(detail)) => assert!(detail.contains("launch handler exploded")),
            other => panic!("expected device error, got {other:?}"),
        }
        assert_eq!(bridge.submit(Command::VolumeUp, WAIT), Ok(Outcome::Done));
        bridge.join();
    }

    #[test]
    fn test_submit_after_shutdown_is_bridge_closed() {
        let bridge = CommandBridge::start(Box::new(MockDeviceClient::new())).unwrap();

        bridge.shutdown();

        assert_eq!(
            bridge.submit(Command::Status, WAIT),
            Err(RemoteError::BridgeClosed)
        );
    }

    #[test]
    fn test_join_stops_worker_thread() {
        let bridge = CommandBridge::start(Box::new(MockDeviceClient::new())).unwrap();
        assert!(bridge.is_running());

        bridge.join();

        assert!(!bridge.is_running());
    }

    #[test]
    fn test_worker_closes_connection_on_shutdown() {
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_disconnect().times(1).returning(|| Ok(()));
        let bridge = CommandBridge::start(Box::new(mock)).unwrap();
        bridge.submit(connect_cmd(), WAIT).unwrap();

        // The mock verifies `disconnect` was called exactly once when dropped.
        bridge.join();
    }

    #[test]
    fn test_panic_message_extracts_str_and_string_payloads() {
        let s: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(s.as_ref()), "bang");
        let s: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic");
    }
}
