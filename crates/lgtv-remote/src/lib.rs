//! lgtv-remote library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # How the pieces fit (for beginners)
//!
//! ```text
//! caller threads (CLI, GUI handlers)
//!        │  SessionController::launch_by_name("Netflix")
//!        ▼
//! SessionController ── resolve() ──► lgtv_core::resolver
//!        │  submit(Command, timeout)        (blocks the caller)
//!        ▼
//! CommandBridge ── mpsc queue ──► worker thread (tokio current-thread runtime)
//!                                        │
//!                                        ▼
//!                                 DeviceSession ──► dyn DeviceClient (webOS / mock)
//! ```
//!
//! Only the worker thread ever touches the device client, so device calls
//! never interleave no matter how many caller threads submit at once.

/// Application layer: session, bridge, controller, and launch policy.
pub mod application;

/// Infrastructure layer: device clients and configuration storage.
pub mod infrastructure;
