//! Application layer for the remote.
//!
//! # Sub-modules
//!
//! - **`device`**     – The `DeviceClient` port: the minimal surface any TV
//!   client must offer.  Implementations live in the infrastructure layer.
//!
//! - **`session`**    – `DeviceSession`: the single live connection and its
//!   state machine.  Owned exclusively by the bridge worker.
//!
//! - **`bridge`**     – `CommandBridge`: a dedicated worker thread that runs
//!   one command at a time and lets any number of threads wait on results
//!   with a timeout.
//!
//! - **`launch`**     – The ordered-attempt loop used when an app name maps
//!   to several candidate identifiers.
//!
//! - **`controller`** – `SessionController`: the API front ends bind to.
//!   Coordinates the bridge, the resolver, and the config store.

pub mod bridge;
pub mod controller;
pub mod device;
pub mod launch;
pub mod session;
