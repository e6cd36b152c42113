//! Infrastructure layer for the remote.
//!
//! Contains the adapters that touch the outside world: the WebSocket client
//! that speaks to the TV, the in-memory stand-in used by tests, and the
//! TOML file that remembers the TV's address and pairing key.
//!
//! **Dependency rule**: this layer implements the `DeviceClient` port from
//! `application` and owns the `ConfigStore` port the controller persists
//! through.  Nothing here drives the session directly.

pub mod device;
pub mod storage;
