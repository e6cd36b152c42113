//! Device clients: concrete implementations of the `DeviceClient` port.
//!
//! - `ssap`  – frame builders and parsers for LG's SSAP JSON protocol (no I/O).
//! - `webos` – the production client, SSAP over `tokio-tungstenite`.
//! - `mock`  – an in-memory TV that records every call; used by integration
//!   tests and by the CLI's `--mock` flag.

pub mod mock;
pub mod ssap;
pub mod webos;

pub use mock::{DeviceCall, MockDevice};
pub use webos::{WebOsClient, WebOsConfig};
