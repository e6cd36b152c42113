//! The device-client port.
//!
//! [`DeviceClient`] is the opaque capability the session drives.  Any
//! concrete protocol client that satisfies it can be substituted: the
//! production webOS client, the in-memory mock used by tests and `--mock`,
//! or a `mockall`-generated double in unit tests.

use async_trait::async_trait;
use lgtv_core::{AppCatalogEntry, Button};
use thiserror::Error;

/// Errors a device client may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceClientError {
    /// The TV refused the offered pairing key and is prompting for a new pairing.
    #[error("pairing key rejected by the TV")]
    AuthRequired,
    /// The connection could not be opened or was lost.
    #[error("transport error: {0}")]
    Transport(String),
    /// The TV answered with an error or with something we could not parse.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The TV did not answer in time.
    #[error("device did not respond in time")]
    Timeout,
}

/// The minimal surface a TV client must expose.
///
/// Every method maps to exactly one request on the device.  Methods take
/// `&mut self` because implementations own a single, non-reentrant transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceClient: Send {
    /// Opens the connection and registers with the TV.
    ///
    /// Returns the pairing key the TV issued or confirmed.
    async fn connect(
        &mut self,
        address: &str,
        pairing_key: Option<String>,
    ) -> Result<String, DeviceClientError>;

    /// Closes the connection.  Closing an already-closed client is not an error.
    async fn disconnect(&mut self) -> Result<(), DeviceClientError>;

    /// Presses one remote-control button.
    async fn button(&mut self, button: Button) -> Result<(), DeviceClientError>;

    async fn volume_up(&mut self) -> Result<(), DeviceClientError>;

    async fn volume_down(&mut self) -> Result<(), DeviceClientError>;

    /// Reads the current mute flag.
    async fn get_muted(&mut self) -> Result<bool, DeviceClientError>;

    async fn set_mute(&mut self, muted: bool) -> Result<(), DeviceClientError>;

    /// Asks the TV to launch an application.  Acceptance is not proof the
    /// application actually started.
    async fn launch_app(&mut self, app_id: &str) -> Result<(), DeviceClientError>;

    /// Lists installed applications in device order.
    async fn list_apps(&mut self) -> Result<Vec<AppCatalogEntry>, DeviceClientError>;

    async fn power_off(&mut self) -> Result<(), DeviceClientError>;
}
