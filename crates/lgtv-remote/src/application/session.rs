//! DeviceSession: the single live connection to one TV.
//!
//! The session holds the device client, the address it targets, the pairing
//! key the TV issued, and the [`ConnectionState`].  It is owned by the
//! bridge worker and is never shared: every mutation happens on that one
//! thread, so no locking is needed here.
//!
//! # Preconditions
//!
//! Every device operation other than `connect`/`disconnect` requires the
//! state to be `Connected`.  When it is not, the operation fails with
//! [`RemoteError::NotConnected`] and the client is not called at all.
//!
//! # Pairing key reuse
//!
//! Once the TV has issued a key, the session keeps it until an explicit
//! `disconnect`.  A later `connect` to the same address without a key
//! argument offers the held key, so the TV does not prompt again.  A key is
//! only ever offered to the address that issued it; connecting to another
//! TV does not discard it.

use lgtv_core::{
    AppCatalogEntry, Button, Command, ConnectionState, Outcome, RemoteError, SessionSnapshot,
};
use tracing::{debug, info, warn};

use super::device::{DeviceClient, DeviceClientError};

impl From<DeviceClientError> for RemoteError {
    fn from(err: DeviceClientError) -> Self {
        match err {
            DeviceClientError::AuthRequired => RemoteError::AuthRequired,
            other => RemoteError::Device(other.to_string()),
        }
    }
}

/// The one live session against one TV.
pub struct DeviceSession {
    client: Box<dyn DeviceClient>,
    endpoint_address: Option<String>,
    pairing_key: Option<String>,
    /// Address of the TV that issued `pairing_key`.
    key_owner: Option<String>,
    state: ConnectionState,
}

impl DeviceSession {
    /// Creates a disconnected session around `client`.
    pub fn new(client: Box<dyn DeviceClient>) -> Self {
        Self {
            client,
            endpoint_address: None,
            pairing_key: None,
            key_owner: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Copies out the observable fields.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            endpoint_address: self.endpoint_address.clone(),
            pairing_key: self.pairing_key.clone(),
            connection_state: self.state,
        }
    }

    /// Evaluates one command.  This is the only entry point the bridge uses.
    pub async fn execute(&mut self, command: Command) -> Result<Outcome, RemoteError> {
        match command {
            Command::Connect {
                address,
                pairing_key,
            } => self
                .connect(&address, pairing_key)
                .await
                .map(|pairing_key| Outcome::Connected { pairing_key }),
            Command::Disconnect => self.disconnect().await.map(|()| Outcome::Done),
            Command::VolumeUp => self.volume_up().await.map(|()| Outcome::Done),
            Command::VolumeDown => self.volume_down().await.map(|()| Outcome::Done),
            Command::ToggleMute => self.toggle_mute().await.map(|_| Outcome::Done),
            Command::PowerOff => self.power_off().await.map(|()| Outcome::Done),
            Command::PressButton(button) => self.press_button(button).await.map(|()| Outcome::Done),
            Command::LaunchApp(app_id) => self.launch_app(&app_id).await.map(|()| Outcome::Done),
            Command::ListApps => self.list_apps().await.map(Outcome::Apps),
            Command::Status => Ok(Outcome::Status(self.snapshot())),
        }
    }

    /// Connects to `address`, offering `pairing_key` or, when absent, the key
    /// already held for that address.
    ///
    /// On success the state is `Connected` and the returned key is held.
    /// On failure the state is `Failed`; a previously held key is kept.
    ///
    /// # Errors
    ///
    /// [`RemoteError::AuthRequired`] when the TV refused the offered key,
    /// [`RemoteError::Device`] for any transport or protocol failure.
    pub async fn connect(
        &mut self,
        address: &str,
        pairing_key: Option<String>,
    ) -> Result<String, RemoteError> {
        if self.state.is_connected() {
            debug!("closing existing connection before reconnecting to {address}");
            if let Err(e) = self.client.disconnect().await {
                warn!("closing previous connection failed: {e}");
            }
        }

        let offered_key = pairing_key.or_else(|| {
            if self.key_owner.as_deref() == Some(address) {
                self.pairing_key.clone()
            } else {
                None
            }
        });

        self.endpoint_address = Some(address.to_string());
        self.state = ConnectionState::Connecting;
        info!(
            "connecting to TV at {address} ({})",
            if offered_key.is_some() {
                "with pairing key"
            } else {
                "pairing prompt expected"
            }
        );

        match self.client.connect(address, offered_key).await {
            Ok(key) => {
                self.pairing_key = Some(key.clone());
                self.key_owner = Some(address.to_string());
                self.state = ConnectionState::Connected;
                info!("connected to TV at {address}");
                Ok(key)
            }
            Err(e) => {
                self.state = ConnectionState::Failed;
                warn!("connection to TV at {address} failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Closes the connection and forgets the in-memory pairing key.
    ///
    /// The session ends up `Disconnected` even when the client reports an
    /// error while closing; that error is still returned.
    pub async fn disconnect(&mut self) -> Result<(), RemoteError> {
        let result = if self.state.is_connected() {
            self.client.disconnect().await.map_err(RemoteError::from)
        } else {
            Ok(())
        };
        self.state = ConnectionState::Disconnected;
        self.pairing_key = None;
        self.key_owner = None;
        info!("disconnected from TV");
        result
    }

    pub async fn volume_up(&mut self) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        self.client.volume_up().await.map_err(Into::into)
    }

    pub async fn volume_down(&mut self) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        self.client.volume_down().await.map_err(Into::into)
    }

    /// Reads the mute flag and sets its inverse.  Returns the new flag.
    ///
    /// This is two separate device calls.  A change made on the TV between
    /// the read and the write (e.g. from the physical remote) is overwritten.
    pub async fn toggle_mute(&mut self) -> Result<bool, RemoteError> {
        self.ensure_connected()?;
        let muted = self.client.get_muted().await?;
        self.client.set_mute(!muted).await?;
        debug!("mute toggled: {muted} -> {}", !muted);
        Ok(!muted)
    }

    pub async fn power_off(&mut self) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        self.client.power_off().await.map_err(Into::into)
    }

    pub async fn press_button(&mut self, button: Button) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        self.client.button(button).await.map_err(Into::into)
    }

    pub async fn launch_app(&mut self, app_id: &str) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        self.client.launch_app(app_id).await.map_err(Into::into)
    }

    pub async fn list_apps(&mut self) -> Result<Vec<AppCatalogEntry>, RemoteError> {
        self.ensure_connected()?;
        self.client.list_apps().await.map_err(Into::into)
    }

    fn ensure_connected(&self) -> Result<(), RemoteError> {
        if self.state.is_connected() {
            Ok(())
        } else {
            Err(RemoteError::NotConnected)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
