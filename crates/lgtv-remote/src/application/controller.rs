//! SessionController: the one API every front end binds to.
//!
//! # Responsibilities (for beginners)
//!
//! The controller is deliberately thin.  It never touches the device client
//! itself; it turns each user action into a [`Command`], submits it to the
//! [`CommandBridge`], and interprets the [`Outcome`].  On top of that it owns
//! the two pieces of policy that span several commands:
//!
//! 1. **Pairing-key persistence.**  The stored `{address, pairing_key}` record
//!    is read once at construction.  The stored key is offered only when the
//!    requested address equals the stored address.  After every successful
//!    connect the record is overwritten with the key the TV returned.  A
//!    failed write is logged and the connect still succeeds.
//!
//! 2. **Launch by name.**  `launch_by_name("Netflix")` lists the TV's apps,
//!    resolves the name with [`resolve`], and then either launches the single
//!    catalog match once or walks the alias candidates with
//!    [`attempt_in_order`].  An unresolvable name never reaches the TV, and
//!    a timeout ends the walk so no second app is queued behind the first.
//!
//! All methods block the calling thread and may be called from any number of
//! threads at once; the bridge serializes the device calls.

use std::sync::Mutex;
use std::time::Duration;

use lgtv_core::{
    resolve, AliasTable, AppCatalogEntry, Button, Command, Outcome, RemoteError, Resolution,
    ResolutionTier, SessionSnapshot,
};
use tracing::{debug, info, warn};

use super::bridge::CommandBridge;
use super::device::DeviceClient;
use super::launch::{attempt_in_order, LaunchReport};
use crate::infrastructure::storage::config::{ConfigStore, RemoteSettings, TvRecord};

/// Timing knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// How long a caller waits for any command other than connect.
    pub command_timeout: Duration,
    /// How long a caller waits for connect.  Long enough for a human to
    /// accept the pairing prompt on the TV.
    pub connect_timeout: Duration,
    /// Pause between alias candidates during `launch_by_name`.
    pub launch_retry_pause: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&RemoteSettings::default())
    }
}

impl From<&RemoteSettings> for ControllerSettings {
    fn from(settings: &RemoteSettings) -> Self {
        Self {
            command_timeout: settings.command_timeout(),
            connect_timeout: settings.connect_timeout(),
            launch_retry_pause: settings.launch_retry_pause(),
        }
    }
}

/// Front-end facing API over one TV session.
pub struct SessionController<S: ConfigStore> {
    bridge: CommandBridge,
    store: S,
    stored: Mutex<TvRecord>,
    aliases: AliasTable,
    settings: ControllerSettings,
}

impl<S: ConfigStore> SessionController<S> {
    /// Starts the bridge around `client` and reads the stored record from `store`.
    ///
    /// A record that cannot be read is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the bridge worker cannot be started.
    pub fn new(
        client: Box<dyn DeviceClient>,
        store: S,
        settings: ControllerSettings,
    ) -> std::io::Result<Self> {
        let stored = store.load_record().unwrap_or_else(|e| {
            warn!("could not read the stored TV record, starting without one: {e}");
            TvRecord::default()
        });
        debug!(
            "stored TV record: {} ({})",
            stored.address,
            if stored.pairing_key.is_some() {
                "paired"
            } else {
                "not paired"
            }
        );

        Ok(Self {
            bridge: CommandBridge::start(client)?,
            store,
            stored: Mutex::new(stored),
            aliases: AliasTable::builtin(),
            settings,
        })
    }

    /// Replaces the alias table used by [`launch_by_name`](Self::launch_by_name).
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// The address from the stored record.
    pub fn stored_address(&self) -> String {
        self.stored_record().address
    }

    /// A copy of the stored `{address, pairing_key}` record.
    pub fn stored_record(&self) -> TvRecord {
        self.stored
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    // ── Connection ────────────────────────────────────────────────────────────

    /// Connects to `address`, offering the stored key if it belongs to it.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::MissingAddress`] when `address` is blank.
    /// - [`RemoteError::AuthRequired`] when the TV refused the stored key;
    ///   call [`pair`](Self::pair) to start a fresh pairing.
    pub fn connect(&self, address: &str) -> Result<(), RemoteError> {
        let address = required_address(address)?;
        let stored = self.stored_record();
        let pairing_key = if stored.address == address {
            stored.pairing_key
        } else {
            None
        };
        self.connect_with(address, pairing_key)
    }

    /// Connects to the stored address.
    pub fn reconnect(&self) -> Result<(), RemoteError> {
        let address = self.stored_address();
        self.connect(&address)
    }

    /// Connects without offering any key, so the TV shows its pairing prompt.
    ///
    /// Any key the session still holds in memory is dropped first.
    pub fn pair(&self, address: &str) -> Result<(), RemoteError> {
        let address = required_address(address)?;
        info!("starting a fresh pairing with {address}; accept the prompt on the TV");
        self.submit(Command::Disconnect)?;
        self.connect_with(address, None)
    }

    pub fn disconnect(&self) -> Result<(), RemoteError> {
        self.submit(Command::Disconnect).map(drop)
    }

    fn connect_with(&self, address: &str, pairing_key: Option<String>) -> Result<(), RemoteError> {
        let command = Command::Connect {
            address: address.to_string(),
            pairing_key,
        };
        let key = match self.bridge.submit(command, self.settings.connect_timeout)? {
            Outcome::Connected { pairing_key } => pairing_key,
            other => return Err(unexpected("connect", &other)),
        };
        self.persist(TvRecord {
            address: address.to_string(),
            pairing_key: Some(key),
        });
        Ok(())
    }

    fn persist(&self, record: TvRecord) {
        if let Err(e) = self.store.save_record(&record) {
            warn!("could not save the pairing key for {}: {e}", record.address);
        }
        if let Ok(mut stored) = self.stored.lock() {
            *stored = record;
        }
    }

    // ── Simple commands ───────────────────────────────────────────────────────

    pub fn volume_up(&self) -> Result<(), RemoteError> {
        self.submit(Command::VolumeUp).map(drop)
    }

    pub fn volume_down(&self) -> Result<(), RemoteError> {
        self.submit(Command::VolumeDown).map(drop)
    }

    /// Reads the mute flag and writes its inverse (two device calls).
    pub fn toggle_mute(&self) -> Result<(), RemoteError> {
        self.submit(Command::ToggleMute).map(drop)
    }

    pub fn power_off(&self) -> Result<(), RemoteError> {
        self.submit(Command::PowerOff).map(drop)
    }

    pub fn press(&self, button: Button) -> Result<(), RemoteError> {
        self.submit(Command::PressButton(button)).map(drop)
    }

    /// Launches an app by its exact device identifier.
    pub fn launch_app(&self, app_id: &str) -> Result<(), RemoteError> {
        self.submit(Command::LaunchApp(app_id.to_string())).map(drop)
    }

    pub fn list_apps(&self) -> Result<Vec<AppCatalogEntry>, RemoteError> {
        match self.submit(Command::ListApps)? {
            Outcome::Apps(apps) => Ok(apps),
            other => Err(unexpected("list_apps", &other)),
        }
    }

    pub fn status(&self) -> Result<SessionSnapshot, RemoteError> {
        match self.submit(Command::Status)? {
            Outcome::Status(snapshot) => Ok(snapshot),
            other => Err(unexpected("status", &other)),
        }
    }

    // ── Launch by name ────────────────────────────────────────────────────────

    /// Resolves `name` and launches the first candidate the TV accepts.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::NotConnected`] when there is no session.
    /// - [`RemoteError::Unresolvable`] when neither tier produced a candidate.
    ///   No launch request is sent in that case.
    /// - [`RemoteError::TimedOut`] when listing or any launch attempt timed
    ///   out.  No further candidate is submitted after a timeout.
    /// - The catalog match's own error, unchanged, when that launch failed.
    /// - [`RemoteError::LaunchFailed`] when every alias candidate failed.
    pub fn launch_by_name(&self, name: &str) -> Result<LaunchReport, RemoteError> {
        let catalog = match self.list_apps() {
            Ok(apps) => Some(apps),
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => {
                warn!("could not list installed apps, using the alias table only: {e}");
                None
            }
        };

        match resolve(name, catalog.as_deref(), &self.aliases) {
            Resolution::Unresolvable => {
                info!("no app matches '{name}'");
                Err(RemoteError::Unresolvable(name.to_string()))
            }
            Resolution::Catalog { id, title } => {
                info!("launching '{name}' as installed app '{title}' ({id})");
                self.launch_app(&id)?;
                Ok(LaunchReport {
                    app: name.to_string(),
                    app_id: id,
                    tier: ResolutionTier::Catalog,
                    failed_attempts: Vec::new(),
                })
            }
            Resolution::Alias(ids) => {
                info!("launching '{name}' from alias table: {} candidate(s)", ids.len());
                let candidates: Vec<&str> = ids.iter().map(String::as_str).collect();
                attempt_in_order(
                    name,
                    &candidates,
                    self.settings.launch_retry_pause,
                    |app_id| self.launch_app(app_id),
                )
            }
        }
    }

    /// Names in the alias table, in table order.
    pub fn alias_names(&self) -> Vec<&str> {
        self.aliases.names().collect()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Stops the bridge and waits for the worker to close the connection.
    pub fn shutdown(&self) {
        self.bridge.join();
    }

    fn submit(&self, command: Command) -> Result<Outcome, RemoteError> {
        self.bridge.submit(command, self.settings.command_timeout)
    }
}

fn required_address(address: &str) -> Result<&str, RemoteError> {
    match address.trim() {
        "" => Err(RemoteError::MissingAddress),
        trimmed => Ok(trimmed),
    }
}

fn unexpected(operation: &str, outcome: &Outcome) -> RemoteError {
    RemoteError::Device(format!("unexpected reply to {operation}: {outcome:?}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device::{DeviceClientError, MockDeviceClient};
    use crate::infrastructure::storage::config::MemoryConfigStore;
    use mockall::Sequence;

    fn fast_settings() -> ControllerSettings {
        ControllerSettings {
            command_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            launch_retry_pause: Duration::ZERO,
        }
    }

    fn stored(address: &str, key: Option<&str>) -> MemoryConfigStore {
        MemoryConfigStore::new(TvRecord {
            address: address.into(),
            pairing_key: key.map(str::to_string),
        })
    }

    fn controller(
        mock: MockDeviceClient,
        store: MemoryConfigStore,
    ) -> SessionController<MemoryConfigStore> {
        SessionController::new(Box::new(mock), store, fast_settings()).unwrap()
    }

    #[test]
    fn test_settings_default_matches_remote_settings_default() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.command_timeout, Duration::from_secs(10));
        assert_eq!(settings.connect_timeout, Duration::from_secs(60));
        assert_eq!(settings.launch_retry_pause, Duration::from_millis(500));
    }

    #[test]
    fn test_connect_offers_stored_key_for_matching_address() {
        // Arrange
        let mut mock = MockDeviceClient::new();
        mock.expect_connect()
            .withf(|addr, key| addr == "10.0.0.5" && key.as_deref() == Some("stored"))
            .times(1)
            .returning(|_, _| Ok("stored".into()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, stored("10.0.0.5", Some("stored")));

        // Act / Assert
        assert_eq!(ctl.connect("10.0.0.5"), Ok(()));
        ctl.shutdown();
    }

    #[test]
    fn test_connect_to_other_address_offers_no_key() {
        let mut mock = MockDeviceClient::new();
        mock.expect_connect()
            .withf(|addr, key| addr == "10.0.0.6" && key.is_none())
            .times(1)
            .returning(|_, _| Ok("fresh".into()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, stored("10.0.0.5", Some("stored")));

        assert_eq!(ctl.connect("10.0.0.6"), Ok(()));
        ctl.shutdown();
    }

    #[test]
    fn test_successful_connect_overwrites_stored_record() {
        // Arrange
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("issued".into()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, stored("10.0.0.5", None));

        // Act
        ctl.connect("10.0.0.9").unwrap();

        // Assert
        let expected = TvRecord {
            address: "10.0.0.9".into(),
            pairing_key: Some("issued".into()),
        };
        assert_eq!(ctl.store.saved_records(), vec![expected]);
        assert_eq!(ctl.stored_address(), "10.0.0.9");
        ctl.shutdown();
    }

    #[test]
    fn test_rejected_key_is_auth_required_and_nothing_is_saved() {
        let mut mock = MockDeviceClient::new();
        mock.expect_connect()
            .returning(|_, _| Err(DeviceClientError::AuthRequired));
        let ctl = controller(mock, stored("10.0.0.5", Some("stale")));

        assert_eq!(ctl.reconnect(), Err(RemoteError::AuthRequired));
        assert!(ctl.store.saved_records().is_empty());
        ctl.shutdown();
    }

    #[test]
    fn test_pair_connects_without_any_key() {
        let mut mock = MockDeviceClient::new();
        let mut seq = Sequence::new();
        mock.expect_connect()
            .withf(|_, key| key.as_deref() == Some("stale"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(DeviceClientError::AuthRequired));
        mock.expect_connect()
            .withf(|_, key| key.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("new-key".into()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, stored("10.0.0.5", Some("stale")));

        assert_eq!(ctl.connect("10.0.0.5"), Err(RemoteError::AuthRequired));
        assert_eq!(ctl.pair("10.0.0.5"), Ok(()));
        assert_eq!(
            ctl.status().unwrap().pairing_key.as_deref(),
            Some("new-key")
        );
        ctl.shutdown();
    }

    #[test]
    fn test_blank_address_never_reaches_the_client() {
        // Arrange: connect has no expectation, so any call would panic
        let ctl = controller(MockDeviceClient::new(), MemoryConfigStore::default());

        // Act / Assert
        assert_eq!(ctl.connect(""), Err(RemoteError::MissingAddress));
        assert_eq!(ctl.connect(" \t"), Err(RemoteError::MissingAddress));
        ctl.shutdown();
    }

    #[test]
    fn test_connect_trims_the_address() {
        let mut mock = MockDeviceClient::new();
        mock.expect_connect()
            .withf(|addr, _| addr == "10.0.0.5")
            .times(1)
            .returning(|_, _| Ok("k".into()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, MemoryConfigStore::default());

        assert_eq!(ctl.connect(" 10.0.0.5 "), Ok(()));
        assert_eq!(ctl.stored_record().address, "10.0.0.5");
        ctl.shutdown();
    }

    #[test]
    fn test_commands_before_connect_are_not_connected() {
        let ctl = controller(MockDeviceClient::new(), MemoryConfigStore::default());

        assert_eq!(ctl.volume_up(), Err(RemoteError::NotConnected));
        assert_eq!(ctl.toggle_mute(), Err(RemoteError::NotConnected));
        assert_eq!(
            ctl.launch_by_name("Netflix"),
            Err(RemoteError::NotConnected)
        );
        ctl.shutdown();
    }

    #[test]
    fn test_launch_by_name_prefers_catalog_match() {
        // Arrange
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_list_apps().returning(|| {
            Ok(vec![
                AppCatalogEntry::new("com.webos.app.browser", "Web Browser"),
                AppCatalogEntry::new("netflix", "Netflix"),
            ])
        });
        mock.expect_launch_app()
            .withf(|id| id == "netflix")
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, MemoryConfigStore::default());
        ctl.connect("10.0.0.5").unwrap();

        // Act
        let report = ctl.launch_by_name("netflix").unwrap();

        // Assert
        assert_eq!(report.app_id, "netflix");
        assert_eq!(report.tier, ResolutionTier::Catalog);
        ctl.shutdown();
    }

    #[test]
    fn test_failed_catalog_launch_returns_the_device_error_unchanged() {
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_list_apps()
            .returning(|| Ok(vec![AppCatalogEntry::new("netflix", "Netflix")]));
        mock.expect_launch_app()
            .times(1)
            .returning(|_| Err(DeviceClientError::Protocol("busy".into())));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, MemoryConfigStore::default());
        ctl.connect("10.0.0.5").unwrap();

        let result = ctl.launch_by_name("Netflix");

        assert_eq!(
            result,
            Err(RemoteError::from(DeviceClientError::Protocol("busy".into())))
        );
        ctl.shutdown();
    }

    #[test]
    fn test_launch_by_name_falls_back_to_aliases_when_listing_fails() {
        let mut mock = MockDeviceClient::new();
        let mut seq = Sequence::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_list_apps()
            .returning(|| Err(DeviceClientError::Protocol("listApps denied".into())));
        mock.expect_launch_app()
            .withf(|id| id == "espn")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(DeviceClientError::Protocol("no such app".into())));
        mock.expect_launch_app()
            .withf(|id| id == "com.espn.webostv")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, MemoryConfigStore::default());
        ctl.connect("10.0.0.5").unwrap();

        let report = ctl.launch_by_name("ESPN").unwrap();

        assert_eq!(report.app_id, "com.espn.webostv");
        assert_eq!(report.tier, ResolutionTier::Alias);
        assert_eq!(report.failed_attempts.len(), 1);
        ctl.shutdown();
    }

    #[test]
    fn test_unresolvable_name_sends_no_launch() {
        // Arrange: launch_app has no expectation, so any call would panic
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_list_apps()
            .returning(|| Ok(vec![AppCatalogEntry::new("netflix", "Netflix")]));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, MemoryConfigStore::default());
        ctl.connect("10.0.0.5").unwrap();

        // Act / Assert
        assert_eq!(
            ctl.launch_by_name("Crunchyroll"),
            Err(RemoteError::Unresolvable("Crunchyroll".into()))
        );
        ctl.shutdown();
    }

    #[test]
    fn test_custom_alias_table_is_used() {
        let mut mock = MockDeviceClient::new();
        mock.expect_connect().returning(|_, _| Ok("k".into()));
        mock.expect_list_apps().returning(|| Ok(Vec::new()));
        mock.expect_launch_app()
            .withf(|id| id == "crunchyroll")
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_disconnect().returning(|| Ok(()));
        let ctl = controller(mock, MemoryConfigStore::default())
            .with_aliases(AliasTable::from_entries([("Crunchyroll", ["crunchyroll"])]));
        ctl.connect("10.0.0.5").unwrap();

        let report = ctl.launch_by_name("Crunchyroll").unwrap();

        assert_eq!(report.app_id, "crunchyroll");
        assert_eq!(ctl.alias_names(), vec!["Crunchyroll"]);
        ctl.shutdown();
    }
}
