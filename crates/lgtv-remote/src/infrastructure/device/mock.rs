//! In-memory TV for tests and the `--mock` CLI mode.
//!
//! # Why a mock device?
//!
//! The real client needs a TV on the network and a person to accept the
//! pairing prompt.  `MockDevice` replaces all of that with in-memory state:
//!
//! - Every call is recorded, in order, as a [`DeviceCall`], so tests can
//!   assert exactly what reached the "TV".
//! - The number of calls executing at the same moment is tracked.  A correct
//!   bridge never lets that number exceed one.
//! - Latency can be injected to make commands slow enough to race or time out,
//!   either for every call or for app launches alone.
//! - Individual app ids can be made to fail or panic on launch.
//! - Pairing behaves like a real TV: a known key connects silently, an
//!   unknown key is refused, and no key "shows a prompt" and issues a new one.
//!
//! # Sharing
//!
//! `MockDevice` is `Clone`; all clones share one state.  Hand one clone to the
//! bridge (which takes ownership) and keep another to inspect afterwards:
//!
//! ```ignore
//! let tv = MockDevice::new().with_known_key("k1");
//! let controller = SessionController::new(Box::new(tv.clone()), store, settings)?;
//! controller.connect("10.0.0.5")?;
//! assert_eq!(tv.prompts_shown(), 0);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lgtv_core::{AppCatalogEntry, Button};

use crate::application::device::{DeviceClient, DeviceClientError};

/// One call that reached the mock, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Connect {
        address: String,
        pairing_key: Option<String>,
    },
    Disconnect,
    Button(Button),
    VolumeUp,
    VolumeDown,
    GetMuted,
    SetMute(bool),
    LaunchApp(String),
    ListApps,
    PowerOff,
}

#[derive(Debug, Clone, Default)]
struct Behaviour {
    latency: Duration,
    launch_latency: Duration,
    apps: Vec<AppCatalogEntry>,
    failing_apps: HashSet<String>,
    panicking_apps: HashSet<String>,
    known_keys: HashSet<String>,
    list_fails: bool,
    unreachable: bool,
}

#[derive(Debug, Default)]
struct MockState {
    behaviour: Mutex<Behaviour>,
    calls: Mutex<Vec<DeviceCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    prompts: AtomicUsize,
    muted: AtomicBool,
    connected: AtomicBool,
}

/// Scriptable in-memory [`DeviceClient`].
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<MockState>,
}

impl MockDevice {
    /// A TV with no installed apps, no latency, and no known keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// A TV with a handful of common streaming apps installed.
    pub fn demo() -> Self {
        Self::new().with_apps(vec![
            AppCatalogEntry::new("com.webos.app.livetv", "Live TV"),
            AppCatalogEntry::new("netflix", "Netflix"),
            AppCatalogEntry::new("youtube.leanback.v4", "YouTube"),
            AppCatalogEntry::new("amazon", "Prime Video"),
            AppCatalogEntry::new("com.webos.app.browser", "Web Browser"),
        ])
    }

    // ── Builders ──────────────────────────────────────────────────────────────

    /// Every call sleeps for `latency` before answering.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.behaviour().latency = latency;
        self
    }

    /// `launch_app` sleeps for `latency` on top of the common latency.
    pub fn with_launch_latency(self, latency: Duration) -> Self {
        self.behaviour().launch_latency = latency;
        self
    }

    /// The catalog returned by `list_apps`.
    pub fn with_apps(self, apps: Vec<AppCatalogEntry>) -> Self {
        self.behaviour().apps = apps;
        self
    }

    /// Launching `app_id` returns a protocol error.
    pub fn with_failing_app(self, app_id: impl Into<String>) -> Self {
        self.behaviour().failing_apps.insert(app_id.into());
        self
    }

    /// Launching `app_id` panics inside the client.
    pub fn with_panicking_app(self, app_id: impl Into<String>) -> Self {
        self.behaviour().panicking_apps.insert(app_id.into());
        self
    }

    /// The TV accepts `key` without prompting.
    pub fn with_known_key(self, key: impl Into<String>) -> Self {
        self.behaviour().known_keys.insert(key.into());
        self
    }

    /// `list_apps` fails with a protocol error.
    pub fn with_failing_list(self) -> Self {
        self.behaviour().list_fails = true;
        self
    }

    /// `connect` fails with a transport error.
    pub fn unreachable(self) -> Self {
        self.behaviour().unreachable = true;
        self
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<DeviceCall> {
        lock(&self.state.calls).clone()
    }

    /// The app ids passed to `launch_app`, in order.
    pub fn launch_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::LaunchApp(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// The highest number of calls that were ever executing at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// How many times a pairing prompt was "shown" (connects without a known key).
    pub fn prompts_shown(&self) -> usize {
        self.state.prompts.load(Ordering::SeqCst)
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    fn behaviour(&self) -> MutexGuard<'_, Behaviour> {
        lock(&self.state.behaviour)
    }

    /// Records `call`, marks it in flight, and applies the injected latency.
    async fn enter(&self, call: DeviceCall) -> (InFlight, Behaviour) {
        lock(&self.state.calls).push(call);
        let guard = InFlight::enter(Arc::clone(&self.state));
        let behaviour = self.behaviour().clone();
        if !behaviour.latency.is_zero() {
            tokio::time::sleep(behaviour.latency).await;
        }
        (guard, behaviour)
    }

    fn ensure_connected(&self) -> Result<(), DeviceClientError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DeviceClientError::Transport("mock TV: socket not open".into()))
        }
    }
}

/// Decrements the in-flight count when dropped.
struct InFlight(Arc<MockState>);

impl InFlight {
    fn enter(state: Arc<MockState>) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DeviceClient for MockDevice {
    async fn connect(
        &mut self,
        address: &str,
        pairing_key: Option<String>,
    ) -> Result<String, DeviceClientError> {
        let (_guard, behaviour) = self
            .enter(DeviceCall::Connect {
                address: address.to_string(),
                pairing_key: pairing_key.clone(),
            })
            .await;

        if behaviour.unreachable {
            return Err(DeviceClientError::Transport(format!(
                "mock TV at {address} is unreachable"
            )));
        }

        let key = match pairing_key {
            Some(key) if behaviour.known_keys.contains(&key) => key,
            Some(_) => return Err(DeviceClientError::AuthRequired),
            None => {
                let n = self.state.prompts.fetch_add(1, Ordering::SeqCst) + 1;
                let key = format!("mock-key-{n}");
                self.behaviour().known_keys.insert(key.clone());
                key
            }
        };
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(key)
    }

    async fn disconnect(&mut self) -> Result<(), DeviceClientError> {
        let _guard = self.enter(DeviceCall::Disconnect).await;
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn button(&mut self, button: Button) -> Result<(), DeviceClientError> {
        let _guard = self.enter(DeviceCall::Button(button)).await;
        self.ensure_connected()
    }

    async fn volume_up(&mut self) -> Result<(), DeviceClientError> {
        let _guard = self.enter(DeviceCall::VolumeUp).await;
        self.ensure_connected()
    }

    async fn volume_down(&mut self) -> Result<(), DeviceClientError> {
        let _guard = self.enter(DeviceCall::VolumeDown).await;
        self.ensure_connected()
    }

    async fn get_muted(&mut self) -> Result<bool, DeviceClientError> {
        let _guard = self.enter(DeviceCall::GetMuted).await;
        self.ensure_connected()?;
        Ok(self.is_muted())
    }

    async fn set_mute(&mut self, muted: bool) -> Result<(), DeviceClientError> {
        let _guard = self.enter(DeviceCall::SetMute(muted)).await;
        self.ensure_connected()?;
        self.state.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn launch_app(&mut self, app_id: &str) -> Result<(), DeviceClientError> {
        let (_guard, behaviour) = self.enter(DeviceCall::LaunchApp(app_id.to_string())).await;
        if !behaviour.launch_latency.is_zero() {
            tokio::time::sleep(behaviour.launch_latency).await;
        }
        self.ensure_connected()?;
        if behaviour.panicking_apps.contains(app_id) {
            panic!("mock TV crashed launching {app_id}");
        }
        if behaviour.failing_apps.contains(app_id) {
            return Err(DeviceClientError::Protocol(format!(
                "{app_id}: app not installed"
            )));
        }
        Ok(())
    }

    async fn list_apps(&mut self) -> Result<Vec<AppCatalogEntry>, DeviceClientError> {
        let (_guard, behaviour) = self.enter(DeviceCall::ListApps).await;
        self.ensure_connected()?;
        if behaviour.list_fails {
            return Err(DeviceClientError::Protocol("listApps: permission denied".into()));
        }
        Ok(behaviour.apps)
    }

    async fn power_off(&mut self) -> Result<(), DeviceClientError> {
        let _guard = self.enter(DeviceCall::PowerOff).await;
        self.ensure_connected()?;
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_key_prompts_and_issues_key() {
        // Arrange
        let tv = MockDevice::new();
        let mut client = tv.clone();

        // Act
        let key = client.connect("10.0.0.5", None).await.unwrap();

        // Assert
        assert_eq!(key, "mock-key-1");
        assert_eq!(tv.prompts_shown(), 1);
        assert!(tv.is_connected());
    }

    #[tokio::test]
    async fn test_issued_key_is_known_on_next_connect() {
        let tv = MockDevice::new();
        let mut client = tv.clone();
        let key = client.connect("10.0.0.5", None).await.unwrap();

        let again = client.connect("10.0.0.5", Some(key.clone())).await.unwrap();

        assert_eq!(again, key);
        assert_eq!(tv.prompts_shown(), 1);
    }

    #[tokio::test]
    async fn test_unknown_key_is_auth_required() {
        let mut client = MockDevice::new().with_known_key("good");

        assert_eq!(
            client.connect("10.0.0.5", Some("stale".into())).await,
            Err(DeviceClientError::AuthRequired)
        );
    }

    #[tokio::test]
    async fn test_calls_are_recorded_in_order() {
        let tv = MockDevice::new();
        let mut client = tv.clone();
        client.connect("10.0.0.5", None).await.unwrap();

        client.get_muted().await.unwrap();
        client.set_mute(true).await.unwrap();
        client.button(Button::Home).await.unwrap();

        assert_eq!(
            &tv.calls()[1..],
            &[
                DeviceCall::GetMuted,
                DeviceCall::SetMute(true),
                DeviceCall::Button(Button::Home),
            ]
        );
        assert!(tv.is_muted());
        assert_eq!(tv.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_failing_app_and_failing_list() {
        let tv = MockDevice::new()
            .with_failing_app("hulu")
            .with_failing_list();
        let mut client = tv.clone();
        client.connect("10.0.0.5", None).await.unwrap();

        assert!(matches!(
            client.launch_app("hulu").await,
            Err(DeviceClientError::Protocol(_))
        ));
        assert!(client.launch_app("netflix").await.is_ok());
        assert!(client.list_apps().await.is_err());
        assert_eq!(tv.launch_calls(), vec!["hulu", "netflix"]);
    }

    #[tokio::test]
    async fn test_disconnect_counts_as_in_flight_while_it_runs() {
        // Arrange: two clients on one TV, each call slow enough to overlap
        let tv = MockDevice::new().with_latency(Duration::from_millis(30));
        let mut first = tv.clone();
        let mut second = tv.clone();

        // Act
        let (a, b) = tokio::join!(first.disconnect(), second.disconnect());

        // Assert
        assert_eq!((a, b), (Ok(()), Ok(())));
        assert_eq!(tv.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_launch_latency_only_slows_launches() {
        let tv = MockDevice::demo().with_launch_latency(Duration::from_millis(40));
        let mut client = tv.clone();
        client.connect("10.0.0.5", None).await.unwrap();

        let listed = std::time::Instant::now();
        client.list_apps().await.unwrap();
        let list_took = listed.elapsed();
        let launched = std::time::Instant::now();
        client.launch_app("netflix").await.unwrap();

        assert!(list_took < Duration::from_millis(40));
        assert!(launched.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_commands_fail_when_socket_closed() {
        let mut client = MockDevice::demo();

        assert!(matches!(
            client.volume_up().await,
            Err(DeviceClientError::Transport(_))
        ));
    }
}
