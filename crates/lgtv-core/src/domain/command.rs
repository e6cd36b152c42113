//! The command vocabulary: every request the remote can make of the TV.
//!
//! A [`Command`] is an immutable, one-shot value.  It carries no ownership of
//! device state; it is evaluated against whatever session is current when the
//! worker dequeues it.  Each command yields exactly one [`Outcome`] (or an
//! error) and is then discarded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::AppCatalogEntry;
use super::session::SessionSnapshot;

/// The fixed button vocabulary understood by the TV's input service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Home,
    Back,
    Play,
    Pause,
    Stop,
    Rewind,
    FastForward,
}

impl Button {
    /// Every button, in remote-layout order (navigation first, then media).
    pub const ALL: [Button; 12] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Enter,
        Button::Home,
        Button::Back,
        Button::Play,
        Button::Pause,
        Button::Stop,
        Button::Rewind,
        Button::FastForward,
    ];

    /// The name the TV expects on the wire (e.g. `"FASTFORWARD"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
            Button::Enter => "ENTER",
            Button::Home => "HOME",
            Button::Back => "BACK",
            Button::Play => "PLAY",
            Button::Pause => "PAUSE",
            Button::Stop => "STOP",
            Button::Rewind => "REWIND",
            Button::FastForward => "FASTFORWARD",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`Button`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown button '{0}' (expected one of UP, DOWN, LEFT, RIGHT, ENTER, HOME, BACK, PLAY, PAUSE, STOP, REWIND, FASTFORWARD)")]
pub struct ParseButtonError(pub String);

impl FromStr for Button {
    type Err = ParseButtonError;

    /// Parses a button name case-insensitively.
    ///
    /// `OK` is accepted for `ENTER` and `FF` for `FASTFORWARD`, matching the
    /// labels printed on the physical remote.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "OK" => return Ok(Button::Enter),
            "FF" | "FAST_FORWARD" | "FAST-FORWARD" => return Ok(Button::FastForward),
            _ => {}
        }
        Button::ALL
            .into_iter()
            .find(|b| b.as_str() == upper)
            .ok_or_else(|| ParseButtonError(s.to_string()))
    }
}

/// A one-shot request evaluated against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the session.  A `None` key lets the session reuse the key it
    /// already holds for the same address.
    Connect {
        address: String,
        pairing_key: Option<String>,
    },
    /// Close the session and forget the in-memory pairing key.
    Disconnect,
    VolumeUp,
    VolumeDown,
    /// Read the mute flag, then set its inverse (two device calls).
    ToggleMute,
    PowerOff,
    PressButton(Button),
    /// Ask the TV to launch the application with this device id.
    LaunchApp(String),
    /// Fetch the installed-application catalog.
    ListApps,
    /// Copy out the session snapshot.  Performs no device I/O.
    Status,
}

impl Command {
    /// Short, stable label used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Connect { .. } => "connect",
            Command::Disconnect => "disconnect",
            Command::VolumeUp => "volume_up",
            Command::VolumeDown => "volume_down",
            Command::ToggleMute => "toggle_mute",
            Command::PowerOff => "power_off",
            Command::PressButton(_) => "press_button",
            Command::LaunchApp(_) => "launch_app",
            Command::ListApps => "list_apps",
            Command::Status => "status",
        }
    }

    /// Whether evaluating the command requires a connected session.
    pub fn requires_connection(&self) -> bool {
        !matches!(
            self,
            Command::Connect { .. } | Command::Disconnect | Command::Status
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect { address, .. } => write!(f, "connect({address})"),
            Command::PressButton(b) => write!(f, "press_button({b})"),
            Command::LaunchApp(id) => write!(f, "launch_app({id})"),
            other => f.write_str(other.name()),
        }
    }
}

/// The result of successfully evaluating a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The device accepted the request; there is nothing to return.
    Done,
    /// The session is connected.  Carries the key the TV issued or confirmed.
    Connected { pairing_key: String },
    /// The installed-application catalog, in device order.
    Apps(Vec<AppCatalogEntry>),
    /// A snapshot of the session state.
    Status(SessionSnapshot),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
