//! Frame builders and parsers for LG's SSAP protocol.
//!
//! # Wire format (for beginners)
//!
//! webOS TVs expose a WebSocket endpoint at `ws://<tv>:3000/`.  Every message
//! in either direction is a JSON object:
//!
//! ```text
//! client → TV   {"type":"request","id":"<uuid>","uri":"ssap://audio/volumeUp"}
//! TV → client   {"type":"response","id":"<uuid>","payload":{"returnValue":true}}
//! ```
//!
//! The reply carries the request's `id`, which is how a client matches
//! replies to requests.  Registration is special:
//!
//! - The client sends `{"type":"register", "payload":{"client-key":..., "manifest":...}}`.
//! - If the key is missing or unknown the TV first answers with a `response`
//!   whose payload has `"pairingType":"PROMPT"` and shows a dialog on screen.
//! - Once the user accepts (or a known key was offered) the TV sends
//!   `{"type":"registered","payload":{"client-key":"..."}}`.
//!
//! Remote-control buttons do not go over this socket.  The client asks for a
//! second "pointer input" socket and writes plain-text frames to it:
//!
//! ```text
//! type:button
//! name:UP
//!
//! ```
//!
//! Everything in this module is pure: no I/O, just strings and JSON values.

use lgtv_core::{AppCatalogEntry, Button};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::application::device::DeviceClientError;

/// Default TCP port of the plain-text SSAP endpoint.
pub const DEFAULT_PORT: u16 = 3000;

pub const VOLUME_UP: &str = "ssap://audio/volumeUp";
pub const VOLUME_DOWN: &str = "ssap://audio/volumeDown";
pub const GET_MUTE: &str = "ssap://audio/getMute";
pub const SET_MUTE: &str = "ssap://audio/setMute";
pub const TURN_OFF: &str = "ssap://system/turnOff";
pub const LAUNCH: &str = "ssap://system.launcher/launch";
pub const LIST_APPS: &str = "ssap://com.webos.applicationManager/listApps";
pub const POINTER_INPUT_SOCKET: &str = "ssap://com.webos.service.networkinput/getPointerInputSocket";

/// Permissions requested when registering.  The TV lists them in the pairing
/// dialog.
const PERMISSIONS: &[&str] = &[
    "LAUNCH",
    "LAUNCH_WEBAPP",
    "APP_TO_APP",
    "CONTROL_AUDIO",
    "CONTROL_DISPLAY",
    "CONTROL_INPUT_JOYSTICK",
    "CONTROL_INPUT_MEDIA_PLAYBACK",
    "CONTROL_INPUT_MEDIA_RECORDING",
    "CONTROL_INPUT_TV",
    "CONTROL_MOUSE_AND_KEYBOARD",
    "CONTROL_POWER",
    "READ_INSTALLED_APPS",
    "READ_RUNNING_APPS",
    "READ_CURRENT_CHANNEL",
    "READ_INPUT_DEVICE_LIST",
    "READ_NETWORK_STATE",
];

/// The WebSocket URL of the SSAP endpoint on `address`.
pub fn endpoint_url(address: &str, port: u16) -> String {
    format!("ws://{address}:{port}/")
}

#[derive(Serialize)]
struct OutgoingFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl OutgoingFrame<'_> {
    fn to_text(&self) -> String {
        // Serializing a struct of strings and a `Value` cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A `request` frame for `uri` with an optional JSON payload.
pub fn request_frame(id: &str, uri: &str, payload: Option<Value>) -> String {
    OutgoingFrame {
        kind: "request",
        id,
        uri: Some(uri),
        payload,
    }
    .to_text()
}

/// The `register` frame.  `client_key` is omitted for a first pairing.
pub fn register_frame(id: &str, client_key: Option<&str>) -> String {
    let mut payload = json!({
        "forcePairing": false,
        "pairingType": "PROMPT",
        "manifest": {
            "manifestVersion": 1,
            "appVersion": env!("CARGO_PKG_VERSION"),
            "permissions": PERMISSIONS,
        },
    });
    if let Some(key) = client_key {
        payload["client-key"] = Value::String(key.to_string());
    }

    OutgoingFrame {
        kind: "register",
        id,
        uri: None,
        payload: Some(payload),
    }
    .to_text()
}

/// The text frame that presses `button` on the pointer-input socket.
pub fn button_frame(button: Button) -> String {
    format!("type:button\nname:{}\n\n", button.as_str())
}

// ── Incoming ──────────────────────────────────────────────────────────────────

/// Any JSON message the TV sends on the SSAP socket.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// What an [`Envelope`] means to a client waiting on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A successful `response`; carries its payload.
    Response(Value),
    /// The TV is showing its pairing dialog.  More replies will follow.
    PairingPrompt,
    /// Registration completed.
    Registered { client_key: String },
    /// The TV rejected the request.
    Error(String),
}

/// Parses one text frame.
pub fn parse_envelope(text: &str) -> Result<Envelope, DeviceClientError> {
    serde_json::from_str(text)
        .map_err(|e| DeviceClientError::Protocol(format!("malformed SSAP frame: {e}")))
}

/// Interprets an envelope.
///
/// A `response` whose payload reports `"returnValue": false` is an error even
/// though its type says otherwise.
pub fn classify(envelope: Envelope) -> Result<Reply, DeviceClientError> {
    match envelope.kind.as_str() {
        "response" => {
            if envelope.payload.get("pairingType").and_then(Value::as_str) == Some("PROMPT") {
                return Ok(Reply::PairingPrompt);
            }
            if envelope.payload.get("returnValue").and_then(Value::as_bool) == Some(false) {
                let text = envelope
                    .payload
                    .get("errorText")
                    .and_then(Value::as_str)
                    .unwrap_or("request failed");
                return Ok(Reply::Error(text.to_string()));
            }
            Ok(Reply::Response(envelope.payload))
        }
        "registered" => envelope
            .payload
            .get("client-key")
            .and_then(Value::as_str)
            .map(|key| Reply::Registered {
                client_key: key.to_string(),
            })
            .ok_or_else(|| DeviceClientError::Protocol("registered without a client-key".into())),
        "error" => Ok(Reply::Error(
            envelope.error.unwrap_or_else(|| "unknown error".to_string()),
        )),
        other => Err(DeviceClientError::Protocol(format!(
            "unexpected SSAP message type '{other}'"
        ))),
    }
}

/// Reads the mute flag from a `getMute` payload.
///
/// Older firmware answers `{"mute": true}`, newer firmware nests it as
/// `{"volumeStatus": {"muteStatus": true}}`.
pub fn mute_flag(payload: &Value) -> Result<bool, DeviceClientError> {
    payload
        .get("mute")
        .or_else(|| payload.get("muteStatus"))
        .or_else(|| payload.pointer("/volumeStatus/muteStatus"))
        .and_then(Value::as_bool)
        .ok_or_else(|| DeviceClientError::Protocol("getMute reply has no mute flag".into()))
}

#[derive(Deserialize)]
struct AppList {
    apps: Vec<AppRecord>,
}

#[derive(Deserialize)]
struct AppRecord {
    id: String,
    #[serde(default)]
    title: String,
}

/// Extracts the installed applications from a `listApps` payload, in order.
pub fn app_list(payload: &Value) -> Result<Vec<AppCatalogEntry>, DeviceClientError> {
    let list: AppList = serde_json::from_value(payload.clone())
        .map_err(|e| DeviceClientError::Protocol(format!("listApps reply: {e}")))?;
    Ok(list
        .apps
        .into_iter()
        .map(|app| AppCatalogEntry::new(app.id, app.title))
        .collect())
}

/// Extracts the pointer-input socket URL.
pub fn pointer_socket_path(payload: &Value) -> Result<String, DeviceClientError> {
    payload
        .get("socketPath")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DeviceClientError::Protocol("pointer socket reply has no socketPath".into()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
