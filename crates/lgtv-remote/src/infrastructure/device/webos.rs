//! `DeviceClient` implementation for LG webOS TVs.
//!
//! Talks SSAP over a WebSocket opened with `tokio-tungstenite`.  The frame
//! formats live in [`super::ssap`]; this module only owns the sockets and the
//! request/reply matching.
//!
//! # Sockets
//!
//! - The **SSAP socket** (`ws://<tv>:3000/`) is opened by `connect` and
//!   carries every request.
//! - The **pointer socket** is only needed for buttons.  Its URL is fetched
//!   from the TV the first time a button is pressed, then kept open until
//!   `disconnect`.
//!
//! # Timeouts
//!
//! Every request waits at most `request_timeout` for its reply.  Registration
//! with a stored key uses the same limit.  A first pairing waits up to
//! `pairing_timeout`, since a person has to walk to the TV and press OK.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use lgtv_core::{AppCatalogEntry, Button};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::ssap::{self, Reply};
use crate::application::device::{DeviceClient, DeviceClientError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection parameters for [`WebOsClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebOsConfig {
    /// TCP port of the SSAP endpoint.
    pub port: u16,
    /// Upper bound on any single request, including socket setup.
    pub request_timeout: Duration,
    /// Upper bound on a first pairing (user must accept on the TV).
    pub pairing_timeout: Duration,
}

impl Default for WebOsConfig {
    fn default() -> Self {
        Self {
            port: ssap::DEFAULT_PORT,
            request_timeout: Duration::from_secs(10),
            pairing_timeout: Duration::from_secs(60),
        }
    }
}

/// SSAP client for one TV.
pub struct WebOsClient {
    config: WebOsConfig,
    ssap: Option<WsStream>,
    pointer: Option<WsStream>,
}

impl WebOsClient {
    pub fn new(config: WebOsConfig) -> Self {
        Self {
            config,
            ssap: None,
            pointer: None,
        }
    }

    async fn open(url: &str, timeout: Duration) -> Result<WsStream, DeviceClientError> {
        let (ws, _response) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| DeviceClientError::Timeout)?
            .map_err(|e| DeviceClientError::Transport(format!("{url}: {e}")))?;
        debug!("websocket open: {url}");
        Ok(ws)
    }

    /// Sends one request and waits for the reply with the same id.
    async fn request(&mut self, uri: &str, payload: Option<Value>) -> Result<Value, DeviceClientError> {
        let timeout = self.config.request_timeout;
        let ws = self
            .ssap
            .as_mut()
            .ok_or_else(|| DeviceClientError::Transport("not connected".into()))?;
        let id = Uuid::new_v4().to_string();

        send_text(ws, ssap::request_frame(&id, uri, payload)).await?;
        trace!("sent {uri} as {id}");

        let reply = tokio::time::timeout(timeout, next_reply(ws, &id))
            .await
            .map_err(|_| DeviceClientError::Timeout)??;
        match reply {
            Reply::Response(payload) => Ok(payload),
            Reply::Error(text) => Err(DeviceClientError::Protocol(format!("{uri}: {text}"))),
            other => Err(DeviceClientError::Protocol(format!(
                "{uri}: unexpected reply {other:?}"
            ))),
        }
    }

    async fn pointer_socket(&mut self) -> Result<&mut WsStream, DeviceClientError> {
        if self.pointer.is_none() {
            let payload = self.request(ssap::POINTER_INPUT_SOCKET, None).await?;
            let url = ssap::pointer_socket_path(&payload)?;
            let ws = Self::open(&url, self.config.request_timeout).await?;
            self.pointer = Some(ws);
        }
        self.pointer
            .as_mut()
            .ok_or_else(|| DeviceClientError::Transport("pointer socket unavailable".into()))
    }

    async fn register(
        ws: &mut WsStream,
        pairing_key: Option<&str>,
        deadline: Duration,
    ) -> Result<String, DeviceClientError> {
        let id = Uuid::new_v4().to_string();
        send_text(ws, ssap::register_frame(&id, pairing_key)).await?;

        let wait = async {
            loop {
                match next_reply(ws, &id).await? {
                    Reply::Registered { client_key } => {
                        return Ok::<_, DeviceClientError>(client_key)
                    }
                    Reply::PairingPrompt if pairing_key.is_some() => {
                        return Err(DeviceClientError::AuthRequired)
                    }
                    Reply::PairingPrompt => {
                        info!("pairing prompt shown on the TV; waiting up to {deadline:?} for acceptance")
                    }
                    Reply::Error(text) => {
                        return Err(DeviceClientError::Protocol(format!("registration refused: {text}")))
                    }
                    Reply::Response(_) => trace!("ignoring interim registration response"),
                }
            }
        };
        tokio::time::timeout(deadline, wait)
            .await
            .map_err(|_| DeviceClientError::Timeout)?
    }
}

#[async_trait]
impl DeviceClient for WebOsClient {
    async fn connect(
        &mut self,
        address: &str,
        pairing_key: Option<String>,
    ) -> Result<String, DeviceClientError> {
        self.disconnect().await?;

        let url = ssap::endpoint_url(address, self.config.port);
        let mut ws = Self::open(&url, self.config.request_timeout).await?;
        let deadline = if pairing_key.is_some() {
            self.config.request_timeout
        } else {
            self.config.pairing_timeout
        };

        match Self::register(&mut ws, pairing_key.as_deref(), deadline).await {
            Ok(key) => {
                self.ssap = Some(ws);
                Ok(key)
            }
            Err(e) => {
                if let Err(close_err) = ws.close(None).await {
                    debug!("closing rejected socket failed: {close_err}");
                }
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), DeviceClientError> {
        for mut ws in [self.pointer.take(), self.ssap.take()].into_iter().flatten() {
            if let Err(e) = ws.close(None).await {
                debug!("websocket close failed: {e}");
            }
        }
        Ok(())
    }

    async fn button(&mut self, button: Button) -> Result<(), DeviceClientError> {
        let frame = ssap::button_frame(button);
        let result = {
            let ws = self.pointer_socket().await?;
            send_text(ws, frame).await
        };
        if result.is_err() {
            // A dead pointer socket is reopened on the next press.
            warn!("pointer socket write failed; it will be reopened");
            self.pointer = None;
        }
        result
    }

    async fn volume_up(&mut self) -> Result<(), DeviceClientError> {
        self.request(ssap::VOLUME_UP, None).await.map(drop)
    }

    async fn volume_down(&mut self) -> Result<(), DeviceClientError> {
        self.request(ssap::VOLUME_DOWN, None).await.map(drop)
    }

    async fn get_muted(&mut self) -> Result<bool, DeviceClientError> {
        let payload = self.request(ssap::GET_MUTE, None).await?;
        ssap::mute_flag(&payload)
    }

    async fn set_mute(&mut self, muted: bool) -> Result<(), DeviceClientError> {
        self.request(ssap::SET_MUTE, Some(json!({ "mute": muted })))
            .await
            .map(drop)
    }

    async fn launch_app(&mut self, app_id: &str) -> Result<(), DeviceClientError> {
        self.request(ssap::LAUNCH, Some(json!({ "id": app_id })))
            .await
            .map(drop)
    }

    async fn list_apps(&mut self) -> Result<Vec<AppCatalogEntry>, DeviceClientError> {
        let payload = self.request(ssap::LIST_APPS, None).await?;
        ssap::app_list(&payload)
    }

    async fn power_off(&mut self) -> Result<(), DeviceClientError> {
        let result = self.request(ssap::TURN_OFF, None).await.map(drop);
        // The TV drops the socket as it powers down.
        self.pointer = None;
        result
    }
}

async fn send_text(ws: &mut WsStream, text: String) -> Result<(), DeviceClientError> {
    ws.send(Message::Text(text))
        .await
        .map_err(|e| DeviceClientError::Transport(e.to_string()))
}

/// Reads frames until one carries `id`.  Frames for other ids are skipped.
async fn next_reply(ws: &mut WsStream, id: &str) -> Result<Reply, DeviceClientError> {
    loop {
        let message = ws
            .next()
            .await
            .ok_or_else(|| DeviceClientError::Transport("connection closed by the TV".into()))?
            .map_err(|e| DeviceClientError::Transport(e.to_string()))?;

        match message {
            Message::Text(text) => {
                let envelope = ssap::parse_envelope(&text)?;
                if envelope.id.as_deref() != Some(id) {
                    trace!("skipping frame for id {:?}", envelope.id);
                    continue;
                }
                return ssap::classify(envelope);
            }
            Message::Close(frame) => {
                return Err(DeviceClientError::Transport(format!(
                    "TV closed the connection: {frame:?}"
                )))
            }
            // Ping/pong is answered by tungstenite itself.
            _ => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
