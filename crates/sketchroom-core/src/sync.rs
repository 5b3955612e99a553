//! Relay protocol and WebSocket client.
//!
//! Every frame is a JSON object `{"event": <name>, "payload": <value>}`.
//! Clients join a room with `get-room`, receive its state as
//! `load-document`, publish full snapshots with `elements-change` and hear
//! about other peers' snapshots as `get-element-changes`.

use crate::canvas::Document;
use crate::room::RoomId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Messages sent to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join (or create) a room.
    GetRoom(RoomId),
    /// Full document after a completed gesture or an erase.
    ElementsChange(Document),
}

/// Messages received from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Room state sent in reply to `get-room`.
    LoadDocument(Document),
    /// Snapshot published by another peer in the room.
    GetElementChanges(Document),
    /// The relay could not handle a frame.
    Error(String),
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode a frame received from the relay.
pub fn parse_server_message(text: &str) -> Result<ServerMessage, SyncError> {
    Ok(serde_json::from_str(text)?)
}

/// Sync client errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid WebSocket URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Send failed: {0}")]
    Send(String),
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events from the WebSocket client
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Connected to the relay
    Connected,
    /// Disconnected from the relay
    Disconnected,
    /// Initial state of the joined room
    DocumentLoaded(Document),
    /// A peer published a new snapshot
    ElementsChanged(Document),
    /// Error occurred
    Error { message: String },
}

impl From<ServerMessage> for SyncEvent {
    fn from(message: ServerMessage) -> Self {
        match message {
            ServerMessage::LoadDocument(document) => SyncEvent::DocumentLoaded(document),
            ServerMessage::GetElementChanges(document) => SyncEvent::ElementsChanged(document),
            ServerMessage::Error(message) => SyncEvent::Error { message },
        }
    }
}

/// Outbound half of a relay connection.
pub trait Transport {
    /// Send a text frame.
    fn send(&self, message: &str) -> Result<(), SyncError>;

    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

// ============================================================================
// Native WebSocket Client
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// How long a read blocks before the thread checks for commands again.
    const READ_TIMEOUT: Duration = Duration::from_millis(50);
    const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// Blocking WebSocket client driven from a background thread.
    ///
    /// Events are collected and must be polled via `poll_events()`.
    pub struct NativeWebSocket {
        state: ConnectionState,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to a relay at a `ws://` or `wss://` URL.
        pub fn connect(&mut self, url: &str) -> Result<(), SyncError> {
            if self.cmd_tx.is_some() {
                return Err(SyncError::AlreadyConnected);
            }

            let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
            if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
                return Err(SyncError::UnsupportedScheme(parsed.scheme().to_string()));
            }

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();
            let url = url.to_string();

            let handle = thread::spawn(move || run_socket(&url, &cmd_rx, &event_tx));

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);
            Ok(())
        }

        /// Disconnect from the relay.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        /// Serialize and send a protocol message.
        pub fn send_message(&self, message: &ClientMessage) -> Result<(), SyncError> {
            self.send(&message.to_json()?)
        }

        /// Poll for pending events (non-blocking).
        pub fn poll_events(&mut self) -> Vec<SyncEvent> {
            let mut events = Vec::new();
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    match &event {
                        SyncEvent::Connected => self.state = ConnectionState::Connected,
                        SyncEvent::Disconnected => self.state = ConnectionState::Disconnected,
                        SyncEvent::Error { .. } if self.state != ConnectionState::Connected => {
                            self.state = ConnectionState::Error
                        }
                        _ => {}
                    }
                    events.push(event);
                }
            }
            events
        }
    }

    impl Transport for NativeWebSocket {
        fn send(&self, message: &str) -> Result<(), SyncError> {
            let tx = self.cmd_tx.as_ref().ok_or(SyncError::NotConnected)?;
            tx.send(WsCommand::Send(message.to_string()))
                .map_err(|e| SyncError::Send(e.to_string()))
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }

    fn run_socket(url: &str, cmd_rx: &Receiver<WsCommand>, event_tx: &Sender<SyncEvent>) {
        log::info!("WebSocket thread: connecting to {}", url);

        let mut socket = match connect(url) {
            Ok((socket, response)) => {
                log::info!("WebSocket connected, status: {}", response.status());
                socket
            }
            Err(e) => {
                log::error!("WebSocket connection failed: {}", e);
                let _ = event_tx.send(SyncEvent::Error {
                    message: format!("Connection failed: {}", e),
                });
                return;
            }
        };
        let _ = event_tx.send(SyncEvent::Connected);

        match socket.get_mut() {
            tungstenite::stream::MaybeTlsStream::Plain(tcp) => {
                let _ = tcp.set_read_timeout(Some(READ_TIMEOUT));
                let _ = tcp.set_write_timeout(Some(WRITE_TIMEOUT));
            }
            #[allow(unreachable_patterns)]
            _ => log::debug!("TLS or other stream - using default timeout handling"),
        }

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    log::debug!("WebSocket sending {} bytes", msg.len());
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("WebSocket send error: {}", e);
                        break;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => match parse_server_message(&txt) {
                    Ok(message) => {
                        let _ = event_tx.send(message.into());
                    }
                    Err(e) => log::warn!("Ignoring undecodable relay message: {}", e),
                },
                Ok(Message::Ping(data)) => {
                    let _ = socket.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => {
                    log::info!("WebSocket received close frame");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    log::error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }

        log::info!("WebSocket thread exiting");
        let _ = event_tx.send(SyncEvent::Disconnected);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_client::NativeWebSocket;
