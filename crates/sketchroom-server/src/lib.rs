//! Sketchroom WebSocket Relay Server
//!
//! Holds the last document of every room and rebroadcasts each published
//! snapshot to the other peers in that room.
//!
//! ## Protocol
//!
//! Frames are JSON objects of the form `{"event": ..., "payload": ...}`:
//! ```json
//! { "event": "get-room", "payload": "room-id" }
//! { "event": "elements-change", "payload": [ ...elements ] }
//! ```
//! The relay answers `get-room` with `load-document` and forwards every
//! `elements-change` to the rest of the room as `get-element-changes`.

pub mod config;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Redirect},
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use sketchroom_core::{ClientMessage, Document, RoomId, ServerMessage};
use std::{collections::HashSet, sync::Arc};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use config::ServerConfig;

type RoomMessage = (String, ServerMessage);

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<RoomMessage>,
    /// Connected peer IDs
    peers: HashSet<String>,
    /// Last published document (for new joiners)
    document: Document,
}

impl Room {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            peers: HashSet::new(),
            document: Document::new(),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Active rooms
    rooms: DashMap<RoomId, Room>,
    channel_capacity: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default().channel_capacity)
    }
}

impl AppState {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Number of rooms with at least one peer.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Last document published to `room`; empty if the room is unknown.
    pub fn document(&self, room: &RoomId) -> Document {
        self.rooms
            .get(room)
            .map(|room| room.document.clone())
            .unwrap_or_default()
    }

    /// Add peer to room, creating it if needed.
    fn join_room(&self, room_id: &RoomId, peer_id: &str) -> (broadcast::Receiver<RoomMessage>, Document, usize) {
        let mut room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(self.channel_capacity));
        room.peers.insert(peer_id.to_string());
        (room.tx.subscribe(), room.document.clone(), room.peers.len())
    }

    /// Remove peer from room, dropping the room once it is empty.
    fn leave_room(&self, room_id: &RoomId, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
        }
        if self
            .rooms
            .remove_if(room_id, |_, room| room.peers.is_empty())
            .is_some()
        {
            info!("Room {} closed", room_id);
        }
    }

    /// Store `document` as the room's state and forward it to the other peers.
    fn publish(&self, room_id: &RoomId, from: &str, document: Document) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.document = document.clone();
            let _ = room
                .tx
                .send((from.to_string(), ServerMessage::GetElementChanges(document)));
        }
    }
}

/// Build the relay's HTTP and WebSocket routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/documents", get(new_document))
        .route("/documents/{id}", get(get_document))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "Sketchroom Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Send the client to a freshly generated room.
async fn new_document() -> Redirect {
    let room = RoomId::generate();
    Redirect::temporary(&room.path())
}

/// Current document of a room as JSON.
async fn get_document(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<Document> {
    Json(state.document(&RoomId::new(id)))
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serialize and send one frame. Returns false once the peer is gone.
async fn send_message(sender: &mut SplitSink<WebSocket, Message>, message: &ServerMessage) -> bool {
    match message.to_json() {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode message: {}", e);
            true
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut current_room: Option<RoomId> = None;
    let mut room_rx: Option<broadcast::Receiver<RoomMessage>> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(ClientMessage::GetRoom(room)) => {
                                let document = if current_room.as_ref() == Some(&room) {
                                    debug!("Peer {} reloading room {}", peer_id, room);
                                    state.document(&room)
                                } else {
                                    let (rx, document, peer_count) = state.join_room(&room, &peer_id);
                                    room_rx = Some(rx);
                                    info!("Peer {} joined room {} ({} peers)", peer_id, room, peer_count);
                                    if let Some(old_room) = current_room.replace(room) {
                                        state.leave_room(&old_room, &peer_id);
                                    }
                                    document
                                };

                                if !send_message(&mut sender, &ServerMessage::LoadDocument(document)).await {
                                    break;
                                }
                            }
                            Ok(ClientMessage::ElementsChange(document)) => {
                                match current_room {
                                    Some(ref room) => {
                                        debug!("Peer {} published {} elements to {}", peer_id, document.len(), room);
                                        state.publish(room, &peer_id, document);
                                    }
                                    None => debug!("Ignoring elements-change from {} before get-room", peer_id),
                                }
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                let err = ServerMessage::Error(format!("Invalid message: {}", e));
                                if !send_message(&mut sender, &err).await {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {} // Ignore binary, ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            msg = async {
                match &mut room_rx {
                    Some(rx) => Some(rx.recv().await),
                    None => std::future::pending::<Option<Result<RoomMessage, RecvError>>>().await,
                }
            } => {
                match msg {
                    Some(Ok((from, server_msg))) => {
                        // Don't echo back to sender
                        if from != peer_id && !send_message(&mut sender, &server_msg).await {
                            break;
                        }
                    }
                    Some(Err(RecvError::Lagged(skipped))) => {
                        warn!("Peer {} lagged behind by {} messages", peer_id, skipped);
                    }
                    Some(Err(RecvError::Closed)) | None => {
                        room_rx = None;
                    }
                }
            }
        }
    }

    if let Some(ref room) = current_room {
        state.leave_room(room, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}
