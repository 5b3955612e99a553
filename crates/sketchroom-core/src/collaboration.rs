//! Collaboration management for shared rooms.
//!
//! Bridges a local [`Canvas`] and the relay. Local edits go out as whole
//! documents; whatever arrives from the relay replaces the local document
//! without merging, so the last snapshot published wins.

use crate::canvas::{Canvas, Document};
use crate::interaction::InputResponse;
use crate::room::RoomId;
use crate::sync::{ClientMessage, ConnectionState, SyncError, SyncEvent, Transport, parse_server_message};

/// Tracks the joined room and queues messages for the relay.
#[derive(Debug, Clone, Default)]
pub struct CollaborationManager {
    /// Current room (if joined).
    current_room: Option<RoomId>,
    /// Whether the room's initial document has arrived.
    loaded: bool,
    /// Pending outgoing messages.
    outgoing: Vec<ClientMessage>,
}

impl CollaborationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_room(&self) -> Option<&RoomId> {
        self.current_room.as_ref()
    }

    pub fn is_in_room(&self) -> bool {
        self.current_room.is_some()
    }

    /// Whether the joined room's document has been received.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Request to join a room. Queues the join message.
    pub fn join_room(&mut self, room: RoomId) {
        log::info!("Joining room {}", room);
        self.outgoing
            .retain(|message| !matches!(message, ClientMessage::GetRoom(_)));
        self.outgoing.push(ClientMessage::GetRoom(room.clone()));
        self.current_room = Some(room);
        self.loaded = false;
    }

    /// Queue a full snapshot of `document` for the room.
    pub fn publish(&mut self, document: &Document) {
        if self.current_room.is_none() {
            return;
        }
        self.outgoing
            .push(ClientMessage::ElementsChange(document.clone()));
    }

    /// Publish the canvas document if `response` asks for a broadcast.
    pub fn apply_response(&mut self, response: &InputResponse, canvas: &Canvas) {
        if response.broadcast {
            self.publish(canvas.document());
        }
    }

    /// Take pending outgoing messages (drains the queue).
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Send queued messages over `transport`.
    ///
    /// Without a connection, queued snapshots are discarded and editing goes
    /// on locally; only a pending join is kept for when the link comes up.
    /// Returns the number of frames handed to the transport.
    pub fn flush<T: Transport>(&mut self, transport: &T) -> Result<usize, SyncError> {
        match transport.state() {
            ConnectionState::Disconnected | ConnectionState::Error => {
                let before = self.outgoing.len();
                self.outgoing
                    .retain(|message| matches!(message, ClientMessage::GetRoom(_)));
                let dropped = before - self.outgoing.len();
                if dropped > 0 {
                    log::debug!("Offline: dropped {} outgoing snapshots", dropped);
                }
                Ok(0)
            }
            ConnectionState::Connecting | ConnectionState::Connected => {
                let pending = self.take_outgoing();
                let mut sent = 0;
                for (index, message) in pending.iter().enumerate() {
                    if let Err(e) = message.to_json().and_then(|json| transport.send(&json)) {
                        log::error!("Failed to send to relay: {}", e);
                        self.outgoing.extend_from_slice(&pending[index..]);
                        return Err(e);
                    }
                    sent += 1;
                }
                Ok(sent)
            }
        }
    }

    /// Decode a raw relay frame. Undecodable frames are logged and dropped.
    pub fn handle_message(&mut self, json: &str) -> Option<SyncEvent> {
        match parse_server_message(json) {
            Ok(message) => Some(message.into()),
            Err(e) => {
                log::warn!("Ignoring undecodable relay message: {}", e);
                None
            }
        }
    }

    /// Apply a relay event to `canvas`. Returns true if the document was replaced.
    pub fn handle_event(&mut self, event: SyncEvent, canvas: &mut Canvas) -> bool {
        match event {
            SyncEvent::Connected => {
                log::info!("Connected to relay");
                false
            }
            SyncEvent::Disconnected => {
                log::info!("Disconnected from relay, continuing locally");
                false
            }
            SyncEvent::DocumentLoaded(document) => {
                if self.current_room.is_none() {
                    log::warn!("Ignoring document for a room that was never joined");
                    return false;
                }
                canvas.load_document(document);
                self.loaded = true;
                true
            }
            SyncEvent::ElementsChanged(document) => {
                if self.current_room.is_none() {
                    return false;
                }
                canvas.replace_document(document);
                true
            }
            SyncEvent::Error { message } => {
                log::error!("Relay error: {}", message);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;
    use kurbo::Point;
    use std::cell::RefCell;

    struct RecordingTransport {
        state: ConnectionState,
        sent: RefCell<Vec<String>>,
    }

    impl RecordingTransport {
        fn new(state: ConnectionState) -> Self {
            Self {
                state,
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, message: &str) -> Result<(), SyncError> {
            self.sent.borrow_mut().push(message.to_string());
            Ok(())
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    fn draw_rect(canvas: &mut Canvas, from: (f64, f64), to: (f64, f64)) -> InputResponse {
        canvas.set_tool(ToolKind::Rectangle);
        canvas.pointer_down(Point::new(from.0, from.1));
        canvas.pointer_move(Point::new(to.0, to.1));
        canvas.pointer_up()
    }

    /// Stand-in relay: deliver each sender's snapshots to every other peer.
    fn relay(from: &mut CollaborationManager, peers: &mut [(&mut CollaborationManager, &mut Canvas)]) {
        for message in from.take_outgoing() {
            if let ClientMessage::ElementsChange(document) = message {
                for (manager, canvas) in peers.iter_mut() {
                    manager.handle_event(SyncEvent::ElementsChanged(document.clone()), canvas);
                }
            }
        }
    }

    #[test]
    fn test_join_then_load() {
        let mut manager = CollaborationManager::new();
        let mut canvas = Canvas::new();
        manager.join_room(RoomId::new("room"));
        assert!(matches!(
            manager.take_outgoing().as_slice(),
            [ClientMessage::GetRoom(room)] if room.as_str() == "room"
        ));

        let remote = Document::from_json(
            r##"[{"type":"line","elementId":4,"strokeColor":"#000000","strokeWidth":3,"x1":0,"y1":0,"x2":5,"y2":5}]"##,
        )
        .unwrap();
        assert!(manager.handle_event(SyncEvent::DocumentLoaded(remote.clone()), &mut canvas));
        assert!(manager.is_loaded());
        assert_eq!(canvas.document(), &remote);
        assert!(!canvas.history().can_undo());
    }

    #[test]
    fn test_publish_only_when_broadcast() {
        let mut manager = CollaborationManager::new();
        let mut canvas = Canvas::new();
        manager.join_room(RoomId::new("room"));
        manager.take_outgoing();

        canvas.set_tool(ToolKind::Pen);
        let down = canvas.pointer_down(Point::new(0.0, 0.0));
        manager.apply_response(&down, &canvas);
        assert!(!manager.has_outgoing());

        let up = canvas.pointer_up();
        manager.apply_response(&up, &canvas);
        assert_eq!(
            manager.take_outgoing(),
            vec![ClientMessage::ElementsChange(canvas.document().clone())]
        );
    }

    #[test]
    fn test_publish_outside_room_is_noop() {
        let mut manager = CollaborationManager::new();
        manager.publish(&Document::new());
        assert!(!manager.has_outgoing());
    }

    #[test]
    fn test_last_write_wins() {
        let (mut ma, mut mb, mut mc) = (
            CollaborationManager::new(),
            CollaborationManager::new(),
            CollaborationManager::new(),
        );
        let (mut a, mut b, mut c) = (Canvas::new(), Canvas::new(), Canvas::new());
        for manager in [&mut ma, &mut mb, &mut mc] {
            manager.join_room(RoomId::new("shared"));
            manager.take_outgoing();
        }

        let response = draw_rect(&mut a, (0.0, 0.0), (10.0, 10.0));
        ma.apply_response(&response, &a);
        relay(&mut ma, &mut [(&mut mb, &mut b), (&mut mc, &mut c)]);

        let response = draw_rect(&mut b, (50.0, 50.0), (80.0, 90.0));
        mb.apply_response(&response, &b);
        let d2 = b.document().clone();
        relay(&mut mb, &mut [(&mut ma, &mut a), (&mut mc, &mut c)]);

        assert_eq!(a.document(), &d2);
        assert_eq!(c.document(), &d2);
        assert_eq!(d2.len(), 2);
    }

    #[test]
    fn test_flush_offline_drops_snapshots() {
        let mut manager = CollaborationManager::new();
        manager.join_room(RoomId::new("room"));
        manager.publish(&Document::new());

        let offline = RecordingTransport::new(ConnectionState::Disconnected);
        assert_eq!(manager.flush(&offline).unwrap(), 0);
        assert!(offline.sent.borrow().is_empty());
        assert_eq!(manager.take_outgoing().len(), 1);
    }

    #[test]
    fn test_flush_sends_in_order() {
        let mut manager = CollaborationManager::new();
        manager.join_room(RoomId::new("room"));
        manager.publish(&Document::new());

        let online = RecordingTransport::new(ConnectionState::Connected);
        assert_eq!(manager.flush(&online).unwrap(), 2);
        let sent = online.sent.borrow();
        assert!(sent[0].contains("get-room"));
        assert!(sent[1].contains("elements-change"));
        assert!(!manager.has_outgoing());
    }

    #[test]
    fn test_undecodable_message_ignored() {
        let mut manager = CollaborationManager::new();
        assert!(manager.handle_message("not json").is_none());
        let event = manager.handle_message(r#"{"event":"load-document","payload":[]}"#);
        assert_eq!(event, Some(SyncEvent::DocumentLoaded(Document::new())));
    }

    #[test]
    fn test_changes_before_join_ignored() {
        let mut manager = CollaborationManager::new();
        let mut canvas = Canvas::new();
        let remote = Document::from_json("[]").unwrap();
        assert!(!manager.handle_event(SyncEvent::ElementsChanged(remote), &mut canvas));
    }
}
