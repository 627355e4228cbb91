//! Chat Relay Hub
//!
//! Tracks every live WebSocket session together with room membership and
//! fans chat events out to room members. All session and room state lives
//! behind one `RwLock`; every mutation, including slow-consumer eviction
//! during a broadcast, happens under its write side.
//!
//! Each session owns a bounded outbound queue. A member whose queue is full
//! at broadcast time has the queue closed and is dropped from the room, but
//! stays in the session registry until its connection task unregisters it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::events::{self, ClientEvent, ServerEvent};
use crate::store::{MessageStore, User};

/// Unique identifier for a WebSocket session
pub type SessionId = String;

/// Manages all WebSocket sessions and room membership
pub struct ChatHub {
    /// Sessions and rooms under a single lock
    state: RwLock<HubState>,
    /// Message persistence, consulted on every send_message
    store: Arc<dyn MessageStore>,
    /// Configuration
    config: HubConfig,
}

/// Session registry and room membership index
#[derive(Default)]
struct HubState {
    /// Active sessions: SessionId → SessionHandle
    sessions: HashMap<SessionId, SessionHandle>,
    /// Room membership: room id → set of SessionIds
    rooms: HashMap<String, HashSet<SessionId>>,
}

/// Per-session bookkeeping held by the hub
struct SessionHandle {
    /// The authenticated user behind this session
    user: Arc<User>,
    /// Room this session currently believes it is in
    room: Option<String>,
    /// Outbound queue; `None` once the queue has been closed
    sender: Option<mpsc::Sender<Arc<str>>>,
}

/// Configuration for the relay hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of each session's outbound queue
    pub session_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            session_queue_capacity: 256,
        }
    }
}

impl HubState {
    /// Drop a member from a room, pruning the room once empty
    fn remove_member(&mut self, room_id: &str, id: &str) {
        if let Some(members) = self.rooms.get_mut(room_id) {
            members.remove(id);
            if members.is_empty() {
                self.rooms.remove(room_id);
            }
        }
    }
}

impl ChatHub {
    /// Create a new relay hub
    pub fn new(store: Arc<dyn MessageStore>, config: HubConfig) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            store,
            config,
        }
    }

    /// Register a new WebSocket session for the given user
    ///
    /// Returns the session ID and the receiving end of the session's
    /// outbound queue; the connection's writer task drains it until the hub
    /// closes the queue.
    pub async fn register(&self, user: User) -> (SessionId, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(self.config.session_queue_capacity);
        let id = Uuid::new_v4().to_string();
        let username = user.username.clone();

        let handle = SessionHandle {
            user: Arc::new(user),
            room: None,
            sender: Some(tx),
        };
        self.state.write().await.sessions.insert(id.clone(), handle);

        tracing::info!(session_id = %id, username = %username, "WebSocket session opened");
        (id, rx)
    }

    /// Unregister a session and drop it from its current room
    ///
    /// Departure is silent: remaining members see no user_left, only the
    /// next membership snapshot. Closing the queue here ends the session's
    /// writer task once it has drained.
    pub async fn unregister(&self, id: &str) {
        let mut state = self.state.write().await;
        if let Some(handle) = state.sessions.remove(id) {
            if let Some(room_id) = handle.room {
                state.remove_member(&room_id, id);
            }
        }
        drop(state);

        tracing::info!(session_id = %id, "WebSocket session closed");
    }

    /// Decode and dispatch one inbound text frame
    ///
    /// Undecodable join and send frames are answered with an `Invalid
    /// payload` error event; all other undecodable frames are dropped.
    pub async fn dispatch_text(&self, id: &str, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(id, event).await,
            Err(e) => {
                tracing::debug!(session_id = %id, error = %e, "Undecodable client event");
                if events::reports_invalid_payload(text) {
                    self.send_error(id, "Invalid payload").await;
                }
            }
        }
    }

    /// Dispatch one decoded client event
    pub async fn dispatch(&self, id: &str, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room_id } => self.handle_join_room(id, room_id).await,
            ClientEvent::LeaveRoom { room_id } => self.handle_leave_room(id, room_id).await,
            ClientEvent::SendMessage { room_id, content } => {
                self.handle_send_message(id, room_id, content).await
            }
            ClientEvent::Typing { room_id, is_typing } => {
                self.handle_typing(id, room_id, is_typing).await
            }
        }
    }

    /// Move a session into a room, leaving its current one silently
    async fn handle_join_room(&self, id: &str, room_id: String) {
        let mut state = self.state.write().await;
        let (user, old_room) = match state.sessions.get_mut(id) {
            Some(handle) => (Arc::clone(&handle.user), handle.room.replace(room_id.clone())),
            None => return,
        };

        // No user_left for the room being abandoned; switching is silent.
        if let Some(old) = old_room {
            state.remove_member(&old, id);
        }
        state
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(id.to_string());
        drop(state);

        tracing::debug!(session_id = %id, room_id = %room_id, "Joined room");

        let event = ServerEvent::UserJoined {
            room_id: room_id.clone(),
            user: (*user).clone(),
        };
        self.broadcast_to_room(&room_id, &event, Some(id)).await;
        self.send_online_users(&room_id).await;
    }

    /// Remove a session from the room named in the event
    ///
    /// The session's own room marker is cleared regardless of which room id
    /// the client supplied; the departure events go to the supplied room.
    async fn handle_leave_room(&self, id: &str, room_id: String) {
        let mut state = self.state.write().await;
        let user = match state.sessions.get_mut(id) {
            Some(handle) => {
                handle.room = None;
                Arc::clone(&handle.user)
            }
            None => return,
        };
        state.remove_member(&room_id, id);
        drop(state);

        tracing::debug!(session_id = %id, room_id = %room_id, "Left room");

        let event = ServerEvent::UserLeft {
            room_id: room_id.clone(),
            user: (*user).clone(),
        };
        self.broadcast_to_room(&room_id, &event, None).await;
        self.send_online_users(&room_id).await;
    }

    /// Persist a chat message, then relay it to the target room
    async fn handle_send_message(&self, id: &str, room_id: String, content: String) {
        if content.is_empty() || room_id.is_empty() {
            self.send_error(id, "Message content and room ID are required")
                .await;
            return;
        }

        let user = match self.state.read().await.sessions.get(id) {
            Some(handle) => Arc::clone(&handle.user),
            None => return,
        };

        match self.store.create_message(&room_id, &user.id, &content).await {
            Ok(saved) => {
                let event = ServerEvent::Message {
                    id: saved.id,
                    room_id: saved.room_id,
                    content: saved.content,
                    user: (*user).clone(),
                    created_at: saved.created_at,
                };
                // The sender is a recipient too, if they are in the room.
                self.broadcast_to_room(&room_id, &event, None).await;
            }
            Err(e) => {
                tracing::error!(
                    session_id = %id,
                    room_id = %room_id,
                    error = %e,
                    "Failed to persist message"
                );
                self.send_error(id, "Failed to save message").await;
            }
        }
    }

    /// Relay a typing indicator to everyone else in the room
    async fn handle_typing(&self, id: &str, room_id: String, is_typing: bool) {
        let user = match self.state.read().await.sessions.get(id) {
            Some(handle) => Arc::clone(&handle.user),
            None => return,
        };

        let event = ServerEvent::Typing {
            room_id: room_id.clone(),
            user: (*user).clone(),
            is_typing,
        };
        self.broadcast_to_room(&room_id, &event, Some(id)).await;
    }

    /// Fan one event out to a room's members
    ///
    /// The event is serialized once and the encoded frame shared across
    /// recipients. A member whose queue is full is evicted: the queue is
    /// closed and the member leaves the room, though its registry entry
    /// survives until the connection task unregisters.
    pub async fn broadcast_to_room(
        &self,
        room_id: &str,
        event: &ServerEvent,
        exclude: Option<&str>,
    ) {
        let Some(payload) = encode(event) else { return };

        let mut state = self.state.write().await;
        let Some(members) = state.rooms.get(room_id) else {
            return;
        };
        let targets: Vec<SessionId> = members
            .iter()
            .filter(|m| exclude != Some(m.as_str()))
            .cloned()
            .collect();

        let mut sent = 0usize;
        for target in &targets {
            let tx = match state.sessions.get(target).and_then(|h| h.sender.clone()) {
                Some(tx) => tx,
                None => continue,
            };

            match tx.try_send(Arc::clone(&payload)) {
                Ok(()) => sent += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if let Some(handle) = state.sessions.get_mut(target) {
                        handle.sender = None;
                    }
                    state.remove_member(room_id, target);
                    tracing::warn!(
                        session_id = %target,
                        room_id = %room_id,
                        "Evicted slow consumer"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        if sent > 0 {
            tracing::trace!(room_id = %room_id, recipients = sent, "Broadcast event");
        }
    }

    /// Send the room's membership snapshot to everyone in it
    ///
    /// The snapshot is taken under a read lock that is released before the
    /// broadcast re-acquires the write side, so a membership change in
    /// between can make the list momentarily stale.
    pub async fn send_online_users(&self, room_id: &str) {
        let users: Vec<User> = {
            let state = self.state.read().await;
            let Some(members) = state.rooms.get(room_id) else {
                return;
            };
            members
                .iter()
                .filter_map(|id| state.sessions.get(id))
                .map(|handle| (*handle.user).clone())
                .collect()
        };

        let event = ServerEvent::OnlineUsers {
            room_id: room_id.to_string(),
            users,
        };
        self.broadcast_to_room(room_id, &event, None).await;
    }

    /// Send an error event to a single session
    pub async fn send_error(&self, id: &str, message: &str) {
        let event = ServerEvent::Error {
            message: message.to_string(),
        };
        let Some(payload) = encode(&event) else { return };

        let tx = {
            let state = self.state.read().await;
            match state.sessions.get(id).and_then(|h| h.sender.clone()) {
                Some(tx) => tx,
                None => return,
            }
        };

        // Waits for queue space rather than evicting: the error concerns
        // only this session.
        if tx.send(payload).await.is_err() {
            tracing::debug!(session_id = %id, "Error event dropped, queue closed");
        }
    }

    /// Get the current session count
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Get the number of rooms with at least one member
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    /// Get the member count for a room
    pub async fn room_member_count(&self, room_id: &str) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(room_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

/// Serialize a server event to a frame shared across recipients
fn encode(event: &ServerEvent) -> Option<Arc<str>> {
    match serde_json::to_string(event) {
        Ok(text) => Some(text.into()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize server event");
            None
        }
    }
}
