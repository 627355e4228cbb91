//! Chat Event Types
//!
//! Defines the JSON envelope spoken over every WebSocket session. Each frame
//! is `{"type": "<event>", "payload": {...}}`; the enums below decode and
//! encode that shape in a single step via serde's adjacent tagging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::User;

/// Events sent from client to server
///
/// Missing payload fields decode as empty values; whether an empty
/// `room_id` is usable is decided by the hub, not here.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Enter a room, implicitly leaving the current one
    JoinRoom {
        #[serde(default)]
        room_id: String,
    },
    /// Leave the named room
    LeaveRoom {
        #[serde(default)]
        room_id: String,
    },
    /// Send a chat message to a room
    SendMessage {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        content: String,
    },
    /// Typing indicator, relayed without persistence
    Typing {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        is_typing: bool,
    },
}

/// Events sent from server to client
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A persisted chat message
    Message {
        id: String,
        room_id: String,
        content: String,
        user: User,
        created_at: DateTime<Utc>,
    },
    /// Someone entered the room
    UserJoined { room_id: String, user: User },
    /// Someone left the room
    UserLeft { room_id: String, user: User },
    /// Relayed typing indicator
    Typing {
        room_id: String,
        user: User,
        is_typing: bool,
    },
    /// Snapshot of the room's current members
    OnlineUsers { room_id: String, users: Vec<User> },
    /// Error delivered to a single session
    Error { message: String },
}

/// Minimal view of an inbound frame, used only after full decoding fails
#[derive(Deserialize)]
struct EventTag {
    #[serde(rename = "type")]
    kind: String,
}

/// Whether a frame that failed to decode should be answered with an error
///
/// Join and send requests report `Invalid payload` back to the sender;
/// malformed leave or typing frames (and unknown types) are dropped.
pub fn reports_invalid_payload(text: &str) -> bool {
    match serde_json::from_str::<EventTag>(text) {
        Ok(tag) => matches!(tag.kind.as_str(), "join_room" | "send_message"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_deserialize_join_room() {
        let json = r#"{"type": "join_room", "payload": {"room_id": "room-1"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_id: "room-1".to_string()
            }
        );
    }

    #[test]
    fn test_client_event_deserialize_send_message() {
        let json =
            r#"{"type": "send_message", "payload": {"room_id": "room-1", "content": "hello"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::SendMessage { room_id, content } => {
                assert_eq!(room_id, "room-1");
                assert_eq!(content, "hello");
            }
            other => panic!("Expected SendMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_client_event_deserialize_typing() {
        let json = r#"{"type": "typing", "payload": {"room_id": "room-1", "is_typing": true}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::Typing {
                room_id: "room-1".to_string(),
                is_typing: true
            }
        );
    }

    #[test]
    fn test_client_event_missing_fields_default() {
        // Fields absent from the payload come back empty rather than failing.
        let json = r#"{"type": "send_message", "payload": {}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::SendMessage {
                room_id: String::new(),
                content: String::new()
            }
        );
    }

    #[test]
    fn test_client_event_rejects_unknown_type() {
        let json = r#"{"type": "shout", "payload": {"room_id": "room-1"}}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn test_server_event_serialize_error() {
        let event = ServerEvent::Error {
            message: "Invalid payload".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"error","payload":{"message":"Invalid payload"}}"#
        );
    }

    #[test]
    fn test_server_event_serialize_online_users() {
        let event = ServerEvent::OnlineUsers {
            room_id: "room-1".to_string(),
            users: Vec::new(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"online_users","payload":{"room_id":"room-1","users":[]}}"#
        );
    }

    #[test]
    fn test_server_event_serialize_user_joined() {
        let user = User {
            id: "u1".to_string(),
            username: "ada".to_string(),
            avatar_url: "".to_string(),
            created_at: Utc::now(),
        };
        let event = ServerEvent::UserJoined {
            room_id: "room-1".to_string(),
            user,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"user_joined""#));
        assert!(json.contains(r#""room_id":"room-1""#));
        assert!(json.contains(r#""username":"ada""#));
    }

    #[test]
    fn test_reports_invalid_payload_policy() {
        // Bad payloads on join and send are reported back.
        assert!(reports_invalid_payload(
            r#"{"type": "join_room", "payload": {"room_id": 42}}"#
        ));
        assert!(reports_invalid_payload(
            r#"{"type": "send_message", "payload": []}"#
        ));

        // Everything else fails silently.
        assert!(!reports_invalid_payload(
            r#"{"type": "leave_room", "payload": {"room_id": 42}}"#
        ));
        assert!(!reports_invalid_payload(
            r#"{"type": "typing", "payload": {"is_typing": "yes"}}"#
        ));
        assert!(!reports_invalid_payload(r#"{"type": "shout"}"#));
        assert!(!reports_invalid_payload("not json at all"));
        assert!(!reports_invalid_payload(r#"{"payload": {}}"#));
    }
}
