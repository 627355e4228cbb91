//! Core data types for the chat store
//!
//! This module defines the persisted entities shared by the REST layer and
//! the hub's fan-out payloads:
//! - `User`: an authenticated chat participant
//! - `Room`: a named broadcast domain
//! - `ChatMessage`: one persisted chat message, optionally joined with its author

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated chat participant
///
/// Embedded verbatim in presence and message events, so the wire shape
/// matters: field names are stable and `created_at` is RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Server-assigned identifier (UUID v4 string)
    pub id: String,
    /// Display name, unique per user
    pub username: String,
    /// Avatar image URL (may be empty)
    pub avatar_url: String,
    /// When the user was first seen
    pub created_at: DateTime<Utc>,
}

/// A named broadcast domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    /// Server-assigned identifier (UUID v4 string)
    pub id: String,
    /// Human-readable room name
    pub name: String,
    /// Identifier of the creating user
    pub created_by: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Live member count, filled in by the API layer when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<usize>,
}

/// One persisted chat message
///
/// The `user` field is populated on history reads (joined with the author)
/// and omitted from JSON when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Server-assigned identifier (UUID v4 string)
    pub id: String,
    /// Room this message was sent to
    pub room_id: String,
    /// Identifier of the author
    pub user_id: String,
    /// Message text
    pub content: String,
    /// Server-side creation time
    pub created_at: DateTime<Utc>,
    /// Author record, when joined in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}
