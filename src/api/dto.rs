//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.
//!
//! Rooms, users and messages serialize as their store types; only the
//! shapes specific to an endpoint live here.

use serde::{Deserialize, Serialize};

use crate::store::User;

// ============================================
// AUTH DTOs
// ============================================

/// Login request
///
/// Logging in with a known username returns that user; an unknown one is
/// created on the spot.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Display name, unique per user
    pub username: String,
    /// Optional avatar image URL
    #[serde(default)]
    pub avatar_url: String,
}

/// Login response: a session token plus the resolved user
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Signed session token
    pub token: String,
    /// The user the token belongs to
    pub user: User,
}

// ============================================
// ROOM DTOs
// ============================================

/// Create room request
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Room display name
    pub name: String,
}

/// Message history query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Maximum number of messages to return
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of messages to skip from the start of history
    #[serde(default)]
    pub offset: Option<usize>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Database status
    pub database: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Live WebSocket session count
    pub sessions: usize,
    /// Rooms with at least one live member
    pub rooms: usize,
    /// Application version
    pub version: String,
}
