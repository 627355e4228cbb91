//! # Parley
//!
//! Real-time chat relay - rooms, presence and typing events over WebSocket,
//! with SQLite-backed message history.
//!
//! ## Features
//!
//! - **Live relay**: One hub fans chat events out to every session in a room
//! - **Presence**: Join/leave announcements and online-user snapshots
//! - **Typing indicators**: Relayed to everyone else in the room
//! - **History**: Messages persist to SQLite and page out over REST
//! - **Token auth**: Username login issues a signed token for REST and WebSocket
//!
//! ## Modules
//!
//! - [`websocket`]: The chat hub and per-connection session plumbing
//! - [`store`]: SQLite persistence for users, rooms and messages
//! - [`auth`]: Token issuing and verification
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::api::{serve, ApiConfig, AppState};
//! use parley::store::SqliteStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("parley.db")?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod store;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use auth::{AuthError, AuthUser, Claims};

pub use config::{Config, ConfigError};

pub use store::{ChatMessage, MessageStore, Room, SqliteStore, StoreError, StoreResult, User};

pub use websocket::{
    websocket_handler, ChatHub, ClientEvent, HubConfig, ServerEvent, SessionId,
};
