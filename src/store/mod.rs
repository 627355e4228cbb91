//! Persistence layer
//!
//! SQLite-backed storage for users, rooms and chat messages. The relay hub
//! only needs to write messages, so it depends on the narrow [`MessageStore`]
//! trait rather than the full [`SqliteStore`].

pub mod error;
pub mod sqlite;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
pub use types::{ChatMessage, Room, User};

/// Message persistence as seen from the relay hub
///
/// `create_message` runs on the dispatch path of every `send_message` event;
/// implementations should return quickly.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_message(
        &self,
        room_id: &str,
        user_id: &str,
        content: &str,
    ) -> StoreResult<ChatMessage>;
}
