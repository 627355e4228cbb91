//! SQLite-backed chat store
//!
//! Single-connection store for users, rooms and message history. The
//! connection lives behind a `std::sync::Mutex`; every operation is a short
//! statement, so handlers call these methods directly from async context.
//!
//! Ids are UUID v4 strings generated app-side and `created_at` is stored as
//! RFC 3339 text (microsecond precision), which keeps `ORDER BY created_at`
//! equivalent to insertion order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{ChatMessage, Room, User};
use crate::store::MessageStore;

/// SQLite-backed implementation of the chat store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Self::init(conn)
    }

    /// Open an in-memory store (tests, throwaway environments)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        // Configure for performance; foreign keys are per-connection in SQLite
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                avatar_url TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rooms (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_by TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                room_id TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_room_id ON messages(room_id);
            CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(format!("Failed to acquire connection lock: {}", e)))
    }

    // ==================== Users ====================

    /// Insert a user, or refresh the avatar of an existing one
    ///
    /// The username is the stable external key; repeated logins with the same
    /// name resolve to the same user record.
    pub fn upsert_user(&self, username: &str, avatar_url: &str) -> StoreResult<User> {
        let conn = self.conn()?;

        let existing = conn.query_row(
            "SELECT id, username, avatar_url, created_at FROM users WHERE username = ?",
            params![username],
            Self::user_from_row,
        );

        match existing {
            Ok(mut user) => {
                if user.avatar_url != avatar_url {
                    conn.execute(
                        "UPDATE users SET avatar_url = ? WHERE id = ?",
                        params![avatar_url, user.id],
                    )?;
                    user.avatar_url = avatar_url.to_string();
                }
                Ok(user)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    username: username.to_string(),
                    avatar_url: avatar_url.to_string(),
                    created_at: now(),
                };

                conn.execute(
                    "INSERT INTO users (id, username, avatar_url, created_at)
                     VALUES (?, ?, ?, ?)",
                    params![
                        user.id,
                        user.username,
                        user.avatar_url,
                        encode_time(user.created_at)
                    ],
                )?;

                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a user by id
    pub fn get_user(&self, id: &str) -> StoreResult<User> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, username, avatar_url, created_at FROM users WHERE id = ?",
            params![id],
            Self::user_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::UserNotFound(id.to_string()),
            other => other.into(),
        })
    }

    // ==================== Rooms ====================

    /// Create a room owned by the given user
    pub fn create_room(&self, name: &str, created_by: &str) -> StoreResult<Room> {
        let conn = self.conn()?;

        let room = Room {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_by: created_by.to_string(),
            created_at: now(),
            member_count: None,
        };

        conn.execute(
            "INSERT INTO rooms (id, name, created_by, created_at) VALUES (?, ?, ?, ?)",
            params![
                room.id,
                room.name,
                room.created_by,
                encode_time(room.created_at)
            ],
        )?;

        Ok(room)
    }

    /// List all rooms, newest first
    pub fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare_cached(
            "SELECT id, name, created_by, created_at FROM rooms ORDER BY created_at DESC",
        )?;

        let rooms = stmt
            .query_map([], Self::room_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rooms)
    }

    /// Fetch a room by id
    pub fn get_room(&self, id: &str) -> StoreResult<Room> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT id, name, created_by, created_at FROM rooms WHERE id = ?",
            params![id],
            Self::room_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::RoomNotFound(id.to_string()),
            other => other.into(),
        })
    }

    /// Delete a room if (and only if) the given user created it
    ///
    /// Deleting someone else's room is a silent no-op; messages cascade.
    pub fn delete_room(&self, id: &str, user_id: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM rooms WHERE id = ? AND created_by = ?",
            params![id, user_id],
        )?;

        Ok(())
    }

    // ==================== Messages ====================

    /// Persist one chat message and return the stored row
    pub fn insert_message(
        &self,
        room_id: &str,
        user_id: &str,
        content: &str,
    ) -> StoreResult<ChatMessage> {
        let conn = self.conn()?;

        let msg = ChatMessage {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: now(),
            user: None,
        };

        conn.execute(
            "INSERT INTO messages (id, room_id, user_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                msg.id,
                msg.room_id,
                msg.user_id,
                msg.content,
                encode_time(msg.created_at)
            ],
        )?;

        Ok(msg)
    }

    /// Page through a room's history, oldest first, with authors joined in
    pub fn messages_by_room(
        &self,
        room_id: &str,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<ChatMessage>> {
        let conn = self.conn()?;

        // SQLite reads a negative LIMIT/OFFSET as unlimited/zero, so an
        // overflowing cast would invert the page. Saturate instead.
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare_cached(
            "SELECT m.id, m.room_id, m.user_id, m.content, m.created_at,
                    u.id, u.username, u.avatar_url, u.created_at
             FROM messages m
             JOIN users u ON m.user_id = u.id
             WHERE m.room_id = ?
             ORDER BY m.created_at ASC
             LIMIT ? OFFSET ?",
        )?;

        let messages = stmt
            .query_map(
                params![room_id, limit, offset],
                Self::message_with_user_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    // ==================== Row mapping ====================

    fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            avatar_url: row.get(2)?,
            created_at: decode_time(row, 3)?,
        })
    }

    fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
        Ok(Room {
            id: row.get(0)?,
            name: row.get(1)?,
            created_by: row.get(2)?,
            created_at: decode_time(row, 3)?,
            member_count: None,
        })
    }

    fn message_with_user_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
        Ok(ChatMessage {
            id: row.get(0)?,
            room_id: row.get(1)?,
            user_id: row.get(2)?,
            content: row.get(3)?,
            created_at: decode_time(row, 4)?,
            user: Some(User {
                id: row.get(5)?,
                username: row.get(6)?,
                avatar_url: row.get(7)?,
                created_at: decode_time(row, 8)?,
            }),
        })
    }
}

#[async_trait::async_trait]
impl MessageStore for SqliteStore {
    async fn create_message(
        &self,
        room_id: &str,
        user_id: &str,
        content: &str,
    ) -> StoreResult<ChatMessage> {
        self.insert_message(room_id, user_id, content)
    }
}

/// Current time truncated to the precision we store
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
