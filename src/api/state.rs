//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::store::SqliteStore;
use crate::websocket::{ChatHub, HubConfig};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Chat store for users, rooms and message history
    pub store: Arc<SqliteStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Relay hub for live WebSocket sessions
    pub hub: Arc<ChatHub>,
}

impl AppState {
    /// Create a new AppState with the default hub configuration
    pub fn new(store: Arc<SqliteStore>, config: ApiConfig) -> Self {
        Self::with_hub_config(store, config, HubConfig::default())
    }

    /// Create AppState with custom relay hub configuration
    pub fn with_hub_config(
        store: Arc<SqliteStore>,
        config: ApiConfig,
        hub_config: HubConfig,
    ) -> Self {
        let hub = Arc::new(ChatHub::new(store.clone(), hub_config));
        Self {
            store,
            config: Arc::new(config),
            start_time: Instant::now(),
            hub,
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get live WebSocket session count
    pub async fn session_count(&self) -> usize {
        self.hub.connection_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// HMAC secret for signing session tokens
    pub auth_secret: String,
    /// Session token lifetime in hours
    pub token_ttl_hours: i64,
    /// Default page size for message history
    pub history_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            auth_secret: "parley-dev-secret".to_string(),
            token_ttl_hours: 24 * 7,
            history_page_size: 100,
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
