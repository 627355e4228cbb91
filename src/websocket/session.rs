//! WebSocket Session Lifecycle
//!
//! Handles WebSocket upgrade requests and runs the per-connection reader and
//! writer tasks. The upgrade is authenticated before the protocol switch;
//! after it, the connection only talks to the hub.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use super::hub::ChatHub;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth;
use crate::store::{StoreError, User};

/// Query parameters accepted by the upgrade endpoint
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// WebSocket upgrade handler
///
/// The session token may arrive as a `token` query parameter or a bearer
/// header; browsers cannot set headers on WebSocket requests, so the query
/// form is checked first.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let user = authorize(&state, query.token.as_deref(), &headers)?;

    let hub = Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, user)))
}

/// Resolve the connecting user from the presented token
fn authorize(
    state: &AppState,
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let token = query_token
        .or_else(|| auth::bearer_token(headers))
        .ok_or_else(|| ApiError::Unauthorized("Token required".to_string()))?;

    let claims = auth::verify_token(&state.config.auth_secret, token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    state.store.get_user(&claims.sub).map_err(|e| match e {
        StoreError::UserNotFound(_) => ApiError::Unauthorized("Unknown user".to_string()),
        other => other.into(),
    })
}

/// Run an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ChatHub>, user: User) {
    let (mut sender, mut receiver) = socket.split();
    let username = user.username.clone();

    let (session_id, mut rx) = hub.register(user).await;

    let writer_session = session_id.clone();

    // Writer task: forward queued frames until the hub closes the queue.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.to_string())).await.is_err() {
                tracing::debug!(
                    session_id = %writer_session,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
        // Queue closed (unregistered or evicted): start the close handshake
        // if the socket is still up.
        let _ = sender.send(Message::Close(None)).await;
    });

    let hub_for_recv = Arc::clone(&hub);
    let reader_session = session_id.clone();

    // Reader task: decode and dispatch inbound frames until the peer closes.
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    hub_for_recv.dispatch_text(&reader_session, &text).await;
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(session_id = %reader_session, "Client requested close");
                    break;
                }
                // Binary frames are ignored; ping/pong is handled by the
                // protocol layer.
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        session_id = %reader_session,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Whichever task finishes first takes the other down with it.
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    hub.unregister(&session_id).await;
    tracing::debug!(session_id = %session_id, username = %username, "Session finished");
}
