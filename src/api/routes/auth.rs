//! Auth Routes
//!
//! - POST /api/auth/login - Resolve a username to a user and issue a token
//! - GET /api/auth/me - The user behind the presented token

use axum::{extract::State, Json};
use chrono::Duration;
use std::sync::Arc;

use crate::api::dto::{AuthResponse, LoginRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::{self, AuthUser};
use crate::store::User;

/// POST /api/auth/login
///
/// Upserts the user record for the given username and returns it together
/// with a freshly signed session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.username.is_empty() {
        return Err(ApiError::Validation("Username is required".to_string()));
    }

    let user = state.store.upsert_user(&req.username, &req.avatar_url)?;

    let token = auth::issue_token(
        &state.config.auth_secret,
        &user.id,
        Duration::hours(state.config.token_ttl_hours),
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/auth/me
///
/// Returns the authenticated user; the extractor rejects the request with
/// 401 before this body runs if the token is missing or invalid.
pub async fn current_user(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
