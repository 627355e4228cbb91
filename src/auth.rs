//! Session token handling
//!
//! Stateless HS256 tokens carry the user id; handlers resolve the full user
//! record from the store on each request. WebSocket upgrades reuse the same
//! verification via [`verify_token`] since browsers cannot set headers there.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::store::{StoreError, User};

/// Token claims: the subject is the user id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Auth error types
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token failed signature or expiry checks
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token could not be signed
    #[error("Failed to issue token: {0}")]
    TokenCreation(#[from] jsonwebtoken::errors::Error),
}

/// Sign a session token for the given user id
pub fn issue_token(secret: &str, user_id: &str, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify a session token and return its claims
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// The authenticated user behind a request
///
/// Extracting this rejects the request with 401 unless a valid token for an
/// existing user is presented.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = verify_token(&state.config.auth_secret, token)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        let user = state.store.get_user(&claims.sub).map_err(|e| match e {
            StoreError::UserNotFound(_) => {
                ApiError::Unauthorized("Unknown user".to_string())
            }
            other => other.into(),
        })?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("secret", "user-1", Duration::hours(1)).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token("secret", "user-1", Duration::hours(1)).unwrap();
        assert!(matches!(
            verify_token("other", &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default validation leeway.
        let token = issue_token("secret", "user-1", Duration::hours(-2)).unwrap();
        assert!(matches!(
            verify_token("secret", &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );
        assert_eq!(bearer_token(&headers), None);
    }
}
