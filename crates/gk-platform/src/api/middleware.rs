//! Bearer authentication for axum.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::AppState;
use crate::auth::{extract_bearer_token, AccessTokenClaims};

/// Authenticated caller extractor
/// Validates the bearer JWT and exposes its claims
pub struct Authenticated(pub AccessTokenClaims);

impl std::ops::Deref for Authenticated {
    type Target = AccessTokenClaims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection of an unauthenticated request: 401 `UNAUTHORIZED`.
#[derive(Debug)]
pub struct AuthError {
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::new("UNAUTHORIZED", self.message).into_response_with(StatusCode::UNAUTHORIZED)
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| AuthError {
                message: "Missing authentication token".to_string(),
            })?;

        let claims = app_state
            .access_tokens
            .validate(token)
            .map_err(|e| AuthError { message: e.to_string() })?;

        Ok(Authenticated(claims))
    }
}
