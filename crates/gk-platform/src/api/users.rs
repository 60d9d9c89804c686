//! User endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span};

use super::error::{channel_response, operation_error_response, validation_response};
use super::extract::ApiJson;
use super::middleware::Authenticated;
use super::AppState;
use crate::usecase::{Channel, Outcome, OperationHandle};
use crate::user::entity::User;
use crate::user::operations::{
    CreateUserChannel, CreateUserCommand, CreateUserOutcome, DeleteUserOutcome, GetUserOutcome,
};

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            verified: user.verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl IntoResponse for CreateUserOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(user) => (StatusCode::CREATED, Json(UserResponse::from(user))).into_response(),
            Self::ValidationError(failure) => validation_response(failure),
            Self::UserExists(message) => channel_response(StatusCode::CONFLICT, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

impl IntoResponse for GetUserOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(user) => Json(UserResponse::from(user)).into_response(),
            Self::UserNotFound(message) => channel_response(StatusCode::NOT_FOUND, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

impl IntoResponse for DeleteUserOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(_) => StatusCode::NO_CONTENT.into_response(),
            Self::UserNotFound(message) => channel_response(StatusCode::NOT_FOUND, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

/// Register an account
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<CreateUserCommand>,
) -> CreateUserOutcome {
    let mut handle = OperationHandle::new(state.create_user.clone())
        .with_logger(info_span!("create_user", email = %command.email));
    handle.on(CreateUserChannel::Success, |outcome| {
        if let CreateUserOutcome::Success(user) = outcome {
            info!(user_id = %user.id, "Account registered, awaiting verification");
        }
    });
    handle.execute(command).await
}

/// Get the authenticated user
pub async fn get_me(State(state): State<AppState>, auth: Authenticated) -> GetUserOutcome {
    OperationHandle::new(state.get_user.clone())
        .with_logger(info_span!("get_user", user_id = %auth.sub))
        .execute(auth.0.sub)
        .await
}

/// Delete the authenticated user
pub async fn delete_me(State(state): State<AppState>, auth: Authenticated) -> DeleteUserOutcome {
    OperationHandle::new(state.delete_user.clone())
        .with_logger(info_span!("delete_user", user_id = %auth.sub))
        .execute(auth.0.sub)
        .await
}

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/me", get(get_me).delete(delete_me))
}
