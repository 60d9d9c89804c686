//! Authentication endpoints: login, verification and password reset.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info_span;

use super::error::{channel_response, operation_error_response, validation_response};
use super::extract::ApiJson;
use super::users::UserResponse;
use super::AppState;
use crate::usecase::{Channel, Outcome, OperationHandle};
use crate::user::operations::{
    ForgotPasswordCommand, ForgotPasswordOutcome, LoginCommand, LoginOutcome, ResetPasswordCommand,
    ResetPasswordOutcome, VerifyAccountCommand, VerifyAccountOutcome,
};

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: String,
}

impl IntoResponse for LoginOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(grant) => Json(grant).into_response(),
            Self::ValidationError(failure) => validation_response(failure),
            Self::UserNotFound(message) => channel_response(StatusCode::NOT_FOUND, channel, message),
            Self::InvalidCredentials(message) => {
                channel_response(StatusCode::UNAUTHORIZED, channel, message)
            }
            Self::AccountNotVerified(message) => channel_response(StatusCode::FORBIDDEN, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

impl IntoResponse for VerifyAccountOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(user) => Json(UserResponse::from(user)).into_response(),
            Self::InvalidToken(message) => channel_response(StatusCode::BAD_REQUEST, channel, message),
            Self::TokenExpired(message) => channel_response(StatusCode::GONE, channel, message),
            Self::UserNotFound(message) => channel_response(StatusCode::NOT_FOUND, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

impl IntoResponse for ForgotPasswordOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(email) => (
                StatusCode::ACCEPTED,
                Json(AcceptedResponse {
                    message: format!("Password reset instructions sent to {}", email),
                }),
            )
                .into_response(),
            Self::ValidationError(failure) => validation_response(failure),
            Self::UserNotFound(message) => channel_response(StatusCode::NOT_FOUND, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

impl IntoResponse for ResetPasswordOutcome {
    fn into_response(self) -> Response {
        let channel = self.channel().name();
        match self {
            Self::Success(user) => Json(UserResponse::from(user)).into_response(),
            Self::ValidationError(failure) => validation_response(failure),
            Self::InvalidToken(message) => channel_response(StatusCode::BAD_REQUEST, channel, message),
            Self::TokenExpired(message) => channel_response(StatusCode::GONE, channel, message),
            Self::UserNotFound(message) => channel_response(StatusCode::NOT_FOUND, channel, message),
            Self::Error(error) => operation_error_response(&error),
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<LoginCommand>,
) -> LoginOutcome {
    OperationHandle::new(state.login.clone())
        .with_logger(info_span!("login", email = %command.email))
        .execute(command)
        .await
}

pub async fn verify(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<VerifyAccountCommand>,
) -> VerifyAccountOutcome {
    OperationHandle::new(state.verify_account.clone())
        .with_logger(info_span!("verify_account"))
        .execute(command)
        .await
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<ForgotPasswordCommand>,
) -> ForgotPasswordOutcome {
    OperationHandle::new(state.forgot_password.clone())
        .with_logger(info_span!("forgot_password", email = %command.email))
        .execute(command)
        .await
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<ResetPasswordCommand>,
) -> ResetPasswordOutcome {
    OperationHandle::new(state.reset_password.clone())
        .with_logger(info_span!("reset_password"))
        .execute(command)
        .await
}

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", post(verify))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}
