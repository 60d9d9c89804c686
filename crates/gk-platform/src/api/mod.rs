//! HTTP API
//!
//! Thin axum controllers: each one runs a use case through an
//! [`OperationHandle`](crate::usecase::OperationHandle) and turns the outcome
//! into exactly one response.

pub mod auth;
pub mod error;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod users;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AccessTokenIssuer;
use crate::user::operations::{
    CreateUserUseCase, DeleteUserUseCase, ForgotPasswordUseCase, GetUserUseCase, LoginUseCase,
    ResetPasswordUseCase, VerifyAccountUseCase,
};

pub use error::ApiError;
pub use extract::ApiJson;
pub use middleware::Authenticated;

/// Shared state of all routes.
#[derive(Clone)]
pub struct AppState {
    pub create_user: Arc<CreateUserUseCase>,
    pub get_user: Arc<GetUserUseCase>,
    pub delete_user: Arc<DeleteUserUseCase>,
    pub login: Arc<LoginUseCase>,
    pub verify_account: Arc<VerifyAccountUseCase>,
    pub forgot_password: Arc<ForgotPasswordUseCase>,
    pub reset_password: Arc<ResetPasswordUseCase>,
    pub access_tokens: Arc<dyn AccessTokenIssuer>,
}

/// Every route of the service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::health_router())
        .merge(users::users_router())
        .merge(auth::auth_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
