//! Reset Password Use Case

use std::sync::Arc;

use async_trait::async_trait;
use gk_common::Secret;
use serde::Deserialize;
use tracing::warn;

use super::check_password;
use crate::auth::{PasswordHasher, PasswordPolicy};
use crate::token::entity::TokenKind;
use crate::token::repository::TokenRepository;
use crate::usecase::{Operation, OperationError, ValidationFailure};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

pub const PASSWORD_RESET_FAILED: &str = "PASSWORD_RESET_FAILED";

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordCommand {
    pub token: Secret,
    pub password: Secret,
}

crate::outcome! {
    pub enum ResetPasswordOutcome via ResetPasswordChannel {
        Success(User),
        ValidationError(ValidationFailure) => "VALIDATION_ERROR",
        InvalidToken(String) => "INVALID_TOKEN",
        TokenExpired(String) => "TOKEN_EXPIRED",
        UserNotFound(String) => "USER_NOT_FOUND",
    }
}

/// Sets a new password using a reset token.
///
/// The token is consumed before the password changes. A successful reset
/// also marks the account verified.
pub struct ResetPasswordUseCase {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    hasher: Arc<dyn PasswordHasher>,
    policy: PasswordPolicy,
}

impl ResetPasswordUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        hasher: Arc<dyn PasswordHasher>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            policy,
        }
    }

    fn failed<E>(message: String, cause: E) -> ResetPasswordOutcome
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ResetPasswordOutcome::Error(OperationError::caused_by(PASSWORD_RESET_FAILED, message, cause))
    }
}

#[async_trait]
impl Operation for ResetPasswordUseCase {
    type Input = ResetPasswordCommand;
    type Outcome = ResetPasswordOutcome;

    async fn execute(&self, command: ResetPasswordCommand) -> ResetPasswordOutcome {
        let value = command.token.expose().trim();
        if value.is_empty() {
            return ResetPasswordOutcome::InvalidToken("Reset token is required".to_string());
        }
        if let Err(failure) = check_password(&self.policy, command.password.expose()) {
            return ResetPasswordOutcome::ValidationError(failure);
        }

        let token = match self.tokens.find_by_value(TokenKind::PasswordReset, value).await {
            Ok(Some(token)) => token,
            Ok(None) => return ResetPasswordOutcome::InvalidToken("Reset token is invalid".to_string()),
            Err(e) => return Self::failed("Could not look up reset token".to_string(), e),
        };

        if token.is_expired() {
            if let Err(e) = self.tokens.delete(&token.id).await {
                warn!(token_id = %token.id, error = %e, "Could not delete expired reset token");
            }
            return ResetPasswordOutcome::TokenExpired(
                "Reset token has expired, request a new one".to_string(),
            );
        }

        let mut user = match self.users.find_by_id(&token.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                if let Err(e) = self.tokens.delete(&token.id).await {
                    warn!(token_id = %token.id, error = %e, "Could not delete orphaned reset token");
                }
                return ResetPasswordOutcome::UserNotFound(format!(
                    "User '{}' not found",
                    token.user_id
                ))
            }
            Err(e) => return Self::failed(format!("Could not load user '{}'", token.user_id), e),
        };

        // Single use even if the update below fails
        if let Err(e) = self.tokens.delete(&token.id).await {
            return Self::failed("Could not consume reset token".to_string(), e);
        }

        let password_hash = match self.hasher.hash(command.password.expose()).await {
            Ok(hash) => hash,
            Err(e) => return Self::failed(format!("Could not hash new password of '{}'", user.id), e),
        };

        user.set_password_hash(password_hash);
        user.mark_verified();
        if let Err(e) = self.users.update(&user).await {
            return Self::failed(format!("Could not store new password of '{}'", user.id), e);
        }

        ResetPasswordOutcome::Success(user)
    }
}
