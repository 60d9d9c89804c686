//! Verify Account Use Case

use std::sync::Arc;

use async_trait::async_trait;
use gk_common::Secret;
use serde::Deserialize;
use tracing::warn;

use crate::token::entity::TokenKind;
use crate::token::repository::TokenRepository;
use crate::usecase::{Operation, OperationError};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

pub const ACCOUNT_VERIFICATION_FAILED: &str = "ACCOUNT_VERIFICATION_FAILED";

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyAccountCommand {
    pub token: Secret,
}

crate::outcome! {
    pub enum VerifyAccountOutcome via VerifyAccountChannel {
        Success(User),
        InvalidToken(String) => "INVALID_TOKEN",
        TokenExpired(String) => "TOKEN_EXPIRED",
        UserNotFound(String) => "USER_NOT_FOUND",
    }
}

/// Marks an account verified and consumes the verification token.
pub struct VerifyAccountUseCase {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl VerifyAccountUseCase {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenRepository>) -> Self {
        Self { users, tokens }
    }

    async fn discard(&self, token_id: &str) {
        if let Err(e) = self.tokens.delete(token_id).await {
            warn!(token_id, error = %e, "Could not delete verification token");
        }
    }
}

#[async_trait]
impl Operation for VerifyAccountUseCase {
    type Input = VerifyAccountCommand;
    type Outcome = VerifyAccountOutcome;

    async fn execute(&self, command: VerifyAccountCommand) -> VerifyAccountOutcome {
        let value = command.token.expose().trim();
        if value.is_empty() {
            return VerifyAccountOutcome::InvalidToken("Verification token is required".to_string());
        }

        let token = match self.tokens.find_by_value(TokenKind::Verification, value).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return VerifyAccountOutcome::InvalidToken("Verification token is invalid".to_string())
            }
            Err(e) => {
                return VerifyAccountOutcome::Error(OperationError::caused_by(
                    ACCOUNT_VERIFICATION_FAILED,
                    "Could not look up verification token",
                    e,
                ))
            }
        };

        if token.is_expired() {
            self.discard(&token.id).await;
            return VerifyAccountOutcome::TokenExpired(
                "Verification token has expired, request a new one".to_string(),
            );
        }

        let mut user = match self.users.find_by_id(&token.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.discard(&token.id).await;
                return VerifyAccountOutcome::UserNotFound(format!(
                    "User '{}' not found",
                    token.user_id
                ));
            }
            Err(e) => {
                return VerifyAccountOutcome::Error(OperationError::caused_by(
                    ACCOUNT_VERIFICATION_FAILED,
                    format!("Could not load user '{}'", token.user_id),
                    e,
                ))
            }
        };

        user.mark_verified();
        if let Err(e) = self.users.update(&user).await {
            return VerifyAccountOutcome::Error(OperationError::caused_by(
                ACCOUNT_VERIFICATION_FAILED,
                format!("Could not mark user '{}' verified", user.id),
                e,
            ));
        }

        self.discard(&token.id).await;
        VerifyAccountOutcome::Success(user)
    }
}
