//! Forgot Password Use Case

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::normalize_email;
use crate::auth::TokenGenerator;
use crate::token::entity::{Token, TokenKind, TokenPolicy};
use crate::token::repository::TokenRepository;
use crate::usecase::{DomainEvent, EventBus, Operation, OperationError, ValidationFailure};
use crate::user::repository::UserRepository;

pub const FORGOT_PASSWORD_FAILED: &str = "FORGOT_PASSWORD_FAILED";

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordCommand {
    pub email: String,
}

crate::outcome! {
    pub enum ForgotPasswordOutcome via ForgotPasswordChannel {
        Success(String),
        ValidationError(ValidationFailure) => "VALIDATION_ERROR",
        UserNotFound(String) => "USER_NOT_FOUND",
    }
}

/// Issues a password reset token and publishes `ForgotPassword`.
///
/// The reset email itself is sent by the `ForgotPassword` subscriber.
pub struct ForgotPasswordUseCase {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    generator: Arc<dyn TokenGenerator>,
    policy: TokenPolicy,
    bus: EventBus,
}

impl ForgotPasswordUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        generator: Arc<dyn TokenGenerator>,
        policy: TokenPolicy,
        bus: EventBus,
    ) -> Self {
        Self {
            users,
            tokens,
            generator,
            policy,
            bus,
        }
    }
}

#[async_trait]
impl Operation for ForgotPasswordUseCase {
    type Input = ForgotPasswordCommand;
    type Outcome = ForgotPasswordOutcome;

    async fn execute(&self, command: ForgotPasswordCommand) -> ForgotPasswordOutcome {
        let email = match normalize_email(&command.email) {
            Ok(email) => email,
            Err(failure) => return ForgotPasswordOutcome::ValidationError(failure),
        };

        let user = match self.users.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return ForgotPasswordOutcome::UserNotFound(format!(
                    "No account is registered for '{}'",
                    email
                ))
            }
            Err(e) => {
                return ForgotPasswordOutcome::Error(OperationError::caused_by(
                    FORGOT_PASSWORD_FAILED,
                    format!("Could not load user '{}'", email),
                    e,
                ))
            }
        };

        let token = Token::new(
            &user.id,
            TokenKind::PasswordReset,
            self.generator.generate(),
            self.policy.ttl(TokenKind::PasswordReset),
        );
        if let Err(e) = self.tokens.insert(&token).await {
            return ForgotPasswordOutcome::Error(OperationError::caused_by(
                FORGOT_PASSWORD_FAILED,
                format!("Could not store reset token for '{}'", email),
                e,
            ));
        }

        self.bus.publish(DomainEvent::ForgotPassword { user, token });
        ForgotPasswordOutcome::Success(email)
    }
}
