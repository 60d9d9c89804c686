//! Send the verification email once a token exists.

use std::sync::Arc;

use async_trait::async_trait;

use crate::email::sender::EmailSender;
use crate::email::templates::EmailTemplates;
use crate::token::entity::TokenKind;
use crate::token::repository::TokenRepository;
use crate::usecase::{Bootstrap, DomainEvent, DomainEventKind, Operation, OperationError, Subscriptions};
use crate::user::entity::User;

pub const VERIFICATION_EMAIL_FAILED: &str = "VERIFICATION_EMAIL_FAILED";

crate::outcome! {
    pub enum SendEmailOnUserCreationOutcome via SendEmailOnUserCreationChannel {
        Success(String),
        /// No verification token is stored for the user
        TokenNotFound(String) => "TOKEN_NOT_FOUND",
    }
}

/// Subscribes to `TokenCreated` and mails the user's latest verification link.
/// Succeeds with the recipient address.
pub struct SendEmailOnUserCreation {
    tokens: Arc<dyn TokenRepository>,
    sender: Arc<dyn EmailSender>,
    templates: EmailTemplates,
}

impl SendEmailOnUserCreation {
    pub fn new(tokens: Arc<dyn TokenRepository>, sender: Arc<dyn EmailSender>, templates: EmailTemplates) -> Self {
        Self {
            tokens,
            sender,
            templates,
        }
    }
}

#[async_trait]
impl Operation for SendEmailOnUserCreation {
    type Input = User;
    type Outcome = SendEmailOnUserCreationOutcome;

    async fn execute(&self, user: User) -> SendEmailOnUserCreationOutcome {
        let token = match self
            .tokens
            .find_latest_for_user(&user.id, TokenKind::Verification)
            .await
        {
            Ok(Some(token)) => token,
            Ok(None) => {
                return SendEmailOnUserCreationOutcome::TokenNotFound(format!(
                    "No verification token for user '{}'",
                    user.id
                ))
            }
            Err(e) => {
                return SendEmailOnUserCreationOutcome::Error(OperationError::caused_by(
                    VERIFICATION_EMAIL_FAILED,
                    format!("Could not load verification token of user '{}'", user.id),
                    e,
                ))
            }
        };

        let message = self.templates.verification(&user, token.value.expose());
        match self.sender.send(message).await {
            Ok(()) => SendEmailOnUserCreationOutcome::Success(user.email),
            Err(e) => SendEmailOnUserCreationOutcome::Error(OperationError::caused_by(
                VERIFICATION_EMAIL_FAILED,
                format!("Could not send verification email to '{}'", user.email),
                e,
            )),
        }
    }
}

impl Bootstrap for SendEmailOnUserCreation {
    fn bootstrap(self: Arc<Self>, subscriptions: &mut Subscriptions) {
        subscriptions.subscribe_operation(DomainEventKind::TokenCreated, self, |event| match event {
            DomainEvent::TokenCreated { user } => Some(user.clone()),
            _ => None,
        });
    }
}
