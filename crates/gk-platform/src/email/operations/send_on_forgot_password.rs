//! Send the password reset email.

use std::sync::Arc;

use async_trait::async_trait;

use crate::email::sender::EmailSender;
use crate::email::templates::EmailTemplates;
use crate::token::entity::Token;
use crate::usecase::{Bootstrap, DomainEvent, DomainEventKind, Operation, OperationError, Subscriptions};
use crate::user::entity::User;

pub const RESET_EMAIL_FAILED: &str = "RESET_EMAIL_FAILED";

/// Recipient and the reset token to mail them.
#[derive(Debug, Clone)]
pub struct ResetEmailRequest {
    pub user: User,
    pub token: Token,
}

crate::outcome! {
    pub enum SendEmailOnForgotPasswordOutcome via SendEmailOnForgotPasswordChannel {
        Success(String),
    }
}

pub struct SendEmailOnForgotPassword {
    sender: Arc<dyn EmailSender>,
    templates: EmailTemplates,
}

impl SendEmailOnForgotPassword {
    pub fn new(sender: Arc<dyn EmailSender>, templates: EmailTemplates) -> Self {
        Self { sender, templates }
    }
}

#[async_trait]
impl Operation for SendEmailOnForgotPassword {
    type Input = ResetEmailRequest;
    type Outcome = SendEmailOnForgotPasswordOutcome;

    async fn execute(&self, request: ResetEmailRequest) -> SendEmailOnForgotPasswordOutcome {
        let ResetEmailRequest { user, token } = request;
        let message = self.templates.password_reset(&user, token.value.expose());

        match self.sender.send(message).await {
            Ok(()) => SendEmailOnForgotPasswordOutcome::Success(user.email),
            Err(e) => SendEmailOnForgotPasswordOutcome::Error(OperationError::caused_by(
                RESET_EMAIL_FAILED,
                format!("Could not send password reset email to '{}'", user.email),
                e,
            )),
        }
    }
}

impl Bootstrap for SendEmailOnForgotPassword {
    fn bootstrap(self: Arc<Self>, subscriptions: &mut Subscriptions) {
        subscriptions.subscribe_operation(DomainEventKind::ForgotPassword, self, |event| match event {
            DomainEvent::ForgotPassword { user, token } => Some(ResetEmailRequest {
                user: user.clone(),
                token: token.clone(),
            }),
            _ => None,
        });
    }
}
