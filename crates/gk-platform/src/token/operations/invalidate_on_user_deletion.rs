//! Drop the tokens of deleted accounts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::token::repository::TokenRepository;
use crate::usecase::{Bootstrap, DomainEvent, DomainEventKind, Operation, OperationError, Subscriptions};

pub const TOKEN_INVALIDATION_FAILED: &str = "TOKEN_INVALIDATION_FAILED";

crate::outcome! {
    pub enum InvalidateTokensOnUserDeletionOutcome via InvalidateTokensOnUserDeletionChannel {
        Success(u64),
    }
}

/// Subscribes to `UserDeleted`; succeeds with the number of tokens removed.
pub struct InvalidateTokensOnUserDeletion {
    tokens: Arc<dyn TokenRepository>,
}

impl InvalidateTokensOnUserDeletion {
    pub fn new(tokens: Arc<dyn TokenRepository>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl Operation for InvalidateTokensOnUserDeletion {
    type Input = String;
    type Outcome = InvalidateTokensOnUserDeletionOutcome;

    async fn execute(&self, user_id: String) -> InvalidateTokensOnUserDeletionOutcome {
        match self.tokens.delete_for_user(&user_id).await {
            Ok(removed) => InvalidateTokensOnUserDeletionOutcome::Success(removed),
            Err(e) => InvalidateTokensOnUserDeletionOutcome::Error(OperationError::caused_by(
                TOKEN_INVALIDATION_FAILED,
                format!("Could not remove tokens of user '{}'", user_id),
                e,
            )),
        }
    }
}

impl Bootstrap for InvalidateTokensOnUserDeletion {
    fn bootstrap(self: Arc<Self>, subscriptions: &mut Subscriptions) {
        subscriptions.subscribe_operation(DomainEventKind::UserDeleted, self, |event| match event {
            DomainEvent::UserDeleted { user_id } => Some(user_id.clone()),
            _ => None,
        });
    }
}
