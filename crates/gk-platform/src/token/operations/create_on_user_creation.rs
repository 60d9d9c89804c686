//! Issue a verification token for every new account.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::TokenGenerator;
use crate::token::entity::{Token, TokenKind, TokenPolicy};
use crate::token::repository::TokenRepository;
use crate::usecase::{
    Bootstrap, DomainEvent, DomainEventKind, EventBus, Operation, OperationError, Subscriptions,
};
use crate::user::entity::User;

pub const TOKEN_CREATION_FAILED: &str = "TOKEN_CREATION_FAILED";

crate::outcome! {
    pub enum CreateTokenOnUserCreationOutcome via CreateTokenOnUserCreationChannel {
        Success(Token),
    }
}

/// Subscribes to `UserCreated`, stores a verification token and publishes
/// `TokenCreated` so the verification email can go out.
pub struct CreateTokenOnUserCreation {
    tokens: Arc<dyn TokenRepository>,
    generator: Arc<dyn TokenGenerator>,
    policy: TokenPolicy,
    bus: EventBus,
}

impl CreateTokenOnUserCreation {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        generator: Arc<dyn TokenGenerator>,
        policy: TokenPolicy,
        bus: EventBus,
    ) -> Self {
        Self {
            tokens,
            generator,
            policy,
            bus,
        }
    }
}

#[async_trait]
impl Operation for CreateTokenOnUserCreation {
    type Input = User;
    type Outcome = CreateTokenOnUserCreationOutcome;

    async fn execute(&self, user: User) -> CreateTokenOnUserCreationOutcome {
        let token = Token::new(
            &user.id,
            TokenKind::Verification,
            self.generator.generate(),
            self.policy.ttl(TokenKind::Verification),
        );

        if let Err(e) = self.tokens.insert(&token).await {
            return CreateTokenOnUserCreationOutcome::Error(OperationError::caused_by(
                TOKEN_CREATION_FAILED,
                format!("Could not store verification token for user '{}'", user.id),
                e,
            ));
        }

        self.bus.publish(DomainEvent::TokenCreated { user });
        CreateTokenOnUserCreationOutcome::Success(token)
    }
}

impl Bootstrap for CreateTokenOnUserCreation {
    fn bootstrap(self: Arc<Self>, subscriptions: &mut Subscriptions) {
        subscriptions.subscribe_operation(DomainEventKind::UserCreated, self, |event| match event {
            DomainEvent::UserCreated { user } => Some(user.clone()),
            _ => None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RandomTokenGenerator;
    use crate::test_support::tokens;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_stores_verification_token() {
        let repo = tokens();
        let op = CreateTokenOnUserCreation::new(
            repo.clone(),
            Arc::new(RandomTokenGenerator),
            TokenPolicy::default(),
            EventBus::new(),
        );
        let user = User::new("ada@example.com", "Ada", "h");

        let outcome = op.execute(user.clone()).await;
        let CreateTokenOnUserCreationOutcome::Success(token) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(token.user_id, user.id);
        assert_eq!(token.kind, TokenKind::Verification);
        assert!(token.expires_at > Utc::now() + Duration::hours(23));
        assert_eq!(repo.count_for_user(&user.id), 1);
    }

    #[tokio::test]
    async fn test_uses_configured_verification_lifetime() {
        let op = CreateTokenOnUserCreation::new(
            tokens(),
            Arc::new(RandomTokenGenerator),
            TokenPolicy {
                verification_ttl: Duration::hours(2),
                ..TokenPolicy::default()
            },
            EventBus::new(),
        );

        let outcome = op.execute(User::new("ada@example.com", "Ada", "h")).await;
        let CreateTokenOnUserCreationOutcome::Success(token) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert!(token.expires_at > Utc::now() + Duration::hours(1));
        assert!(token.expires_at <= Utc::now() + Duration::hours(2));
    }

    #[test]
    fn test_bootstrap_subscribes_to_user_created() {
        let op = Arc::new(CreateTokenOnUserCreation::new(
            tokens(),
            Arc::new(RandomTokenGenerator),
            TokenPolicy::default(),
            EventBus::new(),
        ));
        let mut subscriptions = Subscriptions::new();
        op.bootstrap(&mut subscriptions);
        assert_eq!(subscriptions.count(DomainEventKind::UserCreated), 1);
        assert_eq!(subscriptions.len(), 1);
    }
}
