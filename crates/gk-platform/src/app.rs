//! Application Assembly
//!
//! Builds every use case over one set of collaborators, registers the
//! subscriber operations and installs the resulting registry into a fresh
//! [`EventBus`]. The server binary and the integration tests both start here.

use std::sync::Arc;

use axum::Router;
use gk_config::AppConfig;
use tracing::info;

use crate::api::{self, AppState};
use crate::auth::{
    AccessTokenIssuer, Argon2Config, JwtIssuer, PasswordHasher, PasswordPolicy, PasswordService,
    RandomTokenGenerator, TokenGenerator,
};
use crate::email::operations::{SendEmailOnForgotPassword, SendEmailOnUserCreation};
use crate::email::{EmailSender, EmailTemplates};
use crate::shared::error::Result;
use crate::token::entity::TokenPolicy;
use crate::token::operations::{CreateTokenOnUserCreation, InvalidateTokensOnUserDeletion};
use crate::token::repository::TokenRepository;
use crate::usecase::{Bootstrap, BusError, EventBus, Subscriptions};
use crate::user::operations::{
    CreateUserUseCase, DeleteUserUseCase, ForgotPasswordUseCase, GetUserUseCase, LoginUseCase,
    ResetPasswordUseCase, VerifyAccountUseCase,
};
use crate::user::repository::UserRepository;

/// Everything the use cases depend on.
pub struct Collaborators {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub token_generator: Arc<dyn TokenGenerator>,
    pub access_tokens: Arc<dyn AccessTokenIssuer>,
    pub email_sender: Arc<dyn EmailSender>,
    pub email_templates: EmailTemplates,
    pub password_policy: PasswordPolicy,
    pub token_policy: TokenPolicy,
}

impl Collaborators {
    /// Services configured from `config` over the given storage and sender.
    pub fn from_config(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        email_sender: Arc<dyn EmailSender>,
    ) -> Result<Self> {
        Ok(Self {
            users,
            tokens,
            hasher: Arc::new(PasswordService::new(Argon2Config::default())?),
            token_generator: Arc::new(RandomTokenGenerator),
            access_tokens: Arc::new(JwtIssuer::from_config(&config.auth.jwt)),
            email_sender,
            email_templates: EmailTemplates::from_config(&config.email),
            password_policy: PasswordPolicy::from_config(&config.auth.password),
            token_policy: TokenPolicy::from_config(&config.auth.tokens),
        })
    }
}

/// The assembled service: request-facing state plus the bus its
/// subscribers run on.
pub struct Gatekeeper {
    pub bus: EventBus,
    pub state: AppState,
}

impl Gatekeeper {
    /// Wire use cases, bootstrap subscribers and install the registry.
    pub fn assemble(c: Collaborators) -> std::result::Result<Self, BusError> {
        let bus = EventBus::new();

        let state = AppState {
            create_user: Arc::new(CreateUserUseCase::new(
                c.users.clone(),
                c.hasher.clone(),
                c.password_policy.clone(),
                bus.clone(),
            )),
            get_user: Arc::new(GetUserUseCase::new(c.users.clone())),
            delete_user: Arc::new(DeleteUserUseCase::new(c.users.clone(), bus.clone())),
            login: Arc::new(LoginUseCase::new(
                c.users.clone(),
                c.hasher.clone(),
                c.access_tokens.clone(),
            )),
            verify_account: Arc::new(VerifyAccountUseCase::new(c.users.clone(), c.tokens.clone())),
            forgot_password: Arc::new(ForgotPasswordUseCase::new(
                c.users.clone(),
                c.tokens.clone(),
                c.token_generator.clone(),
                c.token_policy,
                bus.clone(),
            )),
            reset_password: Arc::new(ResetPasswordUseCase::new(
                c.users.clone(),
                c.tokens.clone(),
                c.hasher.clone(),
                c.password_policy.clone(),
            )),
            access_tokens: c.access_tokens.clone(),
        };

        let subscribers: Vec<Arc<dyn Bootstrap>> = vec![
            Arc::new(CreateTokenOnUserCreation::new(
                c.tokens.clone(),
                c.token_generator.clone(),
                c.token_policy,
                bus.clone(),
            )),
            Arc::new(SendEmailOnUserCreation::new(
                c.tokens.clone(),
                c.email_sender.clone(),
                c.email_templates.clone(),
            )),
            Arc::new(SendEmailOnForgotPassword::new(
                c.email_sender.clone(),
                c.email_templates.clone(),
            )),
            Arc::new(InvalidateTokensOnUserDeletion::new(c.tokens.clone())),
        ];

        let mut subscriptions = Subscriptions::new();
        for subscriber in subscribers {
            subscriber.bootstrap(&mut subscriptions);
        }
        info!(subscriptions = subscriptions.len(), "Subscribers bootstrapped");
        bus.install(subscriptions)?;

        Ok(Self { bus, state })
    }

    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }
}
