//! Create User Use Case

use std::sync::Arc;

use async_trait::async_trait;
use gk_common::Secret;
use serde::Deserialize;

use super::{check_password, normalize_email};
use crate::auth::{PasswordHasher, PasswordPolicy};
use crate::usecase::{DomainEvent, EventBus, Operation, OperationError, ValidationFailure};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

pub const USER_CREATION_FAILED: &str = "USER_CREATION_FAILED";

/// Command for creating a new user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
    /// Email address (required, must be valid format)
    pub email: String,

    /// Display name (required)
    pub name: String,

    /// Initial password, checked against the password policy
    pub password: Secret,
}

crate::outcome! {
    pub enum CreateUserOutcome via CreateUserChannel {
        Success(User),
        ValidationError(ValidationFailure) => "VALIDATION_ERROR",
        UserExists(String) => "USER_EXISTS",
    }
}

/// Registers an account and publishes `UserCreated`.
pub struct CreateUserUseCase {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    policy: PasswordPolicy,
    bus: EventBus,
}

impl CreateUserUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        policy: PasswordPolicy,
        bus: EventBus,
    ) -> Self {
        Self {
            users,
            hasher,
            policy,
            bus,
        }
    }

    fn exists(email: &str) -> CreateUserOutcome {
        CreateUserOutcome::UserExists(format!("A user with email '{}' already exists", email))
    }
}

#[async_trait]
impl Operation for CreateUserUseCase {
    type Input = CreateUserCommand;
    type Outcome = CreateUserOutcome;

    async fn execute(&self, command: CreateUserCommand) -> CreateUserOutcome {
        let email = match normalize_email(&command.email) {
            Ok(email) => email,
            Err(failure) => return CreateUserOutcome::ValidationError(failure),
        };

        let name = command.name.trim();
        if name.is_empty() {
            return CreateUserOutcome::ValidationError(ValidationFailure::new(
                "NAME_REQUIRED",
                "Name is required",
            ));
        }

        if let Err(failure) = check_password(&self.policy, command.password.expose()) {
            return CreateUserOutcome::ValidationError(failure);
        }

        // Business rule: email must be unique
        match self.users.find_by_email(&email).await {
            Ok(Some(_)) => return Self::exists(&email),
            Ok(None) => {}
            Err(e) => {
                return CreateUserOutcome::Error(OperationError::caused_by(
                    USER_CREATION_FAILED,
                    format!("Could not check whether '{}' is registered", email),
                    e,
                ))
            }
        }

        let password_hash = match self.hasher.hash(command.password.expose()).await {
            Ok(hash) => hash,
            Err(e) => {
                return CreateUserOutcome::Error(OperationError::caused_by(
                    USER_CREATION_FAILED,
                    format!("Could not hash password for '{}'", email),
                    e,
                ))
            }
        };

        let user = User::new(&email, name, password_hash);

        // A concurrent registration can still win the unique index
        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => return Self::exists(&email),
            Err(e) => {
                return CreateUserOutcome::Error(OperationError::caused_by(
                    USER_CREATION_FAILED,
                    format!("Could not store user '{}'", email),
                    e,
                ))
            }
        }

        self.bus.publish(DomainEvent::UserCreated { user: user.clone() });
        CreateUserOutcome::Success(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hasher, users};
    use crate::usecase::Outcome;

    fn use_case(repo: Arc<dyn UserRepository>) -> CreateUserUseCase {
        CreateUserUseCase::new(repo, hasher(), PasswordPolicy::default(), EventBus::new())
    }

    fn command(email: &str, name: &str, password: &str) -> CreateUserCommand {
        CreateUserCommand {
            email: email.to_string(),
            name: name.to_string(),
            password: Secret::new(password),
        }
    }

    #[test]
    fn test_command_deserialization() {
        let cmd: CreateUserCommand = serde_json::from_str(
            r#"{"email":"ada@example.com","name":"Ada","password":"SecureP@ss123!"}"#,
        )
        .unwrap();
        assert_eq!(cmd.email, "ada@example.com");
        assert!(!format!("{:?}", cmd).contains("SecureP@ss123!"));
    }

    #[tokio::test]
    async fn test_creates_user_with_normalized_email() {
        let repo = users();
        let outcome = use_case(repo.clone())
            .execute(command(" Ada@Example.com ", " Ada ", "SecureP@ss123!"))
            .await;

        let CreateUserOutcome::Success(user) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada");
        assert!(!user.verified);
        assert_ne!(user.password_hash.expose(), "SecureP@ss123!");
        assert!(repo.find_by_id(&user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let use_case = use_case(users());

        let outcome = use_case.execute(command("nope", "Ada", "SecureP@ss123!")).await;
        assert!(matches!(&outcome, CreateUserOutcome::ValidationError(f) if f.code == "INVALID_EMAIL_FORMAT"));

        let outcome = use_case.execute(command("ada@example.com", "  ", "SecureP@ss123!")).await;
        assert!(matches!(&outcome, CreateUserOutcome::ValidationError(f) if f.code == "NAME_REQUIRED"));

        let outcome = use_case.execute(command("ada@example.com", "Ada", "weak")).await;
        assert!(matches!(&outcome, CreateUserOutcome::ValidationError(f) if f.code == "WEAK_PASSWORD"));
        assert_eq!(outcome.channel(), CreateUserChannel::ValidationError);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_user_exists() {
        let use_case = use_case(users());
        use_case
            .execute(command("ada@example.com", "Ada", "SecureP@ss123!"))
            .await;

        let outcome = use_case
            .execute(command("ADA@example.com", "Ada Again", "SecureP@ss123!"))
            .await;
        assert!(matches!(outcome, CreateUserOutcome::UserExists(ref m) if m.contains("ada@example.com")));
    }
}
