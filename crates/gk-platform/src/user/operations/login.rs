//! Login Use Case

use std::sync::Arc;

use async_trait::async_trait;
use gk_common::Secret;
use serde::Deserialize;

use super::normalize_email;
use crate::auth::{AccessGrant, AccessTokenIssuer, PasswordHasher};
use crate::usecase::{Operation, OperationError, ValidationFailure};
use crate::user::repository::UserRepository;

pub const LOGIN_FAILED: &str = "LOGIN_FAILED";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: Secret,
}

crate::outcome! {
    pub enum LoginOutcome via LoginChannel {
        Success(AccessGrant),
        ValidationError(ValidationFailure) => "VALIDATION_ERROR",
        UserNotFound(String) => "USER_NOT_FOUND",
        InvalidCredentials(String) => "INVALID_CREDENTIALS",
        AccountNotVerified(String) => "ACCOUNT_NOT_VERIFIED",
    }
}

/// Exchanges email and password for an access token.
///
/// Credentials are checked before the verification state.
pub struct LoginUseCase {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn AccessTokenIssuer>,
}

impl LoginUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn AccessTokenIssuer>,
    ) -> Self {
        Self { users, hasher, issuer }
    }

    fn failed<E>(message: String, cause: E) -> LoginOutcome
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LoginOutcome::Error(OperationError::caused_by(LOGIN_FAILED, message, cause))
    }
}

#[async_trait]
impl Operation for LoginUseCase {
    type Input = LoginCommand;
    type Outcome = LoginOutcome;

    async fn execute(&self, command: LoginCommand) -> LoginOutcome {
        let email = match normalize_email(&command.email) {
            Ok(email) => email,
            Err(failure) => return LoginOutcome::ValidationError(failure),
        };
        if command.password.expose().is_empty() {
            return LoginOutcome::ValidationError(ValidationFailure::new(
                "PASSWORD_REQUIRED",
                "Password is required",
            ));
        }

        let user = match self.users.find_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return LoginOutcome::UserNotFound(format!("No account is registered for '{}'", email))
            }
            Err(e) => return Self::failed(format!("Could not load user '{}'", email), e),
        };

        match self
            .hasher
            .verify(command.password.expose(), user.password_hash.expose())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return LoginOutcome::InvalidCredentials("Invalid email or password".to_string())
            }
            Err(e) => return Self::failed(format!("Could not verify password of '{}'", email), e),
        }

        if !user.verified {
            return LoginOutcome::AccountNotVerified(format!(
                "Account '{}' has not been verified yet",
                email
            ));
        }

        match self.issuer.issue(&user) {
            Ok(grant) => LoginOutcome::Success(grant),
            Err(e) => Self::failed(format!("Could not issue access token for '{}'", email), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hasher, jwt, users};
    use crate::user::entity::User;

    async fn setup(verified: bool) -> LoginUseCase {
        let repo = users();
        let hash = hasher().hash("SecureP@ss123!").await.unwrap();
        let mut user = User::new("ada@example.com", "Ada", hash);
        if verified {
            user.mark_verified();
        }
        repo.insert(&user).await.unwrap();
        LoginUseCase::new(repo, hasher(), jwt())
    }

    fn command(email: &str, password: &str) -> LoginCommand {
        LoginCommand {
            email: email.to_string(),
            password: Secret::new(password),
        }
    }

    #[tokio::test]
    async fn test_successful_login_issues_token() {
        let use_case = setup(true).await;
        let outcome = use_case.execute(command("ADA@example.com", "SecureP@ss123!")).await;

        let LoginOutcome::Success(grant) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        let claims = jwt().validate(grant.access_token.expose()).unwrap();
        assert_eq!(claims.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let use_case = setup(true).await;
        let outcome = use_case.execute(command("ada@example.com", "WrongP@ss123!")).await;
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let use_case = setup(true).await;
        let outcome = use_case.execute(command("bob@example.com", "SecureP@ss123!")).await;
        assert!(matches!(outcome, LoginOutcome::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_unverified_account() {
        let use_case = setup(false).await;

        let outcome = use_case.execute(command("ada@example.com", "SecureP@ss123!")).await;
        assert!(matches!(outcome, LoginOutcome::AccountNotVerified(_)));

        // Wrong password wins over the verification state
        let outcome = use_case.execute(command("ada@example.com", "WrongP@ss123!")).await;
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_missing_password() {
        let use_case = setup(true).await;
        let outcome = use_case.execute(command("ada@example.com", "")).await;
        assert!(matches!(outcome, LoginOutcome::ValidationError(f) if f.code == "PASSWORD_REQUIRED"));
    }
}
