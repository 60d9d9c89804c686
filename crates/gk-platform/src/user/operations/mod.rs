//! User Operations
//!
//! Use cases for account lifecycle and authentication.

pub mod create;
pub mod delete;
pub mod forgot_password;
pub mod get;
pub mod login;
pub mod reset_password;
pub mod verify;

pub use create::{CreateUserChannel, CreateUserCommand, CreateUserOutcome, CreateUserUseCase};
pub use delete::{DeleteUserChannel, DeleteUserOutcome, DeleteUserUseCase};
pub use forgot_password::{
    ForgotPasswordChannel, ForgotPasswordCommand, ForgotPasswordOutcome, ForgotPasswordUseCase,
};
pub use get::{GetUserChannel, GetUserOutcome, GetUserUseCase};
pub use login::{LoginChannel, LoginCommand, LoginOutcome, LoginUseCase};
pub use reset_password::{
    ResetPasswordChannel, ResetPasswordCommand, ResetPasswordOutcome, ResetPasswordUseCase,
};
pub use verify::{VerifyAccountChannel, VerifyAccountCommand, VerifyAccountOutcome, VerifyAccountUseCase};

use regex::Regex;
use std::sync::OnceLock;

use crate::auth::PasswordPolicy;
use crate::details;
use crate::usecase::ValidationFailure;

/// Email validation pattern
fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
    })
}

/// Trim, lower-case and check an email address.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ValidationFailure> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationFailure::new("EMAIL_REQUIRED", "Email address is required"));
    }
    if !email_pattern().is_match(&email) {
        return Err(ValidationFailure::with_details(
            "INVALID_EMAIL_FORMAT",
            "Invalid email address format",
            details! { "email" => raw },
        ));
    }
    Ok(email)
}

pub(crate) fn check_password(policy: &PasswordPolicy, password: &str) -> Result<(), ValidationFailure> {
    policy.validate(password).map_err(|violations| {
        ValidationFailure::with_details(
            "WEAK_PASSWORD",
            "Password does not meet the password policy",
            details! { "violations" => violations },
        )
    })
}
