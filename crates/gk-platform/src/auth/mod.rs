//! Authentication Collaborators
//!
//! - `PasswordService` - Argon2id hashing behind the `PasswordHasher` trait
//! - `PasswordPolicy` - rules for new passwords
//! - `RandomTokenGenerator` - values for verification and reset tokens
//! - `JwtIssuer` - HS256 access tokens behind the `AccessTokenIssuer` trait

pub mod access_token;
pub mod password_service;
pub mod token_generator;

pub use access_token::{extract_bearer_token, AccessGrant, AccessTokenClaims, AccessTokenIssuer, JwtIssuer};
pub use password_service::{Argon2Config, PasswordHasher, PasswordPolicy, PasswordService};
pub use token_generator::{RandomTokenGenerator, TokenGenerator};
