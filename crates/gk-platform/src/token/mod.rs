//! One-time Tokens
//!
//! Verification and password-reset tokens sent to users by email.

pub mod entity;
pub mod operations;
pub mod repository;

pub use entity::{Token, TokenKind, TokenPolicy};
pub use repository::{InMemoryTokenRepository, MongoTokenRepository, TokenRepository};
