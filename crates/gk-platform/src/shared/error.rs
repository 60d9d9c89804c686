//! Platform Error Types
//!
//! Failures of collaborators (storage, hashing, token signing, email). Operations
//! never return these; they wrap them as the cause of an `OperationError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Duplicate entity: {entity_type} with {field}={value}")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Token signing error: {message}")]
    TokenSigning { message: String },

    #[error("Email delivery error: {message}")]
    Email { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn password_hash(message: impl Into<String>) -> Self {
        Self::PasswordHash { message: message.into() }
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::Email { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
