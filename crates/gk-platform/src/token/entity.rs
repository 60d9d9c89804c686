//! Token Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use gk_common::Secret;
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;

/// Purpose of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Confirms ownership of the account's email address
    Verification,
    /// Authorizes one password change
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verification => "VERIFICATION",
            Self::PasswordReset => "PASSWORD_RESET",
        }
    }
}

/// A single-use secret bound to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "_id")]
    pub id: String,

    pub user_id: String,

    pub kind: TokenKind,

    /// Value presented by the user
    pub value: Secret,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn new(user_id: impl Into<String>, kind: TokenKind, value: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            user_id: user_id.into(),
            kind,
            value: Secret::new(value),
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Lifetimes of issued tokens
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub verification_ttl: Duration,
    pub reset_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            verification_ttl: Duration::hours(24),
            reset_ttl: Duration::minutes(60),
        }
    }
}

impl TokenPolicy {
    /// Out-of-range values fall back to the defaults.
    pub fn from_config(config: &gk_config::TokenConfig) -> Self {
        let defaults = Self::default();
        Self {
            verification_ttl: Duration::try_hours(config.verification_ttl_hours)
                .unwrap_or(defaults.verification_ttl),
            reset_ttl: Duration::try_minutes(config.reset_ttl_minutes).unwrap_or(defaults.reset_ttl),
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Verification => self.verification_ttl,
            TokenKind::PasswordReset => self.reset_ttl,
        }
    }
}
