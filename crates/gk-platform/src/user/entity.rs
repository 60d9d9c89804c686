//! User Entity

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use gk_common::Secret;
use serde::{Deserialize, Serialize};

use crate::shared::tsid::TsidGenerator;

/// An account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// TSID (Crockford Base32 string)
    #[serde(rename = "_id")]
    pub id: String,

    /// Email address, trimmed and lower-cased (unique)
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id PHC string
    pub password_hash: Secret,

    /// Email ownership confirmed
    #[serde(default)]
    pub verified: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TsidGenerator::generate(),
            email: email.into(),
            name: name.into(),
            password_hash: Secret::new(password_hash),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = Secret::new(password_hash);
        self.updated_at = Utc::now();
    }
}
