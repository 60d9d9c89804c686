//! Token Repository

use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::FindOneOptions;
use mongodb::{Collection, Database};
use parking_lot::RwLock;

use crate::shared::error::{PlatformError, Result};
use crate::token::entity::{Token, TokenKind};
use crate::user::repository::is_duplicate_key;

pub const TOKENS_COLLECTION: &str = "tokens";

/// Storage of issued tokens.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, token: &Token) -> Result<()>;

    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>>;

    /// Most recently created token of `kind` for `user_id`.
    async fn find_latest_for_user(&self, user_id: &str, kind: TokenKind) -> Result<Option<Token>>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Remove every token of `user_id`; returns how many were removed.
    async fn delete_for_user(&self, user_id: &str) -> Result<u64>;
}

pub struct MongoTokenRepository {
    collection: Collection<Token>,
}

impl MongoTokenRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(TOKENS_COLLECTION),
        }
    }
}

#[async_trait]
impl TokenRepository for MongoTokenRepository {
    async fn insert(&self, token: &Token) -> Result<()> {
        match self.collection.insert_one(token).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => {
                Err(PlatformError::duplicate("Token", "value", token.kind.as_str()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>> {
        Ok(self
            .collection
            .find_one(doc! { "kind": kind.as_str(), "value": value })
            .await?)
    }

    async fn find_latest_for_user(&self, user_id: &str, kind: TokenKind) -> Result<Option<Token>> {
        let options = FindOneOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();
        Ok(self
            .collection
            .find_one(doc! { "userId": user_id, "kind": kind.as_str() })
            .with_options(options)
            .await?)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let result = self.collection.delete_many(doc! { "userId": user_id }).await?;
        Ok(result.deleted_count)
    }
}

/// Process-local storage for development and tests.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<String, Token>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens currently held for `user_id`.
    pub fn count_for_user(&self, user_id: &str) -> usize {
        self.tokens
            .read()
            .values()
            .filter(|t| t.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: &Token) -> Result<()> {
        self.tokens.write().insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn find_by_value(&self, kind: TokenKind, value: &str) -> Result<Option<Token>> {
        Ok(self
            .tokens
            .read()
            .values()
            .find(|t| t.kind == kind && t.value.expose() == value)
            .cloned())
    }

    async fn find_latest_for_user(&self, user_id: &str, kind: TokenKind) -> Result<Option<Token>> {
        Ok(self
            .tokens
            .read()
            .values()
            .filter(|t| t.user_id == user_id && t.kind == kind)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.tokens.write().remove(id).is_some())
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }
}
