//! MongoDB Index Initialization
//!
//! Creates indexes for all collections on application startup.

use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};
use std::time::Duration;
use tracing::info;

use crate::token::repository::TOKENS_COLLECTION;
use crate::user::repository::USERS_COLLECTION;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_user_indexes(db).await?;
    create_token_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_user_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>(USERS_COLLECTION);

    // Email lookup, one account per address
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build(),
    ).await?;

    Ok(())
}

async fn create_token_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>(TOKENS_COLLECTION);

    // Lookup by presented value
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "kind": 1, "value": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build(),
    ).await?;

    // Latest token per user, and bulk invalidation
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "userId": 1, "kind": 1, "createdAt": -1 })
            .build(),
    ).await?;

    // Expired tokens are purged by MongoDB
    collection.create_index(
        IndexModel::builder()
            .keys(doc! { "expiresAt": 1 })
            .options(IndexOptions::builder().expire_after(Duration::from_secs(0)).build())
            .build(),
    ).await?;

    Ok(())
}
