//! User Aggregate
//!
//! Accounts, their storage and the operations acting on them.

pub mod entity;
pub mod operations;
pub mod repository;

pub use entity::User;
pub use repository::{InMemoryUserRepository, MongoUserRepository, UserRepository};
