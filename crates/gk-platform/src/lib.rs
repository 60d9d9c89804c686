//! Gatekeeper Platform
//!
//! Account management and authentication built from single-shot operations:
//! - Typed operation outcomes with per-channel listeners
//! - In-process domain event bus with subscriber bootstrap
//! - Users, one-time tokens and account emails
//! - Argon2id password hashing and HS256 access tokens
//! - REST endpoints
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `operations` - Use case operations

// Aggregates
pub mod email;
pub mod token;
pub mod user;

// Authentication
pub mod auth;

// Shared infrastructure
pub mod shared;

// Cross-cutting concerns
pub mod usecase;

// HTTP surface and wiring
pub mod api;
pub mod app;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;

// Re-export use case infrastructure
pub use usecase::{
    Bootstrap, BusError, Channel, DomainEvent, DomainEventKind, EventBus, EventEnvelope, EventHandler,
    Operation, OperationError, OperationHandle, Outcome, Subscriptions, ValidationFailure,
};
// Note: outcome! and details! are exported at crate root via #[macro_export]

// Re-export main entity types for convenience
pub use token::entity::{Token, TokenKind, TokenPolicy};
pub use user::entity::User;

// Re-export repositories
pub use token::repository::{InMemoryTokenRepository, MongoTokenRepository, TokenRepository};
pub use user::repository::{InMemoryUserRepository, MongoUserRepository, UserRepository};

pub use app::{Collaborators, Gatekeeper};
