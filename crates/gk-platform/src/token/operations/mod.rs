//! Token Operations
//!
//! Subscribers keeping one-time tokens in step with the user lifecycle.

pub mod create_on_user_creation;
pub mod invalidate_on_user_deletion;

pub use create_on_user_creation::{
    CreateTokenOnUserCreation, CreateTokenOnUserCreationChannel, CreateTokenOnUserCreationOutcome,
};
pub use invalidate_on_user_deletion::{
    InvalidateTokensOnUserDeletion, InvalidateTokensOnUserDeletionChannel,
    InvalidateTokensOnUserDeletionOutcome,
};
