//! Delete User Use Case

use std::sync::Arc;

use async_trait::async_trait;

use crate::usecase::{DomainEvent, EventBus, Operation, OperationError};
use crate::user::repository::UserRepository;

pub const USER_DELETION_FAILED: &str = "USER_DELETION_FAILED";

crate::outcome! {
    pub enum DeleteUserOutcome via DeleteUserChannel {
        Success(String),
        UserNotFound(String) => "USER_NOT_FOUND",
    }
}

/// Removes an account and publishes `UserDeleted`.
pub struct DeleteUserUseCase {
    users: Arc<dyn UserRepository>,
    bus: EventBus,
}

impl DeleteUserUseCase {
    pub fn new(users: Arc<dyn UserRepository>, bus: EventBus) -> Self {
        Self { users, bus }
    }
}

#[async_trait]
impl Operation for DeleteUserUseCase {
    type Input = String;
    type Outcome = DeleteUserOutcome;

    async fn execute(&self, user_id: String) -> DeleteUserOutcome {
        match self.users.delete(&user_id).await {
            Ok(true) => {
                self.bus.publish(DomainEvent::UserDeleted { user_id: user_id.clone() });
                DeleteUserOutcome::Success(user_id)
            }
            Ok(false) => DeleteUserOutcome::UserNotFound(format!("User '{}' not found", user_id)),
            Err(e) => DeleteUserOutcome::Error(OperationError::caused_by(
                USER_DELETION_FAILED,
                format!("Could not delete user '{}'", user_id),
                e,
            )),
        }
    }
}
