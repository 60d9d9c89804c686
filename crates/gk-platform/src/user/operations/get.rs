//! Get User Use Case

use std::sync::Arc;

use async_trait::async_trait;

use crate::usecase::{Operation, OperationError};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

pub const USER_LOOKUP_FAILED: &str = "USER_LOOKUP_FAILED";

crate::outcome! {
    pub enum GetUserOutcome via GetUserChannel {
        Success(User),
        UserNotFound(String) => "USER_NOT_FOUND",
    }
}

pub struct GetUserUseCase {
    users: Arc<dyn UserRepository>,
}

impl GetUserUseCase {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Operation for GetUserUseCase {
    type Input = String;
    type Outcome = GetUserOutcome;

    async fn execute(&self, user_id: String) -> GetUserOutcome {
        match self.users.find_by_id(&user_id).await {
            Ok(Some(user)) => GetUserOutcome::Success(user),
            Ok(None) => GetUserOutcome::UserNotFound(format!("User '{}' not found", user_id)),
            Err(e) => GetUserOutcome::Error(OperationError::caused_by(
                USER_LOOKUP_FAILED,
                format!("Could not load user '{}'", user_id),
                e,
            )),
        }
    }
}
