//! API error bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::usecase::{OperationError, ValidationFailure};

/// Standard API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Response for a domain channel carrying a message.
pub(crate) fn channel_response(status: StatusCode, channel: &str, message: String) -> Response {
    ApiError::new(channel, message).into_response_with(status)
}

/// 400 `VALIDATION_ERROR`; `details` holds the failure's own code and fields.
pub(crate) fn validation_response(failure: ValidationFailure) -> Response {
    let message = failure.message.clone();
    let details = serde_json::to_value(&failure).ok();
    let mut body = ApiError::new("VALIDATION_ERROR", message);
    body.details = details;
    body.into_response_with(StatusCode::BAD_REQUEST)
}

/// 500 with the operation's failure code. The cause stays in the logs.
pub(crate) fn operation_error_response(error: &OperationError) -> Response {
    ApiError::new(error.code(), error.message()).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}
