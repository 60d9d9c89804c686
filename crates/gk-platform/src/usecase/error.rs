//! Operation Errors
//!
//! `OperationError` is the payload of every operation's `ERROR` channel: a
//! stable code, a human-readable message and, when a collaborator failed, the
//! original cause. `ValidationFailure` is the structured payload of
//! `VALIDATION_ERROR` channels.
//!
//! # Creating Errors with Details
//!
//! ```ignore
//! use gk_platform::usecase::{OperationError, ValidationFailure};
//! use gk_platform::details;
//!
//! // Wrap a repository failure
//! OperationError::caused_by(
//!     "USER_CREATION_FAILED",
//!     format!("Could not create user {}", email),
//!     db_error,
//! );
//!
//! // Validation failure with details
//! ValidationFailure::with_details(
//!     "INVALID_EMAIL_FORMAT",
//!     "Invalid email address format",
//!     details! { "email" => email },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Code emitted when an operation panics inside `execute`.
pub const OPERATION_PANICKED: &str = "OPERATION_PANICKED";

/// Macro for creating error detail maps.
///
/// # Example
///
/// ```ignore
/// use gk_platform::details;
///
/// let details = details! {
///     "email" => "user@example.com",
///     "minLength" => 12
/// };
/// ```
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// Unexpected failure of an operation.
///
/// Immutable once built. Cloning shares the cause.
#[derive(Clone)]
pub struct OperationError {
    code: String,
    message: String,
    details: Option<Cause>,
}

impl OperationError {
    /// Create an error without an underlying cause.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error wrapping the collaborator failure that caused it.
    pub fn caused_by<E>(code: impl Into<String>, message: impl Into<String>, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(Arc::new(cause)),
        }
    }

    /// Stable, machine-readable code.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original cause, if any. Downcast to recover the concrete type.
    pub fn details(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.details.as_deref()
    }
}

impl fmt::Debug for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("details", &self.details.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for OperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.details.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Structured payload of a `VALIDATION_ERROR` channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, serde_json::Value>,
}

impl ValidationFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
