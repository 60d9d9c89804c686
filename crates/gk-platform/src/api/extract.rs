//! Request body extraction.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::response::Response;
use axum::Json;

use super::error::validation_response;
use crate::usecase::ValidationFailure;

pub const INVALID_REQUEST_BODY: &str = "INVALID_REQUEST_BODY";

/// JSON body whose rejections use the API error shape.
///
/// A malformed, mistyped or incomplete body becomes a 400 `VALIDATION_ERROR`
/// with `details.code` set to [`INVALID_REQUEST_BODY`].
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(validation_response(ValidationFailure::new(
                INVALID_REQUEST_BODY,
                rejection.body_text(),
            ))),
        }
    }
}
