//! Request extractors that report failures through [`AppError`].

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::error::AppError;

/// JSON request body.
///
/// Same as [`axum::Json`], except a missing field, a wrong type or a body
/// that is not JSON at all comes back as a `validation_error` instead of
/// axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
