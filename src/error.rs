//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The kind of record a lookup failed to find.
///
/// OTP misses are reported differently from the others: a wrong code and an
/// already-consumed code are indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Otp,
    Shop,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Otp => "OTP",
            Resource::Shop => "Shop",
        };
        f.write_str(name)
    }
}

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation**: malformed input (phone format, missing fields, negative stock)
/// - **NotFound**: no matching shop or OTP record
/// - **Conflict**: duplicate product, shop id or license number
/// - **Expired**: OTP past its expiry
/// - **Unauthorized / Forbidden**: session token problems and ownership checks
/// - **Database / Internal**: store unavailable or unexpected failure
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    Validation(String),

    /// No record matched the lookup.
    #[error("{0} not found")]
    NotFound(Resource),

    /// The write would violate a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// The OTP matched but its expiry has passed.
    #[error("OTP expired")]
    Expired,

    /// Session token missing, malformed, badly signed or expired, or the
    /// supplied credentials did not match.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed to touch the target resource.
    #[error("Forbidden")]
    Forbidden,

    /// Anything else that should never reach the client verbatim.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "success": false,
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database and internal failures are logged here and replaced with a
/// generic message so stack details never leave the process.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::NotFound(Resource::Otp) => (
                StatusCode::BAD_REQUEST,
                "invalid_otp",
                "Invalid OTP".to_string(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Conflict(ref msg) => (StatusCode::BAD_REQUEST, "conflict", msg.clone()),
            AppError::Expired => (StatusCode::BAD_REQUEST, "otp_expired", self.to_string()),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Internal(ref detail) => {
                tracing::error!(error = %detail, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Check that a phone number is exactly 10 ASCII digits.
pub fn validate_phone_number(phone_number: &str) -> Result<(), AppError> {
    if phone_number.len() == 10 && phone_number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Valid 10-digit phone number required".to_string(),
        ))
    }
}
