//! OTP HTTP handlers.
//!
//! - POST /api/otp/send - Issue a code for a phone number
//! - POST /api/otp/verify - Check and consume a code

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{
    error::AppError,
    extract::AppJson,
    models::otp::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest},
    state::AppState,
};

/// Issue a new OTP.
///
/// # Request Body
///
/// ```json
/// { "phoneNumber": "9876543210" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: code issued; `otp` is included only in development
/// - **Error (400)**: phone number is not 10 digits
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, AppError> {
    let issued = state.otp.issue(&request.phone_number).await?;

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent successfully".to_string(),
        expires_at: issued.expires_at,
        otp: state.expose_otp.then_some(issued.code),
    }))
}

/// Verify and consume an OTP without logging in.
///
/// # Response
///
/// - **Success (200 OK)**
/// - **Error (400)**: invalid, already used, or expired code
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<VerifyOtpRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .otp
        .verify(&request.phone_number, &request.otp)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "OTP verified successfully"
    })))
}
