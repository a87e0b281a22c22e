//! End-user login.
//!
//! - POST /api/auth/user/login - Phone number + OTP in, session token out

use axum::{Json, extract::State};

use crate::{
    error::AppError,
    extract::AppJson,
    models::{
        otp::VerifyOtpRequest,
        session::{SubjectType, UserLoginResponse},
    },
    state::AppState,
};

/// Log a user in with a phone number and OTP.
///
/// # Flow
///
/// 1. Verify and consume the OTP
/// 2. Find or create the user, marking them verified
/// 3. Mint a seven-day user session
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Login successful",
///   "token": "eyJ...",
///   "expiresAt": "2025-12-28T10:00:00Z",
///   "user": { "id": "...", "phoneNumber": "9876543210", "name": "", "isVerified": true }
/// }
/// ```
pub async fn user_login(
    State(state): State<AppState>,
    AppJson(request): AppJson<VerifyOtpRequest>,
) -> Result<Json<UserLoginResponse>, AppError> {
    state
        .otp
        .verify(&request.phone_number, &request.otp)
        .await?;

    let user = state
        .identities
        .resolve_or_create(&request.phone_number)
        .await?;

    let session = state
        .sessions
        .issue(&user.id.to_string(), SubjectType::User)?;

    Ok(Json(UserLoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token: session.token,
        expires_at: session.expires_at,
        user: user.into(),
    }))
}
