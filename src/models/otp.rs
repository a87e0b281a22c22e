//! One-time passcode records and the request/response bodies of the OTP endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Represents an OTP record from the database.
///
/// # Database Table
///
/// Maps to the `otps` table. At most one row per phone number is unused and
/// unexpired at any time: issuing a new code deletes every earlier row for
/// that number first.
///
/// # Code Storage
///
/// The 4-digit code itself is never stored. Only an HMAC-SHA256 of the phone
/// number and code, keyed with a server secret, is persisted; lookups hash
/// the candidate the same way. Four digits are trivial to enumerate, so the
/// key is what keeps a leaked table from giving the codes away.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRecord {
    pub id: Uuid,

    /// 10-digit phone number the code was issued to
    pub phone_number: String,

    /// HMAC-SHA256 of phone number and code (64 hex characters)
    pub code_hash: String,

    /// Verification after this instant fails with `Expired`
    pub expires_at: DateTime<Utc>,

    /// Flipped exactly once, by a conditional update
    pub is_used: bool,

    pub created_at: DateTime<Utc>,
}

/// Fields needed to persist a freshly issued code.
#[derive(Debug, Clone)]
pub struct NewOtp {
    pub phone_number: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Keyed digest of OTP codes for storage and lookup.
#[derive(Clone)]
pub struct CodeHasher {
    key: Vec<u8>,
}

impl CodeHasher {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Hex HMAC over `phone_number:code`.
    pub fn digest(&self, phone_number: &str, code: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(format!("Invalid OTP secret: {e}")))?;
        mac.update(phone_number.as_bytes());
        mac.update(b":");
        mac.update(code.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// A code handed back by the ledger so it can be delivered.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Request body for `POST /api/otp/send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[serde(default)]
    pub phone_number: String,
}

/// Response body for `POST /api/otp/send`.
///
/// `otp` is only populated in development so the frontend can be exercised
/// without a real SMS gateway.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// Request body for `POST /api/otp/verify` and `POST /api/auth/user/login`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub otp: String,
}
