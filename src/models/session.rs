//! Session token claims and login response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{shop::ShopSession, user::UserResponse};

/// Who a session token speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    User,
    Shop,
}

/// Claims embedded in every session token.
///
/// For users `sub` is the user UUID; for shops it is the business `shop_id`,
/// which is what inventory routes are keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// A freshly minted token and when it stops working.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Response body for `POST /api/auth/user/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// Response body for `POST /api/shops/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopLoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub shop: ShopSession,
}
