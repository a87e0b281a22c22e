//! End-user identities created by phone-number login.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. `phone_number` is unique, and so is
/// `ration_card_number` when present.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Exactly 10 digits
    pub phone_number: String,

    pub name: String,

    /// Set on every successful OTP login
    pub is_verified: bool,

    pub ration_card_number: Option<String>,

    /// Household size, at least 1
    pub family_members: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// The slice of a user returned by the login endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub name: String,
    pub is_verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            name: user.name,
            is_verified: user.is_verified,
        }
    }
}
