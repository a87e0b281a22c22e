//! Find-or-create of phone-verified users.

use std::sync::Arc;

use crate::{
    error::{AppError, validate_phone_number},
    models::user::User,
    store::UserStore,
};

#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Upsert the user for a phone number that just passed OTP verification.
    ///
    /// Idempotent: repeated logins keep a single record, verified.
    pub async fn resolve_or_create(&self, phone_number: &str) -> Result<User, AppError> {
        validate_phone_number(phone_number)?;

        let user = self.users.upsert_verified(phone_number).await?;
        tracing::info!(user_id = %user.id, phone = %phone_number, "user resolved");

        Ok(user)
    }
}
