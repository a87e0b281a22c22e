//! Session token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the token from the Authorization header
//! 2. Verify its signature and expiry
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::session::SubjectType, state::AppState};

/// Authentication context attached to authenticated requests.
///
/// Route handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User UUID or business shop id, depending on `subject_type`
    pub subject_id: String,

    pub subject_type: SubjectType,
}

impl AuthContext {
    /// Only the owner of `shop_id` may touch it.
    ///
    /// # Errors
    ///
    /// - `Forbidden`: user token, or a token for another shop
    pub fn require_shop(&self, shop_id: &str) -> Result<(), AppError> {
        if self.subject_type == SubjectType::Shop && self.subject_id == shop_id {
            Ok(())
        } else {
            tracing::warn!(
                subject = %self.subject_id,
                target_shop = %shop_id,
                "shop access denied"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Session authentication middleware function.
///
/// # Headers
///
/// Expected header format:
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::Unauthorized)` if the header is missing or the token is
///   invalid or expired
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let claims = state.sessions.authenticate(token.trim())?;

    request.extensions_mut().insert(AuthContext {
        subject_id: claims.sub,
        subject_type: claims.subject_type,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_shop_checks_type_and_id() {
        let shop = AuthContext {
            subject_id: "SHOP001".to_string(),
            subject_type: SubjectType::Shop,
        };
        assert!(shop.require_shop("SHOP001").is_ok());
        assert!(matches!(
            shop.require_shop("SHOP002"),
            Err(AppError::Forbidden)
        ));

        let user = AuthContext {
            subject_id: "SHOP001".to_string(),
            subject_type: SubjectType::User,
        };
        assert!(matches!(
            user.require_shop("SHOP001"),
            Err(AppError::Forbidden)
        ));
    }
}
