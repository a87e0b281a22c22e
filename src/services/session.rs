//! Session tokens for users and shop owners.
//!
//! Tokens are HS256 JWTs signed with a shared secret. Expiry is checked
//! against the injected clock rather than inside the JWT library, so the
//! seven-day lifetime can be tested. There is no revocation: expiry is the
//! only way a token stops working.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::AppError,
    models::session::{IssuedSession, SessionClaims, SubjectType},
};

/// Lifetime of every session token.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Sign-and-verify capability for session claims.
pub trait TokenCodec: Send + Sync {
    fn sign(&self, claims: &SessionClaims) -> Result<String, AppError>;

    /// Check the signature and decode. Does not look at `exp`.
    fn verify(&self, token: &str) -> Result<SessionClaims, AppError>;
}

/// HS256 JWT codec.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl TokenCodec for JwtCodec {
    fn sign(&self, claims: &SessionClaims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {e}")))
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Mints and checks session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    codec: Arc<dyn TokenCodec>,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    pub fn new(codec: Arc<dyn TokenCodec>, clock: Arc<dyn Clock>) -> Self {
        Self { codec, clock }
    }

    /// Mint a token for a verified subject, valid for seven days.
    pub fn issue(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
    ) -> Result<IssuedSession, AppError> {
        let now = self.clock.now();
        let expires_at = now + Duration::days(SESSION_TTL_DAYS);

        let claims = SessionClaims {
            sub: subject_id.to_string(),
            subject_type,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        Ok(IssuedSession {
            token: self.codec.sign(&claims)?,
            expires_at,
        })
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: malformed token, bad signature, or expired
    pub fn authenticate(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = self.codec.verify(token)?;

        let expires_at: DateTime<Utc> = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AppError::Unauthorized)?;

        if expires_at <= self.clock.now() {
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn issuer_with(secret: &str, clock: Arc<ManualClock>) -> SessionIssuer {
        SessionIssuer::new(Arc::new(JwtCodec::new(secret)), clock)
    }

    #[test]
    fn issued_token_authenticates_with_subject() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let issuer = issuer_with("secret", clock.clone());

        let session = issuer.issue("SHOP001", SubjectType::Shop).unwrap();
        let claims = issuer.authenticate(&session.token).unwrap();

        assert_eq!(claims.sub, "SHOP001");
        assert_eq!(claims.subject_type, SubjectType::Shop);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert_eq!(session.expires_at, clock.now() + Duration::days(7));
    }

    #[test]
    fn token_expires_after_seven_days() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let issuer = issuer_with("secret", clock.clone());
        let session = issuer.issue("user-1", SubjectType::User).unwrap();

        clock.advance(Duration::days(7) - Duration::seconds(1));
        assert!(issuer.authenticate(&session.token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            issuer.authenticate(&session.token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let signer = issuer_with("secret1", clock.clone());
        let checker = issuer_with("secret2", clock);

        let session = signer.issue("user-1", SubjectType::User).unwrap();
        assert!(matches!(
            checker.authenticate(&session.token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_is_unauthorized() {
        let issuer = issuer_with("secret", Arc::new(ManualClock::new(Utc::now())));
        assert!(matches!(
            issuer.authenticate("not.a.token"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(issuer.authenticate(""), Err(AppError::Unauthorized)));
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let issuer = issuer_with("secret", Arc::new(ManualClock::new(Utc::now())));
        let a = issuer.issue("user-1", SubjectType::User).unwrap();
        let b = issuer.issue("user-1", SubjectType::User).unwrap();
        assert_ne!(a.token, b.token);
    }
}
