//! OTP ledger - issues, expires and consumes one-time passcodes.
//!
//! # Lifecycle
//!
//! 1. `issue` deletes every earlier record for the phone number and stores a
//!    fresh 4-digit code valid for five minutes
//! 2. `verify` finds the unused record, checks expiry, then consumes it with a
//!    conditional update so only one concurrent caller can win
//! 3. `sweep` purges records whose expiry is in the past; correctness never
//!    depends on it because `verify` checks expiry itself

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::{
    clock::Clock,
    error::{AppError, Resource, validate_phone_number},
    models::otp::{CodeHasher, IssuedOtp, NewOtp},
    services::sms::{SmsSender, otp_message},
    store::OtpStore,
};

/// How long an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 5;

#[derive(Clone)]
pub struct OtpLedger {
    store: Arc<dyn OtpStore>,
    sms: Arc<dyn SmsSender>,
    clock: Arc<dyn Clock>,
    codes: CodeHasher,
}

impl OtpLedger {
    pub fn new(
        store: Arc<dyn OtpStore>,
        sms: Arc<dyn SmsSender>,
        clock: Arc<dyn Clock>,
        codes: CodeHasher,
    ) -> Self {
        Self {
            store,
            sms,
            clock,
            codes,
        }
    }

    /// Issue a new code for a phone number.
    ///
    /// # Errors
    ///
    /// - `Validation`: phone number is not exactly 10 digits
    /// - `Database`: the store could not replace the record
    ///
    /// SMS delivery failures are logged and do not fail the call.
    pub async fn issue(&self, phone_number: &str) -> Result<IssuedOtp, AppError> {
        validate_phone_number(phone_number)?;

        let code = generate_code();
        let now = self.clock.now();
        let expires_at = now + Duration::minutes(OTP_TTL_MINUTES);

        self.store
            .replace(NewOtp {
                phone_number: phone_number.to_string(),
                code_hash: self.codes.digest(phone_number, &code)?,
                expires_at,
                created_at: now,
            })
            .await?;

        tracing::info!(phone = %phone_number, %expires_at, "OTP issued");

        if let Err(e) = self.sms.send(phone_number, &otp_message(&code)).await {
            tracing::warn!(phone = %phone_number, error = %e, "OTP delivery failed");
        }

        Ok(IssuedOtp { code, expires_at })
    }

    /// Verify and consume a code.
    ///
    /// # Errors
    ///
    /// - `Validation`: phone number is not exactly 10 digits
    /// - `NotFound(Otp)`: wrong code, superseded code, or already consumed
    /// - `Expired`: the code matched but is past its expiry
    pub async fn verify(&self, phone_number: &str, code: &str) -> Result<(), AppError> {
        validate_phone_number(phone_number)?;

        let record = self
            .store
            .find_unused(phone_number, &self.codes.digest(phone_number, code)?)
            .await?
            .ok_or(AppError::NotFound(Resource::Otp))?;

        if record.expires_at < self.clock.now() {
            tracing::info!(phone = %phone_number, "OTP expired");
            return Err(AppError::Expired);
        }

        // Losing the compare-and-set means a concurrent verify consumed it
        if !self.store.consume(record.id).await? {
            return Err(AppError::NotFound(Resource::Otp));
        }

        tracing::info!(phone = %phone_number, "OTP verified");

        Ok(())
    }

    /// Purge records that expired more than `grace` ago.
    pub async fn sweep(&self, grace: Duration) -> Result<u64, AppError> {
        let cutoff: DateTime<Utc> = self.clock.now() - grace;
        let purged = self.store.purge_expired(cutoff).await?;
        if purged > 0 {
            tracing::debug!(purged, "expired OTPs purged");
        }
        Ok(purged)
    }

    /// Run `sweep` forever on a fixed period.
    pub async fn run_sweeper(self, period: std::time::Duration, grace: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep(grace).await {
                tracing::error!(error = %e, "OTP sweep failed");
            }
        }
    }
}

/// Uniform 4-digit code in 1000..=9999.
fn generate_code() -> String {
    rand::rng().random_range(1000..=9999u16).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        services::sms::testing::RecordingSmsSender,
        store::MemoryStore,
    };

    struct Fixture {
        ledger: OtpLedger,
        store: Arc<MemoryStore>,
        sms: Arc<RecordingSmsSender>,
        clock: Arc<ManualClock>,
    }

    fn fixture_with(sms: RecordingSmsSender) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sms = Arc::new(sms);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger = OtpLedger::new(
            store.clone(),
            sms.clone(),
            clock.clone(),
            CodeHasher::new("test-otp-secret"),
        );
        Fixture {
            ledger,
            store,
            sms,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingSmsSender::default())
    }

    const PHONE: &str = "9876543210";

    #[test]
    fn codes_are_four_digits() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), 4);
            let value: u16 = code.parse().unwrap();
            assert!((1000..=9999).contains(&value));
        }
    }

    #[tokio::test]
    async fn issue_rejects_malformed_phone_numbers() {
        let f = fixture();
        for bad in ["", "12345", "98765432101", "98765-4321"] {
            assert!(matches!(
                f.ledger.issue(bad).await,
                Err(AppError::Validation(_))
            ));
        }
        assert_eq!(f.store.otp_count().await, 0);
    }

    #[tokio::test]
    async fn issue_sets_five_minute_expiry_and_sends_sms() {
        let f = fixture();
        let start = f.clock.now();

        let issued = f.ledger.issue(PHONE).await.unwrap();

        assert_eq!(issued.expires_at, start + Duration::minutes(5));
        let sent = f.sms.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, PHONE);
        assert!(sent[0].1.contains(&issued.code));
    }

    #[tokio::test]
    async fn verify_succeeds_exactly_once() {
        let f = fixture();
        let issued = f.ledger.issue(PHONE).await.unwrap();

        f.ledger.verify(PHONE, &issued.code).await.unwrap();
        assert!(matches!(
            f.ledger.verify(PHONE, &issued.code).await,
            Err(AppError::NotFound(Resource::Otp))
        ));
    }

    #[tokio::test]
    async fn wrong_code_is_not_found() {
        let f = fixture();
        let issued = f.ledger.issue(PHONE).await.unwrap();
        let wrong = if issued.code == "1000" { "1001" } else { "1000" };

        assert!(matches!(
            f.ledger.verify(PHONE, wrong).await,
            Err(AppError::NotFound(Resource::Otp))
        ));
        assert!(matches!(
            f.ledger.verify("1111111111", &issued.code).await,
            Err(AppError::NotFound(Resource::Otp))
        ));
    }

    #[tokio::test]
    async fn verify_after_five_minutes_is_expired() {
        let f = fixture();
        let issued = f.ledger.issue(PHONE).await.unwrap();

        f.clock.advance(Duration::minutes(5) + Duration::seconds(1));

        assert!(matches!(
            f.ledger.verify(PHONE, &issued.code).await,
            Err(AppError::Expired)
        ));
    }

    #[tokio::test]
    async fn verify_at_exact_expiry_still_succeeds() {
        let f = fixture();
        let issued = f.ledger.issue(PHONE).await.unwrap();

        f.clock.advance(Duration::minutes(5));

        f.ledger.verify(PHONE, &issued.code).await.unwrap();
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_code() {
        let f = fixture();
        let first = f.ledger.issue(PHONE).await.unwrap();
        let mut second = f.ledger.issue(PHONE).await.unwrap();
        // Same code drawn twice would make the first one trivially valid again
        while second.code == first.code {
            second = f.ledger.issue(PHONE).await.unwrap();
        }

        assert!(f.ledger.verify(PHONE, &first.code).await.is_err());
        f.ledger.verify(PHONE, &second.code).await.unwrap();
        assert_eq!(f.store.otp_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_verifies_only_one_wins() {
        let f = fixture();
        let issued = f.ledger.issue(PHONE).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = f.ledger.clone();
            let code = issued.code.clone();
            handles.push(tokio::spawn(async move { ledger.verify(PHONE, &code).await }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(e) => assert!(matches!(e, AppError::NotFound(Resource::Otp))),
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_fail_issue() {
        let f = fixture_with(RecordingSmsSender {
            fail: true,
            ..Default::default()
        });

        let issued = f.ledger.issue(PHONE).await.unwrap();
        f.ledger.verify(PHONE, &issued.code).await.unwrap();
    }

    #[tokio::test]
    async fn sweep_purges_after_grace() {
        let f = fixture();
        f.ledger.issue(PHONE).await.unwrap();

        f.clock.advance(Duration::minutes(6));
        assert_eq!(f.ledger.sweep(Duration::minutes(2)).await.unwrap(), 0);

        f.clock.advance(Duration::minutes(2));
        assert_eq!(f.ledger.sweep(Duration::minutes(2)).await.unwrap(), 1);
        assert_eq!(f.store.otp_count().await, 0);
    }
}
