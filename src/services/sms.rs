//! Out-of-band OTP delivery.
//!
//! Delivery is best effort: the OTP ledger logs a failed send and still
//! reports the code as issued.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone_number: &str, message: &str) -> Result<(), AppError>;
}

/// Writes messages to the log instead of sending them.
///
/// The message carries the code, so it is only emitted at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone_number: &str, message: &str) -> Result<(), AppError> {
        tracing::info!(phone = %phone_number, "SMS gateway not configured, message logged");
        tracing::debug!(phone = %phone_number, %message, "SMS body");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct GatewayPayload<'a> {
    to: &'a str,
    message: &'a str,
}

/// Posts messages as JSON to an HTTP SMS gateway.
///
/// # Headers Sent
///
/// - `Content-Type: application/json`
/// - `X-Gateway-Signature: sha256=<hex>` when a secret is configured
///
/// # Timeout
///
/// 5 seconds per message
#[derive(Debug, Clone)]
pub struct HttpSmsSender {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl HttpSmsSender {
    pub fn new(url: String, secret: Option<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client error: {e}")))?;

        Ok(Self {
            client,
            url,
            secret,
        })
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, phone_number: &str, message: &str) -> Result<(), AppError> {
        let body = serde_json::to_string(&GatewayPayload {
            to: phone_number,
            message,
        })
        .map_err(|e| AppError::Internal(format!("Failed to serialize SMS payload: {e}")))?;

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.secret {
            request = request.header("X-Gateway-Signature", generate_signature(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("SMS gateway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Internal(format!(
                "SMS gateway returned {status}"
            )));
        }

        Ok(())
    }
}

/// Generate HMAC-SHA256 signature for a gateway payload.
///
/// # Format
///
/// `sha256=<hex_encoded_hmac>`
fn generate_signature(secret: &str, payload: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid gateway secret: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Text of the SMS carrying a passcode.
pub fn otp_message(code: &str) -> String {
    format!("Your ration shop login code is {code}. It expires in 5 minutes.")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_prefixed_hex_and_keyed() {
        let a = generate_signature("secret", "{\"to\":\"1\"}").unwrap();
        let b = generate_signature("other", "{\"to\":\"1\"}").unwrap();

        assert!(a.starts_with("sha256="));
        assert_eq!(a.len(), "sha256=".len() + 64);
        assert_ne!(a, b);
    }

    #[test]
    fn message_contains_code() {
        assert!(otp_message("4821").contains("4821"));
    }
}
