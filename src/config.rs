//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Deployment environment. Only `development` echoes issued OTPs back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Production,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORE_BACKEND` (optional): `postgres` (default) or `memory`
/// - `DATABASE_URL` (required for postgres): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 5000
/// - `JWT_SECRET` (required): session token signing secret
/// - `OTP_SECRET` (optional): key for stored OTP digests, defaults to `JWT_SECRET`
/// - `APP_ENV` (optional): `development` or `production` (default)
/// - `SMS_GATEWAY_URL` / `SMS_GATEWAY_SECRET` (optional): OTP delivery endpoint
/// - `OTP_SWEEP_INTERVAL_SECS` / `OTP_SWEEP_GRACE_SECS` (optional): expiry sweep tuning
/// - `SEED_SAMPLE_SHOPS` (optional): seed demo shops into an empty store, defaults to true
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend")]
    pub store_backend: StoreBackend,

    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub jwt_secret: String,

    pub otp_secret: Option<String>,

    #[serde(default = "default_env")]
    pub app_env: AppEnv,

    pub sms_gateway_url: Option<String>,

    pub sms_gateway_secret: Option<String>,

    #[serde(default = "default_sweep_interval")]
    pub otp_sweep_interval_secs: u64,

    #[serde(default)]
    pub otp_sweep_grace_secs: u64,

    #[serde(default = "default_seed")]
    pub seed_sample_shops: bool,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Postgres
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    5000
}

fn default_env() -> AppEnv {
    AppEnv::Production
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_seed() -> bool {
    true
}

/// Configuration that parsed but does not make sense together.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL is required when STORE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("JWT_SECRET must not be empty")]
    EmptySecret,

    #[error("SMS_GATEWAY_URL is not a valid http(s) URL")]
    InvalidGatewayUrl,

    #[error("OTP_SWEEP_INTERVAL_SECS must be greater than zero")]
    ZeroSweepInterval,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    /// - The combination is inconsistent (see [`Config::validate`])
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks envy cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_backend == StoreBackend::Postgres
            && self.database_url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        if let Some(raw) = &self.sms_gateway_url {
            let parsed = url::Url::parse(raw).map_err(|_| ConfigError::InvalidGatewayUrl)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidGatewayUrl);
            }
        }

        if self.otp_sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }

        Ok(())
    }

    pub fn exposes_otp(&self) -> bool {
        self.app_env == AppEnv::Development
    }

    /// Key for OTP digests. Rotating it invalidates codes already issued.
    pub fn otp_secret(&self) -> &str {
        self.otp_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.jwt_secret)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        database_url: None,
        server_port: 0,
        jwt_secret: "test-secret".to_string(),
        otp_secret: None,
        app_env: AppEnv::Development,
        sms_gateway_url: None,
        sms_gateway_secret: None,
        otp_sweep_interval_secs: 60,
        otp_sweep_grace_secs: 0,
        seed_sample_shops: false,
    }
}
