//! Worker Configuration
//!
//! All secrets come from environment variables, never from requests:
//!
//! - `POLAR_WEBHOOK_SECRET` (required): webhook HMAC key, used as raw UTF-8
//! - `ED25519_PRIVATE_KEY` (required): base64 signing key
//! - `RESEND_API_KEY` (required): email API bearer token
//! - `LICENSE_TIER` (optional): tier written into tokens (default: `pro`)
//! - `LICENSE_EMAIL_FROM` / `LICENSE_EMAIL_SUBJECT` (optional)
//! - `RESEND_API_URL` (optional): email endpoint override
//! - `RESEND_TIMEOUT_SECS` (optional): per-send timeout (default: 10)
//!
//! Key material is decoded here, so a bad key stops the process at startup
//! instead of failing individual webhooks.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::license::{LicenseError, LicenseSigner, DEFAULT_TIER};
use crate::notify::resend::{DEFAULT_FROM, DEFAULT_SUBJECT, DEFAULT_TIMEOUT};
use crate::notify::{ResendConfig, DEFAULT_RESEND_API_URL};

/// Webhook HMAC secret variable
pub const ENV_WEBHOOK_SECRET: &str = "POLAR_WEBHOOK_SECRET";
/// Signing key variable
pub const ENV_PRIVATE_KEY: &str = "ED25519_PRIVATE_KEY";
/// Email API key variable
pub const ENV_RESEND_API_KEY: &str = "RESEND_API_KEY";
/// Tier override variable
pub const ENV_TIER: &str = "LICENSE_TIER";
/// Sender override variable
pub const ENV_EMAIL_FROM: &str = "LICENSE_EMAIL_FROM";
/// Subject override variable
pub const ENV_EMAIL_SUBJECT: &str = "LICENSE_EMAIL_SUBJECT";
/// Email endpoint override variable
pub const ENV_RESEND_API_URL: &str = "RESEND_API_URL";
/// Email timeout override variable
pub const ENV_RESEND_TIMEOUT: &str = "RESEND_TIMEOUT_SECS";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// The signing key could not be decoded
    #[error("ED25519_PRIVATE_KEY is invalid: {0}")]
    InvalidSigningKey(#[from] LicenseError),

    /// A variable has an unusable value
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Fully validated worker configuration.
pub struct WorkerConfig {
    /// Webhook HMAC key bytes
    pub webhook_secret: String,
    /// Ready-to-use token signer
    pub signer: LicenseSigner,
    /// Tier stamped into every payload
    pub tier: String,
    /// Email delivery settings
    pub resend: ResendConfig,
}

impl WorkerConfig {
    /// Load from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| non_empty(name).ok_or(ConfigError::Missing(name));

        let webhook_secret = required(ENV_WEBHOOK_SECRET)?;
        let signer = LicenseSigner::from_base64(&required(ENV_PRIVATE_KEY)?)?;
        let api_key = required(ENV_RESEND_API_KEY)?;

        let timeout = match non_empty(ENV_RESEND_TIMEOUT) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    name: ENV_RESEND_TIMEOUT,
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: ENV_RESEND_TIMEOUT,
                        reason: "must be greater than 0".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let resend = ResendConfig {
            api_url: non_empty(ENV_RESEND_API_URL)
                .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
            api_key,
            from: non_empty(ENV_EMAIL_FROM).unwrap_or_else(|| DEFAULT_FROM.to_string()),
            subject: non_empty(ENV_EMAIL_SUBJECT).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            timeout,
        };

        let tier = non_empty(ENV_TIER).unwrap_or_else(|| DEFAULT_TIER.to_string());

        info!(
            tier = %tier,
            email_api = %resend.api_url,
            "Configuration loaded"
        );

        Ok(Self {
            webhook_secret,
            signer,
            tier,
            resend,
        })
    }
}

impl std::fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("webhook_secret", &"<redacted>")
            .field("signer", &self.signer)
            .field("tier", &self.tier)
            .field("resend", &self.resend)
            .finish()
    }
}
