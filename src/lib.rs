//! MarkRight License Worker - Webhook-Driven License Issuance
//!
//! This crate turns a paid purchase into a signed license key in the buyer's
//! inbox. It is stateless: no database, no retries of its own.
//!
//! # Features
//!
//! - **Webhook Authentication**: Standard Webhooks HMAC-SHA256 over the raw body
//! - **License Signing**: Ed25519 tokens verifiable offline by the desktop app
//! - **Email Delivery**: One-shot send through the Resend HTTP API
//! - **Operations**: `/health`, Prometheus `/metrics`, structured tracing
//!
//! # Architecture
//!
//! ```text
//! Payment Provider ──▶ POST /webhook/polar ──▶ WebhookVerifier (HMAC)
//!                                                   │
//!                                                   ▼
//!                                            PurchaseEvent
//!                                                   │
//!                              ┌────────────────────┴─────────┐
//!                              ▼                              ▼
//!                      order.created                    other types
//!                              │                              │
//!                              ▼                              ▼
//!                    LicenseSigner (Ed25519)            200 Ignored
//!                              │
//!                              ▼
//!                    LicenseMailer (Resend) ──▶ Buyer
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use markright_license_worker::{build_issuer, build_router, WorkerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkerConfig::from_env()?;
//!     let issuer = Arc::new(build_issuer(config)?);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8787").await?;
//!     axum::serve(listener, build_router(issuer)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod issuer;
pub mod license;
pub mod metrics;
pub mod notify;
pub mod webhook;

use std::sync::Arc;

// Re-exports for convenience
pub use config::{ConfigError, WorkerConfig};
pub use error::{Error, Result};
pub use handlers::build_router;
pub use issuer::{IssuanceError, IssuanceOutcome, LicenseIssuer};
pub use license::{LicensePayload, LicenseSigner, LicenseToken};
pub use metrics::IssuanceMetrics;
pub use notify::{LicenseMailer, ResendConfig, ResendMailer};
pub use webhook::{PurchaseEvent, StandardWebhookVerifier, WebhookVerifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Wire the production pipeline from a validated configuration.
///
/// Fails only if the HMAC key or the HTTP client cannot be constructed.
pub fn build_issuer(config: WorkerConfig) -> Result<LicenseIssuer> {
    let verifier = StandardWebhookVerifier::new(config.webhook_secret.as_bytes())
        .map_err(|e| Error::generic(format!("webhook secret rejected: {e}")))?;
    let mailer = ResendMailer::new(config.resend)?;

    Ok(LicenseIssuer::new(
        Arc::new(verifier),
        Arc::new(config.signer),
        Arc::new(mailer),
        config.tier,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_build_issuer_from_config() {
        let vars: HashMap<&str, &str> = [
            (config::ENV_WEBHOOK_SECRET, "whs_secret"),
            (
                config::ENV_PRIVATE_KEY,
                "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA=",
            ),
            (config::ENV_RESEND_API_KEY, "re_key"),
            (config::ENV_TIER, "team"),
        ]
        .into_iter()
        .collect();
        let config = WorkerConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        let issuer = build_issuer(config).unwrap();
        assert_eq!(issuer.tier(), "team");
        assert_eq!(issuer.metrics().snapshot().webhooks_received, 0);
    }
}
