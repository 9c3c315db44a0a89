//! License Delivery
//!
//! Hands a freshly minted token to the buyer. There is no retry here: a failed
//! send fails the webhook, and the provider's redelivery mints a new token.

pub mod resend;
pub mod template;

use thiserror::Error;

use crate::license::LicenseToken;

pub use resend::{ResendConfig, ResendMailer, DEFAULT_RESEND_API_URL};
pub use template::license_email_html;

/// Email delivery errors
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The provider answered with a non-success status
    #[error("email provider rejected the message ({status}): {body}")]
    Rejected {
        /// HTTP status returned by the provider
        status: u16,
        /// Response body text, for diagnosis
        body: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("email transport error: {0}")]
    Transport(String),

    /// The HTTP client could not be built
    #[error("email client setup failed: {0}")]
    ClientSetup(String),
}

/// Result type for delivery operations
pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

/// Sends a license token to its owner.
#[async_trait::async_trait]
pub trait LicenseMailer: Send + Sync + 'static {
    /// Deliver `token` to `recipient`. Exactly one attempt.
    async fn send_license(&self, recipient: &str, token: &LicenseToken) -> DeliveryResult<()>;
}
