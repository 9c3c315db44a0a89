//! Error types for the license worker
//!
//! Each stage owns a focused error enum (`AuthError`, `LicenseError`,
//! `DeliveryError`, `ConfigError`). [`Error`] folds them together for the
//! startup path and the library entry points.

use thiserror::Error;

use crate::config::ConfigError;
use crate::license::LicenseError;
use crate::notify::DeliveryError;
use crate::webhook::AuthError;

/// The main error type for license worker operations
#[derive(Error, Debug)]
pub enum Error {
    /// Webhook authentication errors
    #[error("Webhook error: {0}")]
    Auth(#[from] AuthError),

    /// Key and token errors
    #[error("License error: {0}")]
    License(#[from] LicenseError),

    /// Email delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for license worker operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(ConfigError::Missing("RESEND_API_KEY"));
        assert!(err.to_string().starts_with("Configuration error"));
        assert!(err.to_string().contains("RESEND_API_KEY"));
    }

    #[test]
    fn test_delivery_error() {
        let err = Error::from(DeliveryError::Rejected {
            status: 403,
            body: "forbidden".to_string(),
        });
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_auth_error() {
        let err = Error::from(AuthError::MissingHeaders);
        assert!(err.to_string().starts_with("Webhook error"));
    }

    #[test]
    fn test_generic_error() {
        let err = Error::generic("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }
}
