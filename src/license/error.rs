//! Error types for token signing.

use thiserror::Error;

/// License signing errors
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Private or public key material could not be decoded.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// A token string does not have the `payload.signature` shape.
    #[error("invalid license token: {0}")]
    InvalidToken(String),

    /// Payload JSON could not be produced or read back.
    #[error("license payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
