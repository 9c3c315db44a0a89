//! Webhook authentication errors.

use thiserror::Error;

/// Reasons an inbound webhook is refused.
///
/// Every variant maps to the same `401` response. The variant is only ever
/// written to the operator log, never to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// One of the id / timestamp / signature headers is absent or empty.
    #[error("missing webhook signature headers")]
    MissingHeaders,

    /// No signature entry matched the expected MAC.
    #[error("webhook signature mismatch")]
    SignatureMismatch,

    /// The body authenticated but is not a well-formed purchase event.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
}

/// Result type for webhook authentication.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Short machine-readable reason, used as a log field.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingHeaders => "missing_headers",
            Self::SignatureMismatch => "signature_mismatch",
            Self::MalformedPayload(_) => "malformed_payload",
        }
    }
}
