//! Webhook Signature Verification
//!
//! Implements the Standard Webhooks scheme used by the payment provider:
//!
//! ```text
//! signed_content = "{webhook-id}.{webhook-timestamp}.{raw body}"
//! signature      = base64(HMAC-SHA256(secret, signed_content))
//! header         = "v1,<sig> v1,<sig2> ..."
//! ```
//!
//! The secret is used as its raw UTF-8 bytes. Several space-separated
//! entries may be present while the provider rotates secrets; one match is
//! enough. There is no timestamp tolerance window.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::webhook::error::{AuthError, AuthResult};
use crate::webhook::events::PurchaseEvent;

type HmacSha256 = Hmac<Sha256>;

/// Message id header (Standard Webhooks naming)
pub const HEADER_WEBHOOK_ID: &str = "webhook-id";
/// Message timestamp header (Standard Webhooks naming)
pub const HEADER_WEBHOOK_TIMESTAMP: &str = "webhook-timestamp";
/// Signature list header (Standard Webhooks naming)
pub const HEADER_WEBHOOK_SIGNATURE: &str = "webhook-signature";

/// Vendor-specific fallbacks, consulted only when the generic header is absent
pub const HEADER_SVIX_ID: &str = "svix-id";
/// See [`HEADER_SVIX_ID`]
pub const HEADER_SVIX_TIMESTAMP: &str = "svix-timestamp";
/// See [`HEADER_SVIX_ID`]
pub const HEADER_SVIX_SIGNATURE: &str = "svix-signature";

/// Scheme tag stripped from each signature entry
pub const SIGNATURE_VERSION_PREFIX: &str = "v1,";

/// Authenticates an inbound webhook and yields the parsed purchase event.
///
/// Implementations must reject before parsing: an unauthenticated body is
/// never interpreted.
pub trait WebhookVerifier: Send + Sync + 'static {
    /// Verify `body` against `headers` and parse it.
    fn verify(&self, body: &[u8], headers: &HeaderMap) -> AuthResult<PurchaseEvent>;
}

/// The three semantic header values of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeaders<'a> {
    /// Message id
    pub id: &'a str,
    /// Message timestamp, opaque to us
    pub timestamp: &'a str,
    /// Raw signature list
    pub signature: &'a str,
}

impl<'a> SignatureHeaders<'a> {
    /// Read the headers, preferring `webhook-*` over `svix-*`.
    pub fn from_header_map(headers: &'a HeaderMap) -> AuthResult<Self> {
        let id = header_value(headers, HEADER_WEBHOOK_ID, HEADER_SVIX_ID);
        let timestamp = header_value(headers, HEADER_WEBHOOK_TIMESTAMP, HEADER_SVIX_TIMESTAMP);
        let signature = header_value(headers, HEADER_WEBHOOK_SIGNATURE, HEADER_SVIX_SIGNATURE);

        match (id, timestamp, signature) {
            (Some(id), Some(timestamp), Some(signature)) => Ok(Self {
                id,
                timestamp,
                signature,
            }),
            _ => Err(AuthError::MissingHeaders),
        }
    }
}

/// Read `primary`, falling back to `fallback` only when `primary` is absent.
///
/// A present but empty (or non-UTF-8) `primary` shadows the fallback and
/// yields `None`.
pub(crate) fn header_value<'a>(
    headers: &'a HeaderMap,
    primary: &str,
    fallback: &str,
) -> Option<&'a str> {
    headers
        .get(primary)
        .or_else(|| headers.get(fallback))
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// HMAC-SHA256 verifier for Standard Webhooks deliveries
#[derive(Clone)]
pub struct StandardWebhookVerifier {
    /// Keyed MAC state, cloned per message
    keyed: HmacSha256,
}

impl std::fmt::Debug for StandardWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardWebhookVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl StandardWebhookVerifier {
    /// Create a verifier keyed with the raw bytes of `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_ref())?,
        })
    }

    /// Compute the base64 signature the provider would send for this message.
    pub fn sign(&self, msg_id: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = self.keyed.clone();
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        B64.encode(mac.finalize().into_bytes())
    }

    /// Check the signature list against the message, without parsing the body.
    pub fn verify_signature(&self, body: &[u8], headers: &SignatureHeaders<'_>) -> AuthResult<()> {
        let expected = self.sign(headers.id, headers.timestamp, body);

        let matched = headers.signature.split_whitespace().any(|entry| {
            let value = entry
                .strip_prefix(SIGNATURE_VERSION_PREFIX)
                .unwrap_or(entry);
            bool::from(value.as_bytes().ct_eq(expected.as_bytes()))
        });

        if matched {
            Ok(())
        } else {
            Err(AuthError::SignatureMismatch)
        }
    }
}

impl WebhookVerifier for StandardWebhookVerifier {
    fn verify(&self, body: &[u8], headers: &HeaderMap) -> AuthResult<PurchaseEvent> {
        let signature_headers = SignatureHeaders::from_header_map(headers)?;
        self.verify_signature(body, &signature_headers)?;
        PurchaseEvent::from_bytes(body)
    }
}
