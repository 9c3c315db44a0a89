//! License token construction and Ed25519 signing.
//!
//! Token format: `base64(json_payload).base64(ed25519_signature)`
//!
//! The signature covers `payload_b64.as_bytes()`, the base64 text itself and
//! not the decoded JSON. The client verifier hashes the exact same string, so
//! neither side depends on JSON key order or whitespace. Both halves use the
//! standard padded alphabet.

use std::fmt;
use std::marker::PhantomData;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, SigningKey, VerifyingKey, SIGNATURE_LENGTH};
use serde::{Deserialize, Serialize};
use sha2::digest::consts::U64;
use sha2::{Digest, Sha512};

use crate::license::error::{LicenseError, LicenseResult};
use crate::license::keys::decode_signing_key;

/// Separator between the payload and signature halves
pub const TOKEN_SEPARATOR: char = '.';

/// Tier written into tokens unless configured otherwise
pub const DEFAULT_TIER: &str = "pro";

/// Signed content of a license. Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    /// Licensee email
    pub email: String,
    /// Issuance timestamp, copied verbatim from the purchase event
    pub issued_at: String,
    /// Feature tier
    pub tier: String,
}

impl LicensePayload {
    /// Build a payload
    pub fn new(
        email: impl Into<String>,
        issued_at: impl Into<String>,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            issued_at: issued_at.into(),
            tier: tier.into(),
        }
    }
}

/// A signed license token.
#[derive(Clone, PartialEq, Eq)]
pub struct LicenseToken {
    raw: String,
    /// Byte offset of the separator
    split: usize,
}

impl LicenseToken {
    fn from_parts(payload_b64: &str, signature_b64: &str) -> Self {
        let mut raw = String::with_capacity(payload_b64.len() + 1 + signature_b64.len());
        raw.push_str(payload_b64);
        raw.push(TOKEN_SEPARATOR);
        raw.push_str(signature_b64);
        Self {
            raw,
            split: payload_b64.len(),
        }
    }

    /// Split a token string into its halves. Does not check the signature.
    pub fn parse(token: &str) -> LicenseResult<Self> {
        let token = token.trim();
        let (payload_b64, signature_b64) = token
            .split_once(TOKEN_SEPARATOR)
            .ok_or_else(|| LicenseError::InvalidToken("missing separator".to_string()))?;
        if payload_b64.is_empty() || signature_b64.is_empty() {
            return Err(LicenseError::InvalidToken("empty half".to_string()));
        }
        Ok(Self::from_parts(payload_b64, signature_b64))
    }

    /// The full token
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Left half: the base64 payload, which is also the signed message
    pub fn payload_b64(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Right half: the base64 signature
    pub fn signature_b64(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    /// Decode the payload half. This does not authenticate anything.
    pub fn decode_payload(&self) -> LicenseResult<LicensePayload> {
        let json = B64
            .decode(self.payload_b64())
            .map_err(|e| LicenseError::InvalidToken(format!("payload is not base64: {e}")))?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Decode the signature half.
    pub fn signature(&self) -> LicenseResult<Signature> {
        let bytes = B64
            .decode(self.signature_b64())
            .map_err(|e| LicenseError::InvalidToken(format!("signature is not base64: {e}")))?;
        let array: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            LicenseError::InvalidToken(format!(
                "signature must be {SIGNATURE_LENGTH} bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Signature::from_bytes(&array))
    }
}

impl fmt::Display for LicenseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Tokens are bearer credentials; keep them out of debug logs.
impl fmt::Debug for LicenseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseToken")
            .field("len", &self.raw.len())
            .finish_non_exhaustive()
    }
}

/// Produces license tokens with a fixed Ed25519 key.
///
/// The context hash `D` is a type parameter rather than process-wide state.
/// It must be SHA-512 for RFC 8032 Ed25519, which is the default; the
/// parameter exists so the hash is chosen where the signer is built.
pub struct LicenseSigner<D = Sha512> {
    expanded: ExpandedSecretKey,
    verifying_key: VerifyingKey,
    _digest: PhantomData<fn() -> D>,
}

impl LicenseSigner<Sha512> {
    /// Build a signer from a base64 private key (see [`decode_signing_key`]).
    pub fn from_base64(encoded: &str) -> LicenseResult<Self> {
        let signing_key = decode_signing_key(encoded)?;
        Ok(Self::new(&signing_key))
    }

    /// Build a signer from a decoded key
    pub fn new(signing_key: &SigningKey) -> Self {
        Self::with_digest(signing_key)
    }
}

impl<D> LicenseSigner<D>
where
    D: Digest<OutputSize = U64>,
{
    /// Build a signer whose signing hash is `D`.
    pub fn with_digest(signing_key: &SigningKey) -> Self {
        Self {
            expanded: ExpandedSecretKey::from(signing_key.as_bytes()),
            verifying_key: signing_key.verifying_key(),
            _digest: PhantomData,
        }
    }

    /// Public half, for the client verifier
    pub fn verifying_key(&self) -> VerifyingKey {
        self.verifying_key
    }

    /// Sign arbitrary bytes
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        raw_sign::<D>(&self.expanded, message, &self.verifying_key)
    }

    /// Serialize, encode and sign a payload.
    pub fn sign(&self, payload: &LicensePayload) -> LicenseResult<LicenseToken> {
        let json = serde_json::to_vec(payload)?;
        let payload_b64 = B64.encode(json);

        let signature = self.sign_message(payload_b64.as_bytes());
        let signature_b64 = B64.encode(signature.to_bytes());

        Ok(LicenseToken::from_parts(&payload_b64, &signature_b64))
    }
}

impl<D> fmt::Debug for LicenseSigner<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseSigner")
            .field("verifying_key", &B64.encode(self.verifying_key.to_bytes()))
            .field("secret", &"<redacted>")
            .finish()
    }
}
