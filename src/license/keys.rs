//! Ed25519 key material: decoding from configuration and generating new pairs.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ed25519_dalek::{
    SigningKey, VerifyingKey, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::license::error::{LicenseError, LicenseResult};

/// Decode a base64 private key.
///
/// Accepts either the 32-byte seed or the 64-byte `seed || public` keypair
/// encoding. For the latter the public half must match the seed.
pub fn decode_signing_key(encoded: &str) -> LicenseResult<SigningKey> {
    let bytes = Zeroizing::new(
        B64.decode(encoded.trim())
            .map_err(|e| LicenseError::InvalidKey(format!("private key is not base64: {e}")))?,
    );

    match bytes.len() {
        SECRET_KEY_LENGTH => {
            let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        KEYPAIR_LENGTH => {
            let mut pair = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
            pair.copy_from_slice(&bytes);
            SigningKey::from_keypair_bytes(&pair).map_err(|_| {
                LicenseError::InvalidKey("keypair public half does not match seed".to_string())
            })
        }
        other => Err(LicenseError::InvalidKey(format!(
            "private key must be {SECRET_KEY_LENGTH} or {KEYPAIR_LENGTH} bytes, got {other}"
        ))),
    }
}

/// Decode a base64 public key, as embedded in the client verifier.
pub fn decode_verifying_key(encoded: &str) -> LicenseResult<VerifyingKey> {
    let bytes = B64
        .decode(encoded.trim())
        .map_err(|e| LicenseError::InvalidKey(format!("public key is not base64: {e}")))?;
    let array: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
        LicenseError::InvalidKey(format!(
            "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
            b.len()
        ))
    })?;
    VerifyingKey::from_bytes(&array)
        .map_err(|_| LicenseError::InvalidKey("public key is not a curve point".to_string()))
}

/// Base64 form of a public key.
pub fn encode_verifying_key(key: &VerifyingKey) -> String {
    B64.encode(key.to_bytes())
}

/// A freshly generated keypair, both halves base64-encoded.
pub struct GeneratedKeypair {
    /// 32-byte seed, for `ED25519_PRIVATE_KEY`
    pub private_b64: Zeroizing<String>,
    /// 32-byte public key, for the client verifier
    pub public_b64: String,
}

/// Generate a new signing keypair from the thread-local CSPRNG.
pub fn generate_keypair() -> GeneratedKeypair {
    let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
    rand::rng().fill_bytes(&mut *seed);
    let signing_key = SigningKey::from_bytes(&seed);

    GeneratedKeypair {
        private_b64: Zeroizing::new(B64.encode(signing_key.to_bytes())),
        public_b64: encode_verifying_key(&signing_key.verifying_key()),
    }
}
