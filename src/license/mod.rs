//! License Token Module
//!
//! Builds and signs the offline license tokens handed to buyers.
//!
//! ```text
//! LicensePayload ──json──▶ bytes ──base64──▶ payload_b64 ──ed25519──▶ signature
//!                                                 │                        │
//!                                                 └──────── "." ───────────┘
//!                                                           │
//!                                                           ▼
//!                                                     LicenseToken
//! ```
//!
//! The token layout is a fixed contract with the verifier embedded in the
//! desktop application. Changing it requires a version field.

pub mod error;
pub mod keys;
pub mod token;

pub use error::{LicenseError, LicenseResult};
pub use keys::{decode_signing_key, decode_verifying_key, encode_verifying_key, generate_keypair};
pub use token::{LicensePayload, LicenseSigner, LicenseToken, DEFAULT_TIER, TOKEN_SEPARATOR};
