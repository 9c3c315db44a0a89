//! Purchase Webhook Module
//!
//! Authenticates deliveries from the payment provider and turns them into
//! issuance decisions.
//!
//! # Architecture
//!
//! ```text
//! Request ─▶ Signature Verify ─▶ Strict Parse ─▶ Disposition
//!                  │                  │              │
//!                  ▼                  ▼              ├─▶ Issue (order.created)
//!                 401                401             └─▶ Ignore (200)
//! ```
//!
//! # Security
//!
//! - The HMAC secret comes from the environment only
//! - Signature entries are compared in constant time
//! - The raw body bytes are authenticated before any parsing
//! - All rejections look identical to the caller

pub mod error;
pub mod events;
pub mod signature;

pub use error::{AuthError, AuthResult};
pub use events::{
    format_issued_at, EventDisposition, IssuanceRequest, PurchaseEvent, PurchaseEventType,
};
pub use signature::{SignatureHeaders, StandardWebhookVerifier, WebhookVerifier};
