//! License Issuance Pipeline
//!
//! One webhook, one pass through a small state machine:
//!
//! ```text
//! Unverified ──AuthError──▶ Rejected (401)
//!     │
//!     ▼
//!  Verified ──other type──▶ Ignored (200)
//!     │
//!     ▼ order.created
//!   Issued ──send ok──▶ Delivered (200)
//!     │
//!     └──send failed──▶ DeliveryFailed (500)
//! ```
//!
//! Nothing is persisted. A token whose delivery failed is gone; the
//! provider's redelivery mints a fresh one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use thiserror::Error;
use tracing::{error, info, instrument, warn, Span};

use crate::license::{LicenseError, LicensePayload, LicenseSigner, LicenseToken};
use crate::metrics::IssuanceMetrics;
use crate::notify::{DeliveryError, LicenseMailer};
use crate::webhook::signature::{header_value, HEADER_SVIX_ID, HEADER_WEBHOOK_ID};
use crate::webhook::{AuthError, EventDisposition, WebhookVerifier};

/// Wall-clock source for the `issued_at` fallback
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Successful terminal states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceOutcome {
    /// Authenticated, but the event type does not mint licenses
    Ignored {
        /// The skipped event type
        event_type: String,
    },
    /// Token signed and accepted by the email provider
    Delivered {
        /// Recipient of the token
        email: String,
    },
}

impl IssuanceOutcome {
    /// Plain-text response body
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ignored { .. } => "Ignored event type",
            Self::Delivered { .. } => "License issued",
        }
    }
}

/// Failed terminal states
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// Unverified → Rejected
    #[error("webhook rejected: {0}")]
    Rejected(#[from] AuthError),

    /// Signing failed; only possible with broken key material
    #[error("token signing failed: {0}")]
    Signing(#[from] LicenseError),

    /// Issued → DeliveryFailed
    #[error("license delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

impl IssuanceError {
    /// HTTP status for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejected(_) => StatusCode::UNAUTHORIZED,
            Self::Signing(_) | Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text response body. Deliberately coarse.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "Invalid webhook signature",
            Self::Signing(_) => "License signing failed",
            Self::Delivery(_) => "Email delivery failed",
        }
    }
}

/// Drives a webhook from raw request to terminal state.
pub struct LicenseIssuer {
    verifier: Arc<dyn WebhookVerifier>,
    signer: Arc<LicenseSigner>,
    mailer: Arc<dyn LicenseMailer>,
    tier: String,
    metrics: Arc<IssuanceMetrics>,
    clock: Clock,
}

impl LicenseIssuer {
    /// Assemble a pipeline
    pub fn new(
        verifier: Arc<dyn WebhookVerifier>,
        signer: Arc<LicenseSigner>,
        mailer: Arc<dyn LicenseMailer>,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            signer,
            mailer,
            tier: tier.into(),
            metrics: Arc::new(IssuanceMetrics::new()),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Pipeline counters
    pub fn metrics(&self) -> &Arc<IssuanceMetrics> {
        &self.metrics
    }

    /// Tier written into payloads
    pub fn tier(&self) -> &str {
        &self.tier
    }

    /// Process one webhook delivery.
    #[instrument(
        name = "webhook",
        skip_all,
        fields(message_id = tracing::field::Empty, event_type = tracing::field::Empty)
    )]
    pub async fn handle(
        &self,
        body: &[u8],
        headers: &HeaderMap,
    ) -> Result<IssuanceOutcome, IssuanceError> {
        self.metrics.record_received();
        if let Some(id) = message_id(headers) {
            Span::current().record("message_id", id);
        }

        let event = self.verifier.verify(body, headers).map_err(|e| {
            self.metrics.record_rejected();
            warn!(reason = e.reason(), error = %e, "Webhook rejected");
            e
        })?;
        Span::current().record("event_type", event.event_type.as_str());

        let request = match event.disposition(|| (self.clock)()) {
            EventDisposition::Ignore { event_type } => {
                self.metrics.record_ignored();
                info!("Ignoring event type");
                return Ok(IssuanceOutcome::Ignored { event_type });
            }
            EventDisposition::Issue(request) => request,
        };

        let payload = LicensePayload::new(request.email, request.issued_at, self.tier.as_str());
        let token = self.issue(&payload)?;

        match self.mailer.send_license(&payload.email, &token).await {
            Ok(()) => {
                self.metrics.record_delivered();
                info!(
                    order_id = request.order_id.as_deref().unwrap_or("-"),
                    issued_at = %payload.issued_at,
                    "License issued and delivered"
                );
                Ok(IssuanceOutcome::Delivered {
                    email: payload.email,
                })
            }
            Err(e) => {
                self.metrics.record_delivery_failed();
                match &e {
                    DeliveryError::Rejected { status, body } => error!(
                        provider_status = *status,
                        provider_body = %body,
                        "Failed to send license email"
                    ),
                    other => error!(error = %other, "Failed to send license email"),
                }
                Err(e.into())
            }
        }
    }

    fn issue(&self, payload: &LicensePayload) -> Result<LicenseToken, IssuanceError> {
        let token = self.signer.sign(payload).map_err(|e| {
            error!(error = %e, "License signing failed");
            e
        })?;
        self.metrics.record_issued();
        Ok(token)
    }
}

fn message_id(headers: &HeaderMap) -> Option<&str> {
    header_value(headers, HEADER_WEBHOOK_ID, HEADER_SVIX_ID)
}

impl std::fmt::Debug for LicenseIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseIssuer")
            .field("signer", &self.signer)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}
