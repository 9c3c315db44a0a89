//! Resend transactional email client.
//!
//! One `POST {api_url}` with `Authorization: Bearer <api_key>` and a JSON body
//! of `{ from, to: [recipient], subject, html }`.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::license::LicenseToken;
use crate::notify::template::license_email_html;
use crate::notify::{DeliveryError, DeliveryResult, LicenseMailer};

/// Production endpoint
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Default sender
pub const DEFAULT_FROM: &str = "MarkRight <license@complitask.com>";

/// Default subject line
pub const DEFAULT_SUBJECT: &str = "Your MarkRight Pro License Key";

/// Default upper bound on one send, connect included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resend connection settings
#[derive(Clone)]
pub struct ResendConfig {
    /// Endpoint receiving the POST
    pub api_url: String,
    /// Bearer token. Never logged.
    pub api_key: String,
    /// Sender mailbox
    pub from: String,
    /// Subject line
    pub subject: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ResendConfig {
    /// Settings for the production endpoint with the default sender and subject
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_RESEND_API_URL.to_string(),
            api_key: api_key.into(),
            from: DEFAULT_FROM.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point at another endpoint (used against mock servers)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .field("subject", &self.subject)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

/// [`LicenseMailer`] backed by the Resend HTTP API
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendMailer {
    /// Build the mailer and its HTTP client
    pub fn new(config: ResendConfig) -> DeliveryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::ClientSetup(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl LicenseMailer for ResendMailer {
    #[instrument(skip_all, fields(api_url = %self.config.api_url))]
    async fn send_license(&self, recipient: &str, token: &LicenseToken) -> DeliveryResult<()> {
        let request = SendEmailRequest {
            from: &self.config.from,
            to: [recipient],
            subject: &self.config.subject,
            html: license_email_html(token.as_str()),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "License email accepted");
        Ok(())
    }
}
