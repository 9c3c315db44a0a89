//! Health and metrics handlers for the license worker.
//!
//! - `/health` - Liveness probe for systemd/load balancers
//! - `/metrics` - Pipeline counters in Prometheus text format
//!
//! # Architecture
//!
//! ```text
//! HTTP Request ──> Axum Router ──> metrics_handler ──> LicenseIssuer
//!                                        │                  │
//!                                        ▼                  ▼
//!                                  text/plain       IssuanceMetrics
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::issuer::LicenseIssuer;

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name from Cargo.toml
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Prometheus text exposition content type
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Health check response for liveness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
    /// Crate version
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            version: SERVER_VERSION.to_string(),
        }
    }
}

/// Health check endpoint handler.
///
/// Returns `200 OK` with `{"status": "healthy", "version": "..."}`. It does
/// not touch the email provider.
///
/// # Route
/// `GET /health`
///
/// # Example
///
/// ```bash
/// curl http://localhost:8787/health
/// # {"status":"healthy","version":"0.1.0"}
/// ```
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::default()))
}

/// Metrics endpoint handler.
///
/// # Route
/// `GET /metrics`
///
/// # Example
///
/// ```bash
/// curl http://localhost:8787/metrics
/// # # HELP license_webhooks_received_total Webhook requests received
/// # # TYPE license_webhooks_received_total counter
/// # license_webhooks_received_total 12
/// # ...
/// ```
#[instrument(skip_all)]
pub async fn metrics_handler(State(issuer): State<Arc<LicenseIssuer>>) -> impl IntoResponse {
    debug!("Metrics requested");
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        issuer.metrics().to_prometheus_format(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_default() {
        let health = HealthResponse::default();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, SERVER_VERSION);
    }

    #[test]
    fn test_server_constants() {
        assert!(!SERVER_VERSION.is_empty());
        assert_eq!(SERVER_NAME, "markright-license-worker");
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
