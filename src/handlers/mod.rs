//! HTTP surface of the license worker.
//!
//! # Routes
//!
//! | Method | Path              | Handler                         |
//! |--------|-------------------|---------------------------------|
//! | POST   | `/webhook/polar`  | [`webhook::webhook_handler`]    |
//! | GET    | `/health`         | [`status::health_handler`]      |
//! | GET    | `/metrics`        | [`status::metrics_handler`]     |
//!
//! Any other path, or another method on a known path, answers
//! `404 Not found`.

pub mod status;
pub mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::issuer::LicenseIssuer;

pub use status::{health_handler, metrics_handler, HealthResponse};
pub use webhook::{not_found, webhook_handler, NOT_FOUND_BODY};

/// Webhook path for the Polar provider
pub const POLAR_WEBHOOK_PATH: &str = "/webhook/polar";

/// Build the full application router around a shared issuer.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use markright_license_worker::handlers::build_router;
/// # fn issuer() -> markright_license_worker::LicenseIssuer { unimplemented!() }
///
/// # async fn run() -> std::io::Result<()> {
/// let app = build_router(Arc::new(issuer()));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8787").await?;
/// axum::serve(listener, app).await
/// # }
/// ```
pub fn build_router(issuer: Arc<LicenseIssuer>) -> Router {
    Router::new()
        .route(POLAR_WEBHOOK_PATH, post(webhook_handler).fallback(not_found))
        .route("/health", get(health_handler).fallback(not_found))
        .route("/metrics", get(metrics_handler).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(issuer)
}
