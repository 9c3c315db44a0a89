//! Purchase webhook endpoint.
//!
//! The handler takes the body as raw bytes: the signature covers the exact
//! bytes the provider sent, so nothing may be parsed or re-serialized before
//! verification.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::issuer::{IssuanceError, LicenseIssuer};

/// Body returned for unknown routes and methods
pub const NOT_FOUND_BODY: &str = "Not found";

/// `POST /webhook/polar`
pub async fn webhook_handler(
    State(issuer): State<Arc<LicenseIssuer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, IssuanceError> {
    let outcome = issuer.handle(&body, &headers).await?;
    Ok((StatusCode::OK, outcome.message()).into_response())
}

/// Catch-all for everything that is not a known route and method.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

impl IntoResponse for IssuanceError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
