use std::sync::Arc;

use markright_license_worker::license::{decode_verifying_key, LicensePayload, LicenseToken};
use markright_license_worker::{
    build_router, LicenseIssuer, LicenseSigner, ResendConfig, ResendMailer,
    StandardWebhookVerifier,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "whs_end_to_end_secret";
// bytes 1..=32
const SEED_B64: &str = "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA=";
const PUBLIC_B64: &str = "ebVWLo/mVPlAeLES6KmLp5AfhTrmlb7X4OORC60ElmQ=";
const ORDER: &str = r#"{"type":"order.created","data":{"customer":{"email":"a@b.com"},"created_at":"2024-01-01T00:00:00Z"}}"#;
const MSG_ID: &str = "msg_2abc";
const TIMESTAMP: &str = "1704067200";

/// Spin up the worker on an OS-assigned port, returning the base URL.
async fn spawn_worker(resend: &MockServer) -> String {
    let mailer = ResendMailer::new(
        ResendConfig::new("re_test_key").with_api_url(format!("{}/emails", resend.uri())),
    )
    .unwrap();
    let issuer = LicenseIssuer::new(
        Arc::new(StandardWebhookVerifier::new(SECRET).unwrap()),
        Arc::new(LicenseSigner::from_base64(SEED_B64).unwrap()),
        Arc::new(mailer),
        "pro",
    );

    let app = build_router(Arc::new(issuer));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

fn signature_for(body: &str) -> String {
    let mac = StandardWebhookVerifier::new(SECRET)
        .unwrap()
        .sign(MSG_ID, TIMESTAMP, body.as_bytes());
    format!("v1,{mac}")
}

async fn post_webhook(base: &str, body: &str, signature: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/webhook/polar", base))
        .header("webhook-id", MSG_ID)
        .header("webhook-timestamp", TIMESTAMP)
        .header("webhook-signature", signature)
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

async fn mount_resend(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .respond_with(ResponseTemplate::new(status).set_body_string("provider says no"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Pull the token back out of the `<code>` element of the sent email.
fn token_from_email(body: &[u8]) -> LicenseToken {
    let json: serde_json::Value = serde_json::from_slice(body).unwrap();
    let html = json["html"].as_str().unwrap();
    let start = html.find("line-height: 1.4;\">").unwrap() + "line-height: 1.4;\">".len();
    let end = start + html[start..].find("</code>").unwrap();
    LicenseToken::parse(&html[start..end]).unwrap()
}

// ── Happy path ──────────────────────────────────────────────────

#[tokio::test]
async fn signed_order_mints_verifiable_token_and_sends_one_email() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 1).await;
    let base = spawn_worker(&resend).await;

    let resp = post_webhook(&base, ORDER, &signature_for(ORDER)).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "License issued");

    let requests = resend.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let email: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(email["to"], serde_json::json!(["a@b.com"]));

    let token = token_from_email(&requests[0].body);
    assert_eq!(
        token.decode_payload().unwrap(),
        LicensePayload::new("a@b.com", "2024-01-01T00:00:00Z", "pro")
    );

    let public_key = decode_verifying_key(PUBLIC_B64).unwrap();
    public_key
        .verify_strict(token.payload_b64().as_bytes(), &token.signature().unwrap())
        .unwrap();
}

#[tokio::test]
async fn svix_header_names_are_accepted() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 1).await;
    let base = spawn_worker(&resend).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/webhook/polar", base))
        .header("svix-id", MSG_ID)
        .header("svix-timestamp", TIMESTAMP)
        .header("svix-signature", signature_for(ORDER))
        .body(ORDER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn other_event_types_are_acknowledged_without_email() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 0).await;
    let base = spawn_worker(&resend).await;

    let body = r#"{"type":"subscription.created","data":{"customer":{"email":"a@b.com"}}}"#;
    let resp = post_webhook(&base, body, &signature_for(body)).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Ignored event type");
}

// ── Rejections ──────────────────────────────────────────────────

#[tokio::test]
async fn altered_signature_is_401_with_no_email() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 0).await;
    let base = spawn_worker(&resend).await;

    let mut signature = signature_for(ORDER);
    // Flip the first MAC character
    let flipped = if signature.as_bytes()[3] == b'A' { "B" } else { "A" };
    signature.replace_range(3..4, flipped);

    let resp = post_webhook(&base, ORDER, &signature).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.text().await.unwrap(), "Invalid webhook signature");
}

#[tokio::test]
async fn tampered_body_is_401() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 0).await;
    let base = spawn_worker(&resend).await;

    let tampered = ORDER.replace("a@b.com", "x@b.com");
    let resp = post_webhook(&base, &tampered, &signature_for(ORDER)).await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn missing_headers_are_401() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 0).await;
    let base = spawn_worker(&resend).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/webhook/polar", base))
        .header("webhook-id", MSG_ID)
        .header("webhook-signature", signature_for(ORDER))
        .body(ORDER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

// ── Delivery failure ────────────────────────────────────────────

#[tokio::test]
async fn provider_rejection_is_500() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 422, 1).await;
    let base = spawn_worker(&resend).await;

    let resp = post_webhook(&base, ORDER, &signature_for(ORDER)).await;
    assert_eq!(resp.status(), 500);
    let text = resp.text().await.unwrap();
    assert_eq!(text, "Email delivery failed");
    assert!(!text.contains("provider says no"));
}

#[tokio::test]
async fn redelivery_mints_a_fresh_send() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 2).await;
    let base = spawn_worker(&resend).await;

    for _ in 0..2 {
        let resp = post_webhook(&base, ORDER, &signature_for(ORDER)).await;
        assert_eq!(resp.status(), 200);
    }
}

// ── Routing ─────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_route_returns_404() {
    let resend = MockServer::start().await;
    let base = spawn_worker(&resend).await;

    let resp = reqwest::get(format!("{}/webhook/stripe", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "Not found");

    let resp = reqwest::get(format!("{}/webhook/polar", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let resend = MockServer::start().await;
    let base = spawn_worker(&resend).await;

    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn metrics_endpoint_counts_outcomes() {
    let resend = MockServer::start().await;
    mount_resend(&resend, 200, 1).await;
    let base = spawn_worker(&resend).await;

    post_webhook(&base, ORDER, &signature_for(ORDER)).await;
    post_webhook(&base, ORDER, "v1,bm9wZQ==").await;

    let resp = reqwest::get(format!("{}/metrics", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let text = resp.text().await.unwrap();
    assert!(text.contains("license_webhooks_received_total 2\n"));
    assert!(text.contains("license_webhooks_rejected_total 1\n"));
    assert!(text.contains("license_deliveries_succeeded_total 1\n"));
}
