//! Issuance Metrics
//!
//! Lock-free counters for each terminal state of the webhook pipeline, with
//! Prometheus-compatible text export for the `/metrics` endpoint.
//!
//! # Example
//!
//! ```rust
//! use markright_license_worker::metrics::IssuanceMetrics;
//!
//! let metrics = IssuanceMetrics::new();
//! metrics.record_received();
//! metrics.record_ignored();
//! assert!(metrics.to_prometheus_format().contains("license_webhooks_ignored_total 1"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Counters for the webhook pipeline
#[derive(Debug)]
pub struct IssuanceMetrics {
    /// Webhook requests that reached the handler
    webhooks_received: AtomicU64,
    /// Rejected with 401
    webhooks_rejected: AtomicU64,
    /// Acknowledged without issuing
    webhooks_ignored: AtomicU64,
    /// Tokens signed (whether or not delivery then succeeded)
    tokens_issued: AtomicU64,
    /// Tokens delivered
    deliveries_succeeded: AtomicU64,
    /// Tokens lost to a failed send
    deliveries_failed: AtomicU64,
    started: Instant,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// See [`IssuanceMetrics`]
    pub webhooks_received: u64,
    /// See [`IssuanceMetrics`]
    pub webhooks_rejected: u64,
    /// See [`IssuanceMetrics`]
    pub webhooks_ignored: u64,
    /// See [`IssuanceMetrics`]
    pub tokens_issued: u64,
    /// See [`IssuanceMetrics`]
    pub deliveries_succeeded: u64,
    /// See [`IssuanceMetrics`]
    pub deliveries_failed: u64,
}

impl Default for IssuanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl IssuanceMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            webhooks_received: AtomicU64::new(0),
            webhooks_rejected: AtomicU64::new(0),
            webhooks_ignored: AtomicU64::new(0),
            tokens_issued: AtomicU64::new(0),
            deliveries_succeeded: AtomicU64::new(0),
            deliveries_failed: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// A webhook request arrived
    pub fn record_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Authentication failed
    pub fn record_rejected(&self) {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Event type did not trigger issuance
    pub fn record_ignored(&self) {
        self.webhooks_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// A token was signed
    pub fn record_issued(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// The email provider accepted the token
    pub fn record_delivered(&self) {
        self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// The email provider did not accept the token
    pub fn record_delivery_failed(&self) {
        self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            webhooks_rejected: self.webhooks_rejected.load(Ordering::Relaxed),
            webhooks_ignored: self.webhooks_ignored.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
        }
    }

    /// Seconds since the counters were created
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Export in Prometheus text format
    pub fn to_prometheus_format(&self) -> String {
        let snapshot = self.snapshot();
        let counters = [
            (
                "license_webhooks_received_total",
                "Webhook requests received",
                snapshot.webhooks_received,
            ),
            (
                "license_webhooks_rejected_total",
                "Webhooks that failed authentication",
                snapshot.webhooks_rejected,
            ),
            (
                "license_webhooks_ignored_total",
                "Authenticated webhooks with a non-issuing event type",
                snapshot.webhooks_ignored,
            ),
            (
                "license_tokens_issued_total",
                "License tokens signed",
                snapshot.tokens_issued,
            ),
            (
                "license_deliveries_succeeded_total",
                "License emails accepted by the provider",
                snapshot.deliveries_succeeded,
            ),
            (
                "license_deliveries_failed_total",
                "License emails the provider did not accept",
                snapshot.deliveries_failed,
            ),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {name} {help}\n"));
            output.push_str(&format!("# TYPE {name} counter\n"));
            output.push_str(&format!("{name} {value}\n"));
        }
        output.push_str("# TYPE license_worker_uptime_seconds gauge\n");
        output.push_str(&format!(
            "license_worker_uptime_seconds {}\n",
            self.uptime_seconds()
        ));
        output
    }
}
