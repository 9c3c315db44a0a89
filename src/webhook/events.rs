//! Purchase Event Types
//!
//! Typed view of the payment provider's webhook body, and the decision of
//! whether an authenticated event should mint a license.

use std::convert::Infallible;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::webhook::error::{AuthError, AuthResult};

/// Event types the worker distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PurchaseEventType {
    /// A completed order. The only type that triggers issuance.
    OrderCreated,

    /// Everything else the provider may deliver (checkout.*, subscription.*, ...)
    Unknown,
}

impl FromStr for PurchaseEventType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "order.created" => Self::OrderCreated,
            _ => Self::Unknown,
        })
    }
}

impl PurchaseEventType {
    /// Whether events of this type mint a license
    pub fn triggers_issuance(&self) -> bool {
        matches!(self, Self::OrderCreated)
    }

    fn parse(s: &str) -> Self {
        match Self::from_str(s) {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

/// Top-level webhook body. `data` is only interpreted for issuing events.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Order object carried by `order.created`
#[derive(Debug, Deserialize)]
struct Order {
    #[serde(default)]
    id: Option<String>,
    customer: OrderCustomer,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderCustomer {
    email: String,
}

/// Normalized purchase event extracted from an authenticated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseEvent {
    /// Raw `type` field as delivered
    pub event_type: String,
    /// Buyer address. Always present for issuing events.
    pub customer_email: Option<String>,
    /// Provider-side creation time, if supplied and non-empty
    pub created_at: Option<String>,
    /// Provider order id, for log correlation only
    pub order_id: Option<String>,
}

impl PurchaseEvent {
    /// Strictly parse a webhook body.
    ///
    /// The body must be a JSON object with a string `type`. For
    /// `order.created`, `data.customer.email` must be a non-empty string.
    pub fn from_bytes(bytes: &[u8]) -> AuthResult<Self> {
        let envelope: EventEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| AuthError::MalformedPayload(e.to_string()))?;

        if !PurchaseEventType::parse(&envelope.event_type).triggers_issuance() {
            return Ok(Self {
                event_type: envelope.event_type,
                customer_email: None,
                created_at: None,
                order_id: None,
            });
        }

        let order: Order = serde_json::from_value(envelope.data)
            .map_err(|e| AuthError::MalformedPayload(format!("order data: {e}")))?;

        if order.customer.email.trim().is_empty() {
            return Err(AuthError::MalformedPayload(
                "order has an empty customer email".to_string(),
            ));
        }

        Ok(Self {
            event_type: envelope.event_type,
            customer_email: Some(order.customer.email),
            created_at: order.created_at.filter(|ts| !ts.is_empty()),
            order_id: order.id,
        })
    }

    /// Get the typed event type
    pub fn typed_event_type(&self) -> PurchaseEventType {
        PurchaseEventType::parse(&self.event_type)
    }

    /// Decide what to do with this event.
    ///
    /// `now` is invoked at most once, and only when the provider did not
    /// supply `created_at`.
    pub fn disposition<F>(self, now: F) -> EventDisposition
    where
        F: FnOnce() -> DateTime<Utc>,
    {
        match (self.typed_event_type(), self.customer_email) {
            (PurchaseEventType::OrderCreated, Some(email)) => {
                let issued_at = self.created_at.unwrap_or_else(|| format_issued_at(now()));
                EventDisposition::Issue(IssuanceRequest {
                    email,
                    issued_at,
                    order_id: self.order_id,
                })
            }
            _ => EventDisposition::Ignore {
                event_type: self.event_type,
            },
        }
    }
}

/// Render a wall-clock fallback the way the provider renders `created_at`.
pub fn format_issued_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// What an authenticated event leads to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDisposition {
    /// Mint and deliver a license
    Issue(IssuanceRequest),
    /// Acknowledge without issuing
    Ignore {
        /// The type that was skipped
        event_type: String,
    },
}

/// Inputs for one issuance, fixed before signing begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceRequest {
    /// Recipient and licensee
    pub email: String,
    /// Timestamp written into the payload
    pub issued_at: String,
    /// Provider order id, if any
    pub order_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    const ORDER_BODY: &str = r#"{
        "type": "order.created",
        "data": {
            "id": "ord_123",
            "customer": { "email": "a@b.com", "name": "Ada" },
            "product": { "name": "MarkRight Pro" },
            "created_at": "2024-01-01T00:00:00Z"
        }
    }"#;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(
            PurchaseEventType::from_str("order.created").unwrap(),
            PurchaseEventType::OrderCreated
        );
        assert_eq!(
            PurchaseEventType::from_str("checkout.updated").unwrap(),
            PurchaseEventType::Unknown
        );
        assert!(PurchaseEventType::OrderCreated.triggers_issuance());
        assert!(!PurchaseEventType::Unknown.triggers_issuance());
    }

    #[test]
    fn test_parse_order_created() {
        let event = PurchaseEvent::from_bytes(ORDER_BODY.as_bytes()).unwrap();
        assert_eq!(event.typed_event_type(), PurchaseEventType::OrderCreated);
        assert_eq!(event.customer_email.as_deref(), Some("a@b.com"));
        assert_eq!(event.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(event.order_id.as_deref(), Some("ord_123"));
    }

    #[test]
    fn test_other_event_types_need_no_order_data() {
        let body = br#"{"type":"checkout.created","data":{"id":"chk_1"}}"#;
        let event = PurchaseEvent::from_bytes(body).unwrap();
        assert_eq!(event.typed_event_type(), PurchaseEventType::Unknown);
        assert_eq!(event.event_type, "checkout.created");
        assert!(event.customer_email.is_none());
    }

    #[test]
    fn test_malformed_bodies_rejected() {
        let cases: [&[u8]; 5] = [
            b"not json",
            b"[]",
            br#"{"data":{}}"#,
            br#"{"type":42}"#,
            br#"{"type":"order.created","data":{"customer":{}}}"#,
        ];
        for body in cases {
            let err = PurchaseEvent::from_bytes(body).unwrap_err();
            assert!(
                matches!(err, AuthError::MalformedPayload(_)),
                "expected malformed for {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_empty_email_rejected() {
        let body = br#"{"type":"order.created","data":{"customer":{"email":"  "}}}"#;
        assert!(matches!(
            PurchaseEvent::from_bytes(body),
            Err(AuthError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_disposition_uses_created_at() {
        let event = PurchaseEvent::from_bytes(ORDER_BODY.as_bytes()).unwrap();
        let calls = Cell::new(0);
        let disposition = event.disposition(|| {
            calls.set(calls.get() + 1);
            fixed_now()
        });

        assert_eq!(calls.get(), 0);
        match disposition {
            EventDisposition::Issue(req) => {
                assert_eq!(req.email, "a@b.com");
                assert_eq!(req.issued_at, "2024-01-01T00:00:00Z");
            }
            other => panic!("expected issuance, got {other:?}"),
        }
    }

    #[test]
    fn test_disposition_falls_back_to_clock_once() {
        let body = br#"{"type":"order.created","data":{"customer":{"email":"x@y.z"},"created_at":""}}"#;
        let event = PurchaseEvent::from_bytes(body).unwrap();
        assert!(event.created_at.is_none());

        let calls = Cell::new(0);
        let disposition = event.disposition(|| {
            calls.set(calls.get() + 1);
            fixed_now()
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(
            disposition,
            EventDisposition::Issue(IssuanceRequest {
                email: "x@y.z".to_string(),
                issued_at: "2025-03-04T05:06:07.000Z".to_string(),
                order_id: None,
            })
        );
    }

    #[test]
    fn test_disposition_ignores_other_types() {
        let event = PurchaseEvent::from_bytes(br#"{"type":"subscription.updated"}"#).unwrap();
        let disposition = event.disposition(|| panic!("clock must not be read"));
        assert_eq!(
            disposition,
            EventDisposition::Ignore {
                event_type: "subscription.updated".to_string()
            }
        );
    }
}
