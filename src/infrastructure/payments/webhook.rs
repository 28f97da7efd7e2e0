//! Webhook signature verification and event parsing.
//!
//! The signature header has the form `t=<unix-ts>,v1=<hex-hmac>[,v1=...]`.
//! The signed payload is `<unix-ts>.<raw-body>`, authenticated with
//! HMAC-SHA256 under the endpoint secret. Timestamps outside the tolerance
//! window are rejected to stop replays.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::payment::PaymentEvent;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("timestamp outside tolerance window")]
    Expired,
    #[error("no signature matched the payload")]
    Mismatch,
}

/// Verifies a webhook signature header against the raw request body.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now_unix - timestamp).abs() > tolerance_secs {
        warn!("webhook timestamp {timestamp} outside tolerance");
        return Err(SignatureError::Expired);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex_encode(&mac.finalize().into_bytes());

    for candidate in candidates {
        if constant_time_eq(candidate.as_bytes(), expected.as_bytes()) {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Maps a provider event payload to a [`PaymentEvent`]. Event types the
/// pipeline does not react to return `None` and are acknowledged as-is.
pub fn parse_event(body: &serde_json::Value) -> Option<PaymentEvent> {
    let kind = body["type"].as_str()?;
    let object = &body["data"]["object"];
    match kind {
        "checkout.session.completed" => {
            let session_id = object["id"].as_str()?.to_string();
            debug!("checkout session completed: {session_id}");
            Some(PaymentEvent::CheckoutCompleted {
                session_id,
                payment_intent_id: object["payment_intent"].as_str().map(str::to_string),
                payer_email: object["customer_details"]["email"]
                    .as_str()
                    .or_else(|| object["customer_email"].as_str())
                    .map(str::to_string),
                submission_id: object["metadata"]["submission_id"]
                    .as_str()
                    .and_then(|s| s.parse().ok()),
                amount_cents: object["amount_total"].as_i64(),
            })
        }
        "checkout.session.expired" => Some(PaymentEvent::CheckoutExpired {
            session_id: object["id"].as_str()?.to_string(),
        }),
        "charge.refunded" => {
            // Stored payments are keyed by session and payment intent, never
            // by charge id, so the intent is what the lookup needs.
            let payment_ref = object["payment_intent"]
                .as_str()
                .or_else(|| object["id"].as_str())?
                .to_string();
            Some(PaymentEvent::ChargeRefunded { payment_ref })
        }
        other => {
            debug!("ignoring webhook event type {other}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!("t={timestamp},v1={}", hex_encode(&mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert_eq!(
            verify_signature(payload, &header, "whsec_test", 1_700_000_100, DEFAULT_TOLERANCE_SECS),
            Ok(())
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = b"body";
        let header = sign(payload, "whsec_a", 1_700_000_000);
        assert_eq!(
            verify_signature(payload, &header, "whsec_b", 1_700_000_000, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = sign(b"original", "whsec_test", 1_700_000_000);
        assert_eq!(
            verify_signature(b"tampered", &header, "whsec_test", 1_700_000_000, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = b"body";
        let header = sign(payload, "whsec_test", 1_700_000_000);
        assert_eq!(
            verify_signature(payload, &header, "whsec_test", 1_700_000_000 + 301, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert_eq!(
            verify_signature(b"x", "nonsense", "s", 0, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(b"x", "t=123", "s", 123, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn completed_event_parses_metadata() {
        let body = json!({
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_123",
                "payment_intent": "pi_456",
                "amount_total": 200,
                "customer_details": { "email": "payer@example.com" },
                "metadata": { "submission_id": "42" },
            }},
        });
        assert_eq!(
            parse_event(&body),
            Some(PaymentEvent::CheckoutCompleted {
                session_id: "cs_test_123".into(),
                payment_intent_id: Some("pi_456".into()),
                payer_email: Some("payer@example.com".into()),
                submission_id: Some(42),
                amount_cents: Some(200),
            })
        );
    }

    #[test]
    fn expired_and_refund_events_parse() {
        let expired = json!({
            "type": "checkout.session.expired",
            "data": { "object": { "id": "cs_test_9" } },
        });
        assert_eq!(
            parse_event(&expired),
            Some(PaymentEvent::CheckoutExpired { session_id: "cs_test_9".into() })
        );

        let refunded = json!({
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1" } },
        });
        assert_eq!(
            parse_event(&refunded),
            Some(PaymentEvent::ChargeRefunded { payment_ref: "ch_1".into() })
        );
    }

    #[test]
    fn refund_event_prefers_the_payment_intent_key() {
        // Completed checkouts persist the payment intent, not the charge id,
        // so a refund must come back keyed the same way to find its record.
        let refunded = json!({
            "type": "charge.refunded",
            "data": { "object": { "id": "ch_1", "payment_intent": "pi_456" } },
        });
        assert_eq!(
            parse_event(&refunded),
            Some(PaymentEvent::ChargeRefunded { payment_ref: "pi_456".into() })
        );
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let body = json!({
            "type": "payment_intent.created",
            "data": { "object": { "id": "pi_1" } },
        });
        assert_eq!(parse_event(&body), None);
    }
}
