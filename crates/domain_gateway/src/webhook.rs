//! Provider webhook payloads
//!
//! Asynchronous payout settlement arrives here. Payloads are parsed only
//! after the raw body's signature has been verified.

use serde::Deserialize;

use crate::error::GatewayError;

/// A parsed webhook event
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `payout.processed` / `payout.failed`
    pub event: String,
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payout: Option<PayoutPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayoutPayload {
    /// The reference we attached when creating the payout
    pub reference_id: String,
}

/// What the gateway did with a webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Payout confirmed; ledger entry flipped to completed
    PayoutCompleted { reference: String },
    /// Payout failed; compensating credit issued, entry flipped to failed
    PayoutRefunded { reference: String },
    /// Recognized but irrelevant event; nothing to do
    Ignored { event: String },
}

/// Parses a webhook body
///
/// # Errors
///
/// Returns `MalformedEvent` for bodies that are not valid event JSON
pub fn parse_event(body: &str) -> Result<WebhookEvent, GatewayError> {
    serde_json::from_str(body).map_err(|_| GatewayError::MalformedEvent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payout_event() {
        let body = r#"{
            "event": "payout.failed",
            "payload": { "payout": { "reference_id": "pout_abc" } }
        }"#;

        let event = parse_event(body).unwrap();
        assert_eq!(event.event, "payout.failed");
        assert_eq!(event.payload.payout.unwrap().reference_id, "pout_abc");
    }

    #[test]
    fn test_parse_event_without_payout_section() {
        let body = r#"{ "event": "order.paid", "payload": {} }"#;
        let event = parse_event(body).unwrap();
        assert!(event.payload.payout.is_none());
    }

    #[test]
    fn test_malformed_body_rejected() {
        assert!(matches!(
            parse_event("not json"),
            Err(GatewayError::MalformedEvent)
        ));
    }
}
