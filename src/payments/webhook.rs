use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header the processor puts the hex-encoded HMAC-SHA256 digest in
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Event type emitted when a checkout session is paid
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Inbound webhook event envelope
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: CheckoutObject,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutObject {
    pub id: String,
}

/// Computes the hex HMAC-SHA256 signature of a webhook payload
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a webhook signature against the raw request body
///
/// Comparison happens inside the HMAC verifier, in constant time. Signature
/// verification needs the exact bytes the processor signed, which is why the
/// webhook route reads the raw body.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec-test";

    #[test]
    fn signature_round_trip() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let signature = sign(SECRET, payload);
        assert!(verify_signature(SECRET, payload, &signature));
    }

    #[test]
    fn tampered_payload_rejected() {
        let signature = sign(SECRET, b"original");
        assert!(!verify_signature(SECRET, b"tampered", &signature));
    }

    #[test]
    fn wrong_secret_rejected() {
        let signature = sign(SECRET, b"payload");
        assert!(!verify_signature("other-secret", b"payload", &signature));
    }

    #[test]
    fn non_hex_signature_rejected() {
        assert!(!verify_signature(SECRET, b"payload", "not hex!"));
    }

    #[test]
    fn event_envelope_parses() {
        let raw = r#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_123"}}}"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.id, "cs_123");
    }
}
