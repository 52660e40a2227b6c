//! Webhook payload signing and verification.
//!
//! Completion webhooks are signed with HMAC-SHA256 over the raw request
//! body, delivered in the `X-BFL-Signature` header as `sha256=<hex>`.
//! Receivers should verify against the shared webhook secret before
//! trusting the payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header value prefix; a signature without it never verifies.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a webhook signature against the raw request body.
///
/// `signature` is the full `X-BFL-Signature` header value. Returns `false`
/// (never an error) when the `sha256=` prefix is missing, the hex is
/// malformed, or the digest does not match. The comparison is
/// constant-time.
///
/// # Example
/// ```
/// use bfl_rs::webhook;
///
/// let body = br#"{"id":"job-1","status":"Ready"}"#;
/// let header = webhook::sign_payload(body, "my-secret");
/// assert!(webhook::verify_signature(body, &header, "my-secret"));
/// assert!(!webhook::verify_signature(body, &header, "wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Some(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Compute the signature header value for a payload.
///
/// Produces the same `sha256=<hex>` form the API sends, for use by test
/// harnesses and local webhook receivers.
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string, `None` on odd length or non-hex characters.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
            .collect()
    }
}
