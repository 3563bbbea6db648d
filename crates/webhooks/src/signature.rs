//! Webhook signature verification.
//!
//! Shopify signs every webhook delivery with an HMAC-SHA256 over the raw
//! request body, base64-encoded in the `x-shopify-hmac-sha256` header.
//! Verification must run against the raw bytes before any JSON parsing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook body against its base64-encoded signature header.
///
/// Returns `false` for a malformed header, never an error: any failure to
/// verify is treated the same as a bad signature. The comparison is
/// constant-time (`Mac::verify_slice`), so the header value leaks nothing
/// about the expected digest.
#[must_use]
pub fn verify(body: &[u8], signature_b64: &str, secret: &str) -> bool {
    let Ok(provided) = BASE64.decode(signature_b64) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);

    mac.verify_slice(&provided).is_ok()
}

/// Compute the base64 signature for a body.
///
/// The counterpart of [`verify`]; used by tests and local tooling to produce
/// valid deliveries.
#[must_use]
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_b8f2a91c4e7d63501f9a8b2c";

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"id": 123456, "email": "buyer@example.com"}"#;
        let signature = sign(body, SECRET);

        assert!(verify(body, &signature, SECRET));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = br#"{"id": 123456}"#;
        let signature = sign(body, "a-different-secret");

        assert!(!verify(body, &signature, SECRET));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = br#"{"id": 123456, "total_price": "10.00"}"#;
        let tampered = br#"{"id": 123456, "total_price": "0.01"}"#;
        let signature = sign(body, SECRET);

        assert!(!verify(tampered, &signature, SECRET));
    }

    #[test]
    fn test_non_base64_header_rejected() {
        let body = br#"{"id": 123456}"#;

        assert!(!verify(body, "!!!not base64!!!", SECRET));
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let body = br#"{"id": 123456}"#;
        let signature = sign(body, SECRET);
        let truncated = &signature[..signature.len() / 2];

        assert!(!verify(body, truncated, SECRET));
    }
}
