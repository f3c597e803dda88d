//! HMAC-SHA256 signature verification over raw notification bytes.
//!
//! The gateway signs the literal bytes it sends, so verification always runs
//! over the unparsed body. Re-serializing a parsed payload would change the
//! bytes and break the comparison.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Stateless verifier for hex-encoded HMAC-SHA256 signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Returns true if `presented` is the hex HMAC of `raw` under `secret`.
    ///
    /// Never fails: any internal error (unusable key, malformed hex) yields
    /// `false`, which callers treat exactly like a forgery.
    pub fn verify(&self, raw: &[u8], presented: &str, secret: &SecretString) -> bool {
        let presented = match hex::decode(presented.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let expected = match compute(raw, secret) {
            Some(mac) => mac,
            None => return false,
        };
        constant_time_compare(&expected, &presented)
    }

    /// Hex HMAC-SHA256 of `raw` under `secret`.
    ///
    /// Used by callers that need to produce a signature (configuration
    /// checks, test fixtures). Returns `None` if the key is unusable.
    pub fn sign(&self, raw: &[u8], secret: &SecretString) -> Option<String> {
        compute(raw, secret).map(hex::encode)
    }
}

fn compute(raw: &[u8], secret: &SecretString) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(raw);
    Some(mac.finalize().into_bytes().to_vec())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","order_id":"order_1","amount":4000000,"currency":"INR"}}}}"#;

    fn secret() -> SecretString {
        SecretString::new("whsec_school_a".to_string())
    }

    // ══════════════════════════════════════════════════════════════
    // Verification
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn valid_signature_verifies() {
        let verifier = SignatureVerifier::new();
        let signature = verifier.sign(BODY, &secret()).unwrap();
        assert!(verifier.verify(BODY, &signature, &secret()));
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let verifier = SignatureVerifier::new();
        let signature = verifier.sign(BODY, &secret()).unwrap().to_uppercase();
        assert!(verifier.verify(BODY, &signature, &secret()));
    }

    #[test]
    fn wrong_secret_fails() {
        let verifier = SignatureVerifier::new();
        let signature = verifier
            .sign(BODY, &SecretString::new("whsec_school_b".to_string()))
            .unwrap();
        assert!(!verifier.verify(BODY, &signature, &secret()));
    }

    #[test]
    fn every_single_byte_flip_is_rejected() {
        let verifier = SignatureVerifier::new();
        let signature = verifier.sign(BODY, &secret()).unwrap();

        for i in 0..BODY.len() {
            let mut tampered = BODY.to_vec();
            tampered[i] ^= 0x01;
            assert!(
                !verifier.verify(&tampered, &signature, &secret()),
                "flip at byte {} verified",
                i
            );
        }
    }

    #[test]
    fn reserialized_body_does_not_verify() {
        let verifier = SignatureVerifier::new();
        let signature = verifier.sign(BODY, &secret()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(BODY).unwrap();
        let pretty = serde_json::to_vec_pretty(&value).unwrap();
        assert!(!verifier.verify(&pretty, &signature, &secret()));
    }

    // ══════════════════════════════════════════════════════════════
    // Malformed input never panics
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn non_hex_signature_returns_false() {
        assert!(!SignatureVerifier::new().verify(BODY, "not-hex!", &secret()));
    }

    #[test]
    fn empty_signature_returns_false() {
        assert!(!SignatureVerifier::new().verify(BODY, "", &secret()));
    }

    #[test]
    fn truncated_signature_returns_false() {
        let verifier = SignatureVerifier::new();
        let signature = verifier.sign(BODY, &secret()).unwrap();
        assert!(!verifier.verify(BODY, &signature[..32], &secret()));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(b"short", b"longer"));
        assert!(constant_time_compare(b"", b""));
    }
}
