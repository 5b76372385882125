use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 over `{order_id}|{payment_id}`, keyed with the
/// gateway's shared secret. This is the signature the gateway attaches to a
/// payment confirmation.
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let msg = format!("{order_id}|{payment_id}");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(msg.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of the supplied signature against the recomputed
/// one. Everything downstream of payment verification trusts this check.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, supplied: &str) -> bool {
    let expected = expected_signature(secret, order_id, payment_id);
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_gateway_secret";

    #[test]
    fn test_signature_roundtrip() {
        let sig = expected_signature(SECRET, "order_abc", "pay_xyz");
        assert_eq!(sig.len(), 64); // hex-encoded SHA-256 digest
        assert!(verify_signature(SECRET, "order_abc", "pay_xyz", &sig));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = expected_signature(SECRET, "order_abc", "pay_xyz");
        let b = expected_signature(SECRET, "order_abc", "pay_xyz");
        assert_eq!(a, b);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let sig = expected_signature(SECRET, "order_abc", "pay_xyz");
        let mut forged = sig.clone();
        forged.replace_range(0..1, if sig.starts_with('0') { "1" } else { "0" });
        assert!(!verify_signature(SECRET, "order_abc", "pay_xyz", &forged));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = expected_signature("other_secret", "order_abc", "pay_xyz");
        assert!(!verify_signature(SECRET, "order_abc", "pay_xyz", &sig));
    }

    #[test]
    fn test_swapped_ids_rejected() {
        let sig = expected_signature(SECRET, "order_abc", "pay_xyz");
        assert!(!verify_signature(SECRET, "pay_xyz", "order_abc", &sig));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(!verify_signature(SECRET, "order_abc", "pay_xyz", "deadbeef"));
        assert!(!verify_signature(SECRET, "order_abc", "pay_xyz", ""));
    }
}
