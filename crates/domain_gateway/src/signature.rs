//! HMAC-SHA256 signatures for provider messages
//!
//! Payment confirmations sign `"{order_ref}|{payment_ref}"`; webhooks sign
//! the raw request body. Both use a shared secret agreed with the provider
//! and hex-encoded digests.

use sha2::{Digest, Sha256};

const BLOCK_SIZE: usize = 64;

/// Computes HMAC-SHA256 over the message, hex-encoded
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(secret, message))
}

/// Verifies a hex-encoded HMAC-SHA256 signature in constant time
pub fn verify_signature(secret: &[u8], message: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let expected = hmac_sha256(secret, message);
    constant_time_eq(&expected, &signature)
}

fn hmac_sha256(secret: &[u8], message: &[u8]) -> [u8; 32] {
    // Keys longer than the block size are hashed first per the HMAC spec
    let mut key = [0u8; BLOCK_SIZE];
    if secret.len() > BLOCK_SIZE {
        let digest = Sha256::digest(secret);
        key[..32].copy_from_slice(&digest);
    } else {
        key[..secret.len()].copy_from_slice(secret);
    }

    let mut inner = Sha256::new();
    inner.update(key.map(|b| b ^ 0x36));
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(key.map(|b| b ^ 0x5c));
    outer.update(inner_digest);

    let mut out = [0u8; 32];
    out.copy_from_slice(&outer.finalize());
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2
    #[test]
    fn test_rfc4231_vector() {
        let digest = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            digest,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_roundtrip_verification() {
        let secret = b"webhook-secret";
        let message = b"order_1|pay_1";
        let signature = hmac_sha256_hex(secret, message);

        assert!(verify_signature(secret, message, &signature));
        assert!(!verify_signature(secret, b"order_1|pay_2", &signature));
        assert!(!verify_signature(b"other-secret", message, &signature));
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(!verify_signature(b"secret", b"message", "not-hex"));
        assert!(!verify_signature(b"secret", b"message", "deadbeef"));
    }

    #[test]
    fn test_long_key_is_hashed_down() {
        let long_secret = [0x61u8; 100];
        let signature = hmac_sha256_hex(&long_secret, b"payload");
        assert!(verify_signature(&long_secret, b"payload", &signature));
    }
}
