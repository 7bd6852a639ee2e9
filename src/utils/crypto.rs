// src/utils/crypto.rs
//! Integrity fingerprints for certificates and QR payloads.
//!
//! All fingerprints are SHA-256 over the RFC 8785 canonical JSON form of a
//! payload, with a domain-separation prefix so a certificate hash can never
//! be replayed as a QR payload hash (and vice versa).

use rand::{distributions::Alphanumeric, Rng};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::utils::serialization::canonical_json;

/// 32-byte SHA-256 hash
pub type Hash256 = [u8; 32];

/// Domain prefix for certificate security hashes
pub const DOMAIN_CERT: &[u8] = b"ISSM_CERT_V1";

/// Domain prefix for QR validation payload hashes
pub const DOMAIN_QR: &[u8] = b"ISSM_QR_V1";

/// Computes SHA-256 over a domain prefix followed by raw bytes.
pub fn sha256_prefixed(domain: &[u8], data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the hex fingerprint of a JSON payload under a domain prefix.
///
/// # Arguments
/// * `domain` - Domain-separation prefix (one of the `DOMAIN_*` constants)
/// * `payload` - JSON payload to fingerprint
///
/// # Returns
/// Lowercase hex string of the 32-byte digest
pub fn fingerprint(domain: &[u8], payload: &Value) -> String {
    let canonical = canonical_json(payload);
    hex::encode(sha256_prefixed(domain, canonical.as_bytes()))
}

/// Draws an uppercase alphanumeric token of the given length from the
/// thread-local CSPRNG. Used for certificate id suffixes and QR ids.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let payload = json!({"certificateId": "CERT-2024-A1B2C3", "policyNumber": "POL-1"});
        assert_eq!(
            fingerprint(DOMAIN_CERT, &payload),
            fingerprint(DOMAIN_CERT, &payload)
        );
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = json!({"policyNumber": "POL-1", "certificateId": "CERT-2024-A1B2C3"});
        let b = json!({"certificateId": "CERT-2024-A1B2C3", "policyNumber": "POL-1"});
        assert_eq!(fingerprint(DOMAIN_CERT, &a), fingerprint(DOMAIN_CERT, &b));
    }

    #[test]
    fn test_domains_are_separated() {
        let payload = json!({"certificateId": "CERT-2024-A1B2C3"});
        assert_ne!(
            fingerprint(DOMAIN_CERT, &payload),
            fingerprint(DOMAIN_QR, &payload)
        );
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = json!({"policyNumber": "POL-1"});
        let b = json!({"policyNumber": "POL-2"});
        assert_ne!(fingerprint(DOMAIN_CERT, &a), fingerprint(DOMAIN_CERT, &b));
    }

    #[test]
    fn test_fingerprint_is_64_hex_chars() {
        let payload = json!({"certificateId": "CERT-2024-A1B2C3"});
        let hash = fingerprint(DOMAIN_CERT, &payload);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_token_shape() {
        let token = random_token(6);
        assert_eq!(token.len(), 6);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
