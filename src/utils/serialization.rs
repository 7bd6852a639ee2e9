// src/utils/serialization.rs
//! Serialization utilities for the certificate service.
//!
//! Provides the canonical JSON form shared by every integrity fingerprint.
//! Canonicalization follows RFC 8785 (JCS): lexicographic key ordering, no
//! insignificant whitespace, normalized number forms. Two structurally equal
//! payloads always canonicalize to the same byte sequence.

use serde_json::Value;

/// Serializes a JSON value to its RFC 8785 canonical string form.
///
/// # Arguments
/// * `value` - JSON value to canonicalize
///
/// # Returns
/// Canonical string representation with sorted keys
///
/// # Panics
/// Panics if the value contains a float that has no canonical form
/// (NaN or Infinity). None of the hashed payloads in this service carry
/// floats.
pub fn canonical_json(value: &Value) -> String {
    serde_json_canonicalizer::to_string(value)
        .expect("canonical JSON serialization failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_are_sorted() {
        let value = json!({
            "verificationId": "REQ-1",
            "certificateId": "CERT-2024-A1B2C3",
            "policyNumber": "POL-1"
        });

        let canonical = canonical_json(&value);
        assert_eq!(
            canonical,
            r#"{"certificateId":"CERT-2024-A1B2C3","policyNumber":"POL-1","verificationId":"REQ-1"}"#
        );
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({"b": 2, "a": 1});
        let b = json!({"a": 1, "b": 2});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn test_nested_objects_are_canonicalized() {
        let value = json!({"outer": {"z": 1, "a": 2}});
        assert_eq!(canonical_json(&value), r#"{"outer":{"a":2,"z":1}}"#);
    }
}
