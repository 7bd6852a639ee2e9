// src/models/qr.rs
//! QR validation payload data model.
//!
//! The payload is ephemeral: it is assembled to drive one QR render and is
//! not the certificate itself. A certificate can be re-rendered many times,
//! each render getting a fresh payload with its own `qr_id`, while the
//! certificate keeps a single canonical security hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::utils::crypto::{fingerprint, DOMAIN_QR};

/// Payload format version.
pub const PAYLOAD_VERSION: &str = "1.0";

/// Data encoded behind one QR render of a certificate.
///
/// `hash` covers every other field and lives in a separate namespace from
/// the certificate's security hash, so the two can never be confused.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QrValidationPayload {
    /// Unique per QR instance, format "QR-<millis base36>-<suffix>"
    pub qr_id: String,

    /// Certificate this payload points at
    pub certificate_id: String,

    /// Originating verification request
    pub verification_id: String,

    /// Copied from the certificate
    pub issue_date: DateTime<Utc>,

    /// Copied from the certificate
    pub expiry_date: DateTime<Utc>,

    /// Instant this payload was assembled
    pub timestamp: DateTime<Utc>,

    /// Payload format version
    pub version: String,

    /// Integrity fingerprint over the fields above (hex)
    pub hash: String,
}

impl QrValidationPayload {
    /// Recomputes the payload hash from the other fields.
    pub fn compute_hash(&self) -> String {
        let preimage = json!({
            "certificateId": self.certificate_id,
            "expiryDate": self.expiry_date,
            "issueDate": self.issue_date,
            "qrId": self.qr_id,
            "timestamp": self.timestamp,
            "verificationId": self.verification_id,
            "version": self.version,
        });
        fingerprint(DOMAIN_QR, &preimage)
    }

    /// Whether the stored hash matches a recompute from the stored fields.
    #[allow(dead_code)]
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Outcome of building a QR payload for a certificate.
///
/// `qr_image` is a PNG data URI when rendering succeeded, and absent when it
/// did not; `render_error` carries the recoverable failure in that case.
/// The payload and URL are always present, so issuance never depends on the
/// renderer.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QrBuildResult {
    pub validation_url: String,
    pub payload: QrValidationPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> QrValidationPayload {
        let issue: DateTime<Utc> = "2024-01-05T14:30:00Z".parse().unwrap();
        let mut payload = QrValidationPayload {
            qr_id: "QR-LTX2K9-A1B2C".to_string(),
            certificate_id: "CERT-2024-A1B2C3".to_string(),
            verification_id: "REQ-2024-001".to_string(),
            issue_date: issue,
            expiry_date: issue + chrono::Duration::days(365),
            timestamp: issue,
            version: PAYLOAD_VERSION.to_string(),
            hash: String::new(),
        };
        payload.hash = payload.compute_hash();
        payload
    }

    #[test]
    fn test_hash_round_trips() {
        assert!(sample_payload().verify_hash());
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let mut payload = sample_payload();
        payload.certificate_id = "CERT-2024-ZZZZZZ".to_string();
        assert!(!payload.verify_hash());
    }

    #[test]
    fn test_payload_hash_differs_from_certificate_namespace() {
        // Same logical content hashed under the certificate domain must not
        // collide with the QR namespace.
        let payload = sample_payload();
        let preimage = serde_json::json!({
            "certificateId": payload.certificate_id,
            "expiryDate": payload.expiry_date,
            "issueDate": payload.issue_date,
            "qrId": payload.qr_id,
            "timestamp": payload.timestamp,
            "verificationId": payload.verification_id,
            "version": payload.version,
        });
        let cert_namespace = crate::utils::crypto::fingerprint(
            crate::utils::crypto::DOMAIN_CERT,
            &preimage,
        );
        assert_ne!(payload.hash, cert_namespace);
    }
}
