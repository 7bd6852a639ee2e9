// src/models/certificate.rs
//! Certificate record data model.
//!
//! A certificate is the durable proof that an insurance verification was
//! approved. Records are immutable after issuance: every derived value
//! (security hash, validation URL) is a pure function of the stored fields,
//! which is what makes tamper detection possible.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::qr::QrBuildResult;
use crate::models::verification::{verification_type_label, VerificationData};
use crate::utils::crypto::{fingerprint, DOMAIN_CERT};

/// Validity window of an issued certificate.
pub const VALIDITY_DAYS: i64 = 365;

/// Algorithm prefix carried by every security hash.
pub const HASH_PREFIX: &str = "sha256:";

/// Display status frozen onto the certificate at issuance.
pub const VALIDATION_STATUS_VALID: &str = "VÁLIDA";

/// Issuer metadata recorded on every certificate.
pub const CREATED_BY: &str = "ISSM Sistema Automático";

/// Record format version.
pub const RECORD_VERSION: &str = "1.0";

/// An issued validation certificate.
///
/// Descriptive fields are copied from the source verification at issuance
/// time and never re-synced. The `security_hash` covers the identity and
/// policy fields plus the issuance timestamp; recomputing it from a stored
/// record must reproduce the stored value exactly.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Unique identifier, format "CERT-<year>-<suffix>"
    pub certificate_id: String,

    /// Identifier of the originating verification request
    pub verification_id: String,

    /// Issuance instant
    pub issue_date: DateTime<Utc>,

    /// End of the validity window, issue date plus 365 days
    pub expiry_date: DateTime<Utc>,

    /// Insurance policy number
    pub policy_number: String,

    /// Name of the insurance company
    pub insurance_company: String,

    /// Name of the insured person or entity
    pub insured_name: String,

    /// Human-readable verification type label
    pub verification_type: String,

    /// Date the underlying verification was performed, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_date: Option<DateTime<Utc>>,

    /// Display status, "VÁLIDA" at issuance
    pub validation_status: String,

    /// Person who requested the verification, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,

    /// Integrity fingerprint, "sha256:<hex digest>"
    pub security_hash: String,

    /// Issuance timestamp included in the hash preimage
    pub signature_timestamp: DateTime<Utc>,

    /// Issuing system
    pub created_by: String,

    /// Record format version
    pub version: String,
}

impl CertificateRecord {
    /// Assembles a new certificate record from approved verification data.
    ///
    /// # Arguments
    /// * `certificate_id` - Freshly allocated unique identifier
    /// * `data` - Verification data, already validated by the caller
    /// * `issued_at` - Issuance instant; expiry is derived from it
    ///
    /// # Returns
    /// A complete record with its security hash computed over the canonical
    /// field set.
    pub fn issue(
        certificate_id: String,
        data: &VerificationData,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let mut record = CertificateRecord {
            certificate_id,
            verification_id: data.id.clone(),
            issue_date: issued_at,
            expiry_date: issued_at + Duration::days(VALIDITY_DAYS),
            policy_number: data.policy_number.clone(),
            insurance_company: data.insurance_company.clone(),
            insured_name: data.insured_name.clone(),
            verification_type: verification_type_label(&data.verification_type).to_string(),
            verification_date: data.verification_date(),
            validation_status: VALIDATION_STATUS_VALID.to_string(),
            requester_name: data.requester_name.clone(),
            security_hash: String::new(),
            signature_timestamp: issued_at,
            created_by: CREATED_BY.to_string(),
            version: RECORD_VERSION.to_string(),
        };
        record.security_hash = record.compute_security_hash();
        record
    }

    /// Recomputes the security hash from the stored fields.
    ///
    /// The preimage is the canonical JSON of a fixed field set. Mutating any
    /// covered field changes the result, so comparing this against the stored
    /// `security_hash` detects tampering.
    pub fn compute_security_hash(&self) -> String {
        let preimage = json!({
            "certificateId": self.certificate_id,
            "insuranceCompany": self.insurance_company,
            "insuredName": self.insured_name,
            "issueDate": self.issue_date,
            "policyNumber": self.policy_number,
            "signatureTimestamp": self.signature_timestamp,
            "verificationId": self.verification_id,
            "verificationType": self.verification_type,
        });
        format!("{}{}", HASH_PREFIX, fingerprint(DOMAIN_CERT, &preimage))
    }

    /// Whether the validity window has passed at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }

    /// The canonical validation URL for this certificate.
    ///
    /// Format: `<base>/validate?cert=<id>&hash=<security hash>&t=<unix millis>`.
    /// Anyone holding this URL can re-check the certificate through the
    /// public validation endpoint.
    pub fn validation_url(&self, base_url: &str) -> String {
        format!(
            "{}/validate?cert={}&hash={}&t={}",
            base_url.trim_end_matches('/'),
            self.certificate_id,
            self.security_hash,
            self.issue_date.timestamp_millis()
        )
    }
}

/// Result of a certificate issuance request.
///
/// `reused` distinguishes "a certificate already existed for this
/// verification and was returned" from a fresh issue.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResult {
    pub certificate: CertificateRecord,
    pub validation_url: String,
    pub qr: QrBuildResult,
    pub reused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_verification() -> VerificationData {
        VerificationData {
            id: "REQ-2024-001".to_string(),
            policy_number: "POL-2024-789456".to_string(),
            insurance_company: "Empresa Seguradora A".to_string(),
            insured_name: "João Manuel Silva".to_string(),
            verification_type: "validade".to_string(),
            status: "approved".to_string(),
            submission_date: Some("2024-01-05T14:30:00Z".parse().unwrap()),
            last_update: None,
            requester_name: Some("Maria Santos".to_string()),
        }
    }

    #[test]
    fn test_expiry_is_365_days_after_issue() {
        let record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            Utc::now(),
        );
        assert_eq!(record.expiry_date - record.issue_date, Duration::days(365));
    }

    #[test]
    fn test_security_hash_recomputes_exactly() {
        let record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            Utc::now(),
        );
        assert_eq!(record.compute_security_hash(), record.security_hash);
        assert!(record.security_hash.starts_with(HASH_PREFIX));
    }

    #[test]
    fn test_security_hash_detects_field_change() {
        let mut record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            Utc::now(),
        );
        let stored = record.security_hash.clone();
        record.insured_name = "Outra Pessoa".to_string();
        assert_ne!(record.compute_security_hash(), stored);
    }

    #[test]
    fn test_expiry_is_not_hashed() {
        // Forcing expiry into the past must leave the hash intact, so that
        // expired certificates fail with an expiry reason, not a tamper one.
        let mut record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            Utc::now(),
        );
        record.expiry_date = record.issue_date - Duration::days(1);
        assert_eq!(record.compute_security_hash(), record.security_hash);
    }

    #[test]
    fn test_verification_type_is_stored_as_label() {
        let record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            Utc::now(),
        );
        assert_eq!(record.verification_type, "Verificação de Validade");
    }

    #[test]
    fn test_validation_url_embeds_id_and_hash() {
        let record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            Utc::now(),
        );
        let url = record.validation_url("https://portal.issm.gov.mz/");

        assert!(url.starts_with("https://portal.issm.gov.mz/validate?cert=CERT-2024-A1B2C3"));
        assert!(url.contains(&format!("hash={}", record.security_hash)));
        assert!(url.contains(&format!("t={}", record.issue_date.timestamp_millis())));
    }

    #[test]
    fn test_expiry_check() {
        let issued_at: DateTime<Utc> = "2024-01-05T14:30:00Z".parse().unwrap();
        let record = CertificateRecord::issue(
            "CERT-2024-A1B2C3".to_string(),
            &sample_verification(),
            issued_at,
        );

        assert!(!record.is_expired_at(issued_at + Duration::days(364)));
        assert!(record.is_expired_at(issued_at + Duration::days(366)));
    }
}
