// src/models/verification.rs
//! Verification request data model.
//!
//! A verification is the external insurance-policy check whose approval
//! triggers certificate issuance. The service treats it as input data: it
//! validates the fields it needs and copies them onto the certificate, but
//! never manages the verification lifecycle itself.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CertificateError;

/// Status a verification must carry before a certificate may be issued.
pub const STATUS_APPROVED: &str = "approved";

/// Display labels for the verification type codes used by the portal.
static TYPE_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("validade", "Verificação de Validade"),
        ("validity", "Verificação de Validade"),
        ("cobertura", "Verificação de Cobertura"),
        ("coverage", "Verificação de Cobertura"),
        ("historico", "Histórico de Sinistros"),
        ("claims_history", "Histórico de Sinistros"),
    ])
});

/// Resolves a verification type code to its human-readable label.
///
/// Unknown codes fall back to the generic label rather than erroring, since
/// the type is descriptive only.
pub fn verification_type_label(code: &str) -> &'static str {
    TYPE_LABELS.get(code).copied().unwrap_or("Verificação Geral")
}

/// Verification data supplied by the approval workflow.
///
/// # Fields
/// The first six fields are required for issuance and must be non-empty.
/// `submission_date`, `last_update`, and `requester_name` are descriptive
/// extras the certificate copies when present.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationData {
    /// Verification request identifier, e.g. "REQ-2024-001"
    pub id: String,

    /// Insurance policy number under verification
    pub policy_number: String,

    /// Name of the insurance company
    pub insurance_company: String,

    /// Name of the insured person or entity
    pub insured_name: String,

    /// Verification type code, e.g. "validade"
    pub verification_type: String,

    /// Workflow status; must be "approved" to issue a certificate
    pub status: String,

    /// When the verification request was submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,

    /// Last workflow update, used when no submission date exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,

    /// Person who requested the verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,
}

impl VerificationData {
    /// Checks that every field required for issuance is present and non-empty.
    ///
    /// # Errors
    /// Returns `CertificateError::Validation` naming the first missing field.
    /// Required identity fields are never defaulted.
    pub fn ensure_complete(&self) -> Result<(), CertificateError> {
        let required = [
            ("id", &self.id),
            ("policyNumber", &self.policy_number),
            ("insuranceCompany", &self.insurance_company),
            ("insuredName", &self.insured_name),
            ("verificationType", &self.verification_type),
            ("status", &self.status),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CertificateError::Validation(name.to_string()));
            }
        }
        Ok(())
    }

    /// Checks the approval gate.
    ///
    /// # Errors
    /// Returns `CertificateError::State` with the current status when the
    /// verification is not approved.
    pub fn ensure_approved(&self) -> Result<(), CertificateError> {
        if self.status != STATUS_APPROVED {
            return Err(CertificateError::State(self.status.clone()));
        }
        Ok(())
    }

    /// The verification date copied onto the certificate: the submission
    /// date, falling back to the last workflow update.
    pub fn verification_date(&self) -> Option<DateTime<Utc>> {
        self.submission_date.or(self.last_update)
    }
}
