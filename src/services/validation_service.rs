// src/services/validation_service.rs
//! Validation lookup service.
//!
//! Entry point for third parties presenting a (certificate id, hash) pair,
//! whether from a QR scan or a manually typed URL. Translates the manager's
//! internal error kinds into a small external-facing outcome that never
//! leaks stored record contents on failure.

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CertificateError;
use crate::services::certificate_manager::CertificateManager;

/// External reason codes for a failed validity check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidityReason {
    NotFound,
    Expired,
    Tampered,
}

/// Outcome of a validity check.
///
/// On failure only the reason code is exposed; nothing about the stored
/// record (or any other record) leaks through this type.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidityOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ValidityReason>,
    pub validated_at: chrono::DateTime<Utc>,
}

/// Service answering public validity checks.
pub struct ValidationService {
    manager: Arc<CertificateManager>,
}

impl ValidationService {
    pub fn new(manager: Arc<CertificateManager>) -> Self {
        ValidationService { manager }
    }

    /// Checks whether the presented (certificate id, hash) pair identifies
    /// an authentic, unexpired certificate.
    ///
    /// # Errors
    /// Store failures propagate as `StoreUnavailable` so the caller can
    /// retry; every validation-level failure is folded into the outcome's
    /// reason code instead.
    pub async fn check_validity(
        &self,
        certificate_id: &str,
        hash: &str,
    ) -> Result<ValidityOutcome, CertificateError> {
        match self.manager.validate(certificate_id, hash).await {
            Ok(success) => Ok(ValidityOutcome {
                valid: true,
                reason: None,
                validated_at: success.validated_at,
            }),
            Err(CertificateError::NotFound(_)) => self.rejection(certificate_id, ValidityReason::NotFound),
            Err(CertificateError::Expired { .. }) => self.rejection(certificate_id, ValidityReason::Expired),
            Err(CertificateError::Integrity(_)) => self.rejection(certificate_id, ValidityReason::Tampered),
            Err(other) => Err(other),
        }
    }

    fn rejection(
        &self,
        certificate_id: &str,
        reason: ValidityReason,
    ) -> Result<ValidityOutcome, CertificateError> {
        info!(
            "validation rejected for {}: {:?}",
            certificate_id, reason
        );
        Ok(ValidityOutcome {
            valid: false,
            reason: Some(reason),
            validated_at: Utc::now(),
        })
    }
}
