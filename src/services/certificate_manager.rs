// src/services/certificate_manager.rs
//! Certificate record manager.
//!
//! Single authority for minting, retrieving, and validating certificate
//! records. Issuance copies the approved verification's descriptive fields
//! onto an immutable record, computes its security hash, persists it, and
//! then hands the record to the QR payload builder. Validation is a pure
//! read-check against the stored record.
//!
//! Invariants upheld here:
//! - Certificate ids are unique for the lifetime of the store.
//! - At most one certificate exists per verification id; repeat issuance
//!   returns the stored record.
//! - Records are never mutated after creation.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::CertificateError;
use crate::models::certificate::{CertificateRecord, IssuanceResult};
use crate::models::verification::VerificationData;
use crate::services::qr_builder::QrPayloadBuilder;
use crate::storage::record_store::CertificateStore;
use crate::utils::crypto::random_token;

/// Length of the random certificate id suffix.
const ID_SUFFIX_LEN: usize = 6;

/// Bound on the id allocation retry loop. With a 36^6 suffix space the loop
/// practically never retries; the bound exists so a broken store cannot spin
/// forever.
const MAX_ID_ATTEMPTS: u32 = 8;

/// Successful outcome of a validation check: the full record plus the
/// instant the check was performed.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSuccess {
    pub certificate: CertificateRecord,
    pub validated_at: DateTime<Utc>,
}

/// Service minting and validating certificate records.
pub struct CertificateManager {
    /// Durable record store
    store: Arc<dyn CertificateStore>,

    /// Builder for QR payloads and images
    qr_builder: Arc<QrPayloadBuilder>,

    /// Base URL of the public validation endpoint
    base_validation_url: String,

    /// Serializes lookup-then-insert during issuance so two concurrent
    /// requests for one verification cannot both mint a certificate.
    issuance_lock: Mutex<()>,
}

impl CertificateManager {
    /// Creates a manager over the given store and QR builder.
    pub fn new(
        store: Arc<dyn CertificateStore>,
        qr_builder: Arc<QrPayloadBuilder>,
        base_validation_url: String,
    ) -> Self {
        CertificateManager {
            store,
            qr_builder,
            base_validation_url,
            issuance_lock: Mutex::new(()),
        }
    }

    /// Issues a certificate for an approved verification.
    ///
    /// # Arguments
    /// * `data` - Verification data; must be complete and approved
    ///
    /// # Errors
    /// - `Validation` when a required field is missing or empty
    /// - `State` when the verification is not approved
    /// - `StoreUnavailable` when the record store cannot be reached
    ///
    /// # Behavior
    /// If a certificate already exists for the verification id, the stored
    /// record is returned with `reused: true` and no new record is minted.
    /// QR building happens after the record is persisted and never fails
    /// issuance; a render problem is reported inside the QR result.
    pub async fn generate(
        &self,
        data: &VerificationData,
    ) -> Result<IssuanceResult, CertificateError> {
        data.ensure_complete()?;
        data.ensure_approved()?;

        // Only lookup-then-insert runs under the lock. QR rendering is slow
        // and best-effort, so it must never serialize issuance.
        let (record, reused) = {
            let _guard = self.issuance_lock.lock().await;

            if let Some(existing) = self.store.find_by_verification_id(&data.id).await? {
                info!(
                    "certificate {} already issued for verification {}, returning existing",
                    existing.certificate_id, data.id
                );
                (existing, true)
            } else {
                let issued_at = Utc::now();
                let certificate_id = self.allocate_certificate_id(issued_at).await?;
                let record = CertificateRecord::issue(certificate_id, data, issued_at);
                self.store.put(record.clone()).await?;
                info!(
                    "issued certificate {} for verification {}",
                    record.certificate_id, record.verification_id
                );
                (record, false)
            }
        };

        let qr = self.qr_builder.build(&record).await;
        Ok(IssuanceResult {
            validation_url: record.validation_url(&self.base_validation_url),
            certificate: record,
            qr,
            reused,
        })
    }

    /// Fetches a stored certificate record.
    ///
    /// # Errors
    /// `NotFound` when no record exists under the id; `StoreUnavailable` on
    /// store failure.
    pub async fn get_by_id(
        &self,
        certificate_id: &str,
    ) -> Result<CertificateRecord, CertificateError> {
        self.store
            .get(certificate_id)
            .await?
            .ok_or_else(|| CertificateError::NotFound(certificate_id.to_string()))
    }

    /// Validates a presented (certificate id, hash) pair against stored
    /// state. Pure read-check: the record and the store are never mutated.
    ///
    /// # Errors
    /// - `NotFound` when the certificate does not exist
    /// - `Expired` when the validity window has passed
    /// - `Integrity` when the supplied hash does not match the recompute
    pub async fn validate(
        &self,
        certificate_id: &str,
        supplied_hash: &str,
    ) -> Result<ValidationSuccess, CertificateError> {
        let record = self.get_by_id(certificate_id).await?;
        let now = Utc::now();

        if record.is_expired_at(now) {
            return Err(CertificateError::Expired {
                certificate_id: record.certificate_id,
                expiry_date: record.expiry_date,
            });
        }

        if record.compute_security_hash() != supplied_hash {
            return Err(CertificateError::Integrity(record.certificate_id));
        }

        debug!("certificate {} validated", record.certificate_id);
        Ok(ValidationSuccess {
            certificate: record,
            validated_at: now,
        })
    }

    /// Allocates an unused certificate id, format
    /// "CERT-<year>-<random suffix>". The store is consulted so a suffix
    /// collision leads to a re-draw instead of an overwrite.
    async fn allocate_certificate_id(
        &self,
        issued_at: DateTime<Utc>,
    ) -> Result<String, CertificateError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = format!(
                "CERT-{}-{}",
                issued_at.format("%Y"),
                random_token(ID_SUFFIX_LEN)
            );
            if self.store.get(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(CertificateError::IdAllocation)
    }
}
