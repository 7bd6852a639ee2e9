// src/error.rs
//! Error types for the certificate service.
//!
//! Every fallible operation in the service funnels into [`CertificateError`],
//! so callers (API handlers, tests) can map failures to user-visible outcomes
//! without string matching.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::record_store::StoreError;

/// Errors raised by certificate issuance, lookup, validation, and rendering.
#[derive(Error, Debug)]
pub enum CertificateError {
    /// A required field of the verification input is missing or empty.
    #[error("missing required field: {0}")]
    Validation(String),

    /// Certificate generation was attempted for a verification that is not
    /// approved. Carries the offending status.
    #[error("certificate can only be generated for approved verifications (status: {0})")]
    State(String),

    /// No certificate exists under the given identifier.
    #[error("certificate not found: {0}")]
    NotFound(String),

    /// The certificate exists but its validity window has passed.
    #[error("certificate {certificate_id} expired on {expiry_date}")]
    Expired {
        certificate_id: String,
        expiry_date: DateTime<Utc>,
    },

    /// The supplied hash does not match the hash recomputed from the stored
    /// record.
    #[error("security hash mismatch for certificate {0}")]
    Integrity(String),

    /// Document rendering failed, usually because a template placeholder has
    /// no backing field. Fatal to the render call only.
    #[error("template rendering failed: {0}")]
    Template(String),

    /// QR image rendering failed. Recoverable: issuance continues without an
    /// inline image.
    #[error("QR rendering failed: {0}")]
    QrRender(String),

    /// The record store could not be reached. Retryable by the caller.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    /// Ran out of attempts while searching for an unused certificate id.
    #[error("exhausted unique certificate id attempts")]
    IdAllocation,
}

impl From<StoreError> for CertificateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CertificateError::StoreUnavailable(msg),
        }
    }
}
