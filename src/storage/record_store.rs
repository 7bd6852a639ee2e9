// src/storage/record_store.rs
//! Record store abstraction for issued certificates.
//!
//! The store is injected into the certificate manager so deployments can
//! swap the in-memory implementation for a file-backed or networked one
//! without touching issuance logic. Implementations must provide
//! read-after-write consistency within a single process.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::certificate::CertificateRecord;

/// Failures at the storage boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or answered with an error.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable keyed storage for certificate records.
///
/// Records are immutable once written; `put` is only ever called with a
/// freshly issued record under a new key.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Persists a record under its certificate id.
    async fn put(&self, record: CertificateRecord) -> Result<(), StoreError>;

    /// Fetches a record by certificate id.
    async fn get(&self, certificate_id: &str) -> Result<Option<CertificateRecord>, StoreError>;

    /// Fetches the record issued for a verification, if one exists.
    async fn find_by_verification_id(
        &self,
        verification_id: &str,
    ) -> Result<Option<CertificateRecord>, StoreError>;
}
