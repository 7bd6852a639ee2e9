// src/storage/memory_store.rs
//! In-memory certificate store.
//!
//! Hashmap-backed implementation of the record store, suitable for tests
//! and single-process deployments. Lookups by certificate id are O(1);
//! lookups by verification id scan the map, which is acceptable at the
//! volumes one portal instance handles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::certificate::CertificateRecord;
use crate::storage::record_store::{CertificateStore, StoreError};

/// Mutex-guarded in-memory record store.
pub struct MemoryCertificateStore {
    /// Records keyed by certificate id
    records: Mutex<HashMap<String, CertificateRecord>>,
}

#[allow(dead_code)]
impl MemoryCertificateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryCertificateStore {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCertificateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    async fn put(&self, record: CertificateRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.certificate_id.clone(), record);
        Ok(())
    }

    async fn get(&self, certificate_id: &str) -> Result<Option<CertificateRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.get(certificate_id).cloned())
    }

    async fn find_by_verification_id(
        &self,
        verification_id: &str,
    ) -> Result<Option<CertificateRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .find(|record| record.verification_id == verification_id)
            .cloned())
    }
}
