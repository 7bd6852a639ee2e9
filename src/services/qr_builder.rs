// src/services/qr_builder.rs
//! QR payload builder.
//!
//! Produces the canonical validation URL and the companion payload record
//! for a certificate, then delegates image rendering to the configured
//! [`QrImageRenderer`]. Rendering runs under a bounded timeout and is
//! best-effort: the payload and URL are always returned, the image only
//! when the renderer delivered in time.

use chrono::{DateTime, Utc};
use log::warn;
use std::sync::Arc;
use std::time::Duration;

use crate::models::certificate::CertificateRecord;
use crate::models::qr::{QrBuildResult, QrValidationPayload, PAYLOAD_VERSION};
use crate::qr::renderer::{QrConfig, QrImageRenderer};
use crate::utils::crypto::random_token;

/// Builder for QR validation payloads.
pub struct QrPayloadBuilder {
    /// External image renderer
    renderer: Arc<dyn QrImageRenderer>,
    /// Base URL of the public validation endpoint
    base_validation_url: String,
    /// Rendering options passed to the renderer
    config: QrConfig,
    /// Upper bound on one render attempt
    render_timeout: Duration,
}

impl QrPayloadBuilder {
    /// Creates a builder.
    ///
    /// # Arguments
    /// * `renderer` - QR image renderer collaborator
    /// * `base_validation_url` - Base of the public validation endpoint
    /// * `config` - Image rendering options
    /// * `render_timeout` - Bound on one render attempt
    pub fn new(
        renderer: Arc<dyn QrImageRenderer>,
        base_validation_url: String,
        config: QrConfig,
        render_timeout: Duration,
    ) -> Self {
        QrPayloadBuilder {
            renderer,
            base_validation_url,
            config,
            render_timeout,
        }
    }

    /// Builds the validation payload and URL for a certificate and attempts
    /// to render the QR image.
    ///
    /// Every call mints a fresh `qr_id`, so re-building for the same
    /// certificate yields a distinguishable payload. The returned URL embeds
    /// the payload hash; render failures are reported in `render_error`
    /// without affecting the rest of the result.
    pub async fn build(&self, record: &CertificateRecord) -> QrBuildResult {
        let now = Utc::now();
        let mut payload = QrValidationPayload {
            qr_id: Self::generate_qr_id(now),
            certificate_id: record.certificate_id.clone(),
            verification_id: record.verification_id.clone(),
            issue_date: record.issue_date,
            expiry_date: record.expiry_date,
            timestamp: now,
            version: PAYLOAD_VERSION.to_string(),
            hash: String::new(),
        };
        payload.hash = payload.compute_hash();

        let validation_url = format!(
            "{}/validate?cert={}&hash={}&t={}",
            self.base_validation_url.trim_end_matches('/'),
            payload.certificate_id,
            payload.hash,
            now.timestamp_millis()
        );

        let (qr_image, render_error) = match tokio::time::timeout(
            self.render_timeout,
            self.renderer.render(&validation_url, &self.config),
        )
        .await
        {
            Ok(Ok(bytes)) => (
                Some(format!("data:image/png;base64,{}", base64::encode(&bytes))),
                None,
            ),
            Ok(Err(err)) => {
                warn!(
                    "QR rendering failed for {}: {}",
                    payload.certificate_id, err
                );
                (None, Some(err.to_string()))
            }
            Err(_) => {
                warn!(
                    "QR rendering timed out for {} after {:?}",
                    payload.certificate_id, self.render_timeout
                );
                (None, Some("QR rendering timed out".to_string()))
            }
        };

        QrBuildResult {
            validation_url,
            payload,
            qr_image,
            render_error,
        }
    }

    /// Mints a QR instance id, format "QR-<millis base36>-<random>".
    fn generate_qr_id(now: DateTime<Utc>) -> String {
        format!(
            "QR-{}-{}",
            to_base36(now.timestamp_millis().max(0) as u64),
            random_token(5)
        )
    }
}

/// Uppercase base-36 rendering of an integer.
fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut chars = Vec::new();
    while value > 0 {
        chars.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    chars.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CertificateError;
    use crate::models::verification::VerificationData;
    use crate::qr::renderer::DisabledQrRenderer;
    use async_trait::async_trait;

    /// Renderer double returning fixed bytes.
    struct StaticQrRenderer;

    #[async_trait]
    impl QrImageRenderer for StaticQrRenderer {
        async fn render(
            &self,
            _text: &str,
            _config: &QrConfig,
        ) -> Result<Vec<u8>, CertificateError> {
            Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
        }
    }

    /// Renderer double that never finishes in time.
    struct SlowQrRenderer;

    #[async_trait]
    impl QrImageRenderer for SlowQrRenderer {
        async fn render(
            &self,
            _text: &str,
            _config: &QrConfig,
        ) -> Result<Vec<u8>, CertificateError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    fn sample_record() -> CertificateRecord {
        let data = VerificationData {
            id: "REQ-2024-001".to_string(),
            policy_number: "POL-2024-789456".to_string(),
            insurance_company: "Empresa Seguradora A".to_string(),
            insured_name: "João Manuel Silva".to_string(),
            verification_type: "validade".to_string(),
            status: "approved".to_string(),
            submission_date: None,
            last_update: None,
            requester_name: None,
        };
        CertificateRecord::issue("CERT-2024-A1B2C3".to_string(), &data, Utc::now())
    }

    fn builder(renderer: Arc<dyn QrImageRenderer>) -> QrPayloadBuilder {
        QrPayloadBuilder::new(
            renderer,
            "https://portal.issm.gov.mz".to_string(),
            QrConfig::default(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_build_produces_verifiable_payload_and_url() {
        let record = sample_record();
        let result = builder(Arc::new(StaticQrRenderer)).build(&record).await;

        assert!(result.payload.verify_hash());
        assert_eq!(result.payload.certificate_id, record.certificate_id);
        assert!(result
            .validation_url
            .contains("validate?cert=CERT-2024-A1B2C3"));
        assert!(result
            .validation_url
            .contains(&format!("hash={}", result.payload.hash)));
        assert!(result
            .qr_image
            .as_deref()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert!(result.render_error.is_none());
    }

    #[tokio::test]
    async fn test_rebuild_mints_fresh_qr_id() {
        let record = sample_record();
        let b = builder(Arc::new(StaticQrRenderer));

        let first = b.build(&record).await;
        let second = b.build(&record).await;

        assert_ne!(first.payload.qr_id, second.payload.qr_id);
        assert!(first.payload.qr_id.starts_with("QR-"));
    }

    #[tokio::test]
    async fn test_render_failure_degrades_gracefully() {
        let record = sample_record();
        let result = builder(Arc::new(DisabledQrRenderer)).build(&record).await;

        assert!(result.qr_image.is_none());
        assert!(result.render_error.is_some());
        assert!(result.payload.verify_hash());
    }

    #[tokio::test]
    async fn test_render_timeout_degrades_gracefully() {
        let record = sample_record();
        let result = builder(Arc::new(SlowQrRenderer)).build(&record).await;

        assert!(result.qr_image.is_none());
        assert_eq!(result.render_error.as_deref(), Some("QR rendering timed out"));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_000_000), "LFLS");
    }
}
