// src/qr/renderer.rs
//! QR image rendering collaborators.
//!
//! The service never rasterizes barcodes itself: it hands the validation
//! URL to a renderer behind the [`QrImageRenderer`] trait. Rendering is
//! best-effort everywhere it is used; a failed render degrades to a
//! certificate without an inline QR image.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::CertificateError;

/// Rendering options for a QR image.
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Edge length of the square image in pixels
    pub size: u32,
    /// Quiet-zone width in modules
    pub margin: u32,
    /// Error correction level: L, M, Q, or H
    pub error_correction: char,
}

impl Default for QrConfig {
    fn default() -> Self {
        QrConfig {
            size: 120,
            margin: 2,
            error_correction: 'M',
        }
    }
}

/// Encodes a string into QR image bytes.
#[async_trait]
pub trait QrImageRenderer: Send + Sync {
    /// Renders `text` as a QR image.
    ///
    /// # Errors
    /// Returns `CertificateError::QrRender` on any failure. Callers treat
    /// this as recoverable.
    async fn render(&self, text: &str, config: &QrConfig) -> Result<Vec<u8>, CertificateError>;
}

/// Renderer backed by a qrserver-compatible HTTP endpoint.
///
/// The endpoint receives the payload via query parameters
/// (`size`, `data`, `qzone`, `ecc`) and answers with PNG bytes.
pub struct HttpQrRenderer {
    client: Client,
    endpoint: String,
}

impl HttpQrRenderer {
    /// Creates a renderer against the given endpoint URL.
    pub fn new(endpoint: String) -> Self {
        HttpQrRenderer {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl QrImageRenderer for HttpQrRenderer {
    async fn render(&self, text: &str, config: &QrConfig) -> Result<Vec<u8>, CertificateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("size", format!("{}x{}", config.size, config.size)),
                ("data", text.to_string()),
                ("qzone", config.margin.to_string()),
                ("ecc", config.error_correction.to_string()),
            ])
            .send()
            .await
            .map_err(|e| CertificateError::QrRender(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| CertificateError::QrRender(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CertificateError::QrRender(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// Renderer used when no QR endpoint is configured. Always reports an
/// unavailable renderer, letting issuance proceed without an image.
pub struct DisabledQrRenderer;

#[async_trait]
impl QrImageRenderer for DisabledQrRenderer {
    async fn render(&self, _text: &str, _config: &QrConfig) -> Result<Vec<u8>, CertificateError> {
        Err(CertificateError::QrRender(
            "no QR renderer configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_http_renderer_returns_image_bytes() {
        let mock = mockito::mock("GET", Matcher::Regex("^/qr-ok".to_string()))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(&b"\x89PNG\r\n\x1a\n"[..])
            .create();

        let renderer = HttpQrRenderer::new(format!("{}/qr-ok", mockito::server_url()));
        let bytes = renderer
            .render(
                "https://portal.issm.gov.mz/validate?cert=CERT-2024-A1B2C3",
                &QrConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(&bytes[..4], b"\x89PNG");
        mock.assert();
    }

    #[tokio::test]
    async fn test_http_renderer_maps_server_errors() {
        let _mock = mockito::mock("GET", Matcher::Regex("^/qr-err".to_string()))
            .with_status(500)
            .create();

        let renderer = HttpQrRenderer::new(format!("{}/qr-err", mockito::server_url()));
        let result = renderer.render("data", &QrConfig::default()).await;

        assert!(matches!(result, Err(CertificateError::QrRender(_))));
    }

    #[tokio::test]
    async fn test_disabled_renderer_always_fails() {
        let result = DisabledQrRenderer
            .render("data", &QrConfig::default())
            .await;
        assert!(matches!(result, Err(CertificateError::QrRender(_))));
    }
}
