// src/main.rs

//! # ISSM Certificate Service - Main Entry Point
//!
//! This module serves as the main entry point for the certificate issuance
//! and validation service of the ISSM entity portal. It initializes all
//! core components and starts the API server.
//!
//! ## Architecture Overview
//! 1. **Storage Layer**: injected record store holding issued certificates
//! 2. **Services Layer**: certificate manager, QR payload builder, document
//!    renderer, validation lookup, and the REST API
//! 3. **Integrity Layer**: canonical SHA-256 fingerprints over certificate
//!    and QR payloads
//!
//! ## Environment Variables
//! - `ISSM_BIND_ADDR`: (Optional) listen address (default: 127.0.0.1:3000)
//! - `ISSM_VALIDATION_BASE_URL`: (Optional) base of the public validation
//!   endpoint embedded in certificates and QR codes
//! - `ISSM_QR_ENDPOINT`: (Optional) qrserver-compatible QR image endpoint;
//!   set empty to run without a renderer
//! - `ISSM_QR_TIMEOUT_MS`: (Optional) bound on one QR render attempt

use crate::qr::renderer::{DisabledQrRenderer, HttpQrRenderer, QrConfig, QrImageRenderer};
use crate::services::api_server::ApiServer;
use crate::services::certificate_manager::CertificateManager;
use crate::services::qr_builder::QrPayloadBuilder;
use crate::services::template_renderer::TemplateRenderer;
use crate::services::validation_service::ValidationService;
use crate::storage::memory_store::MemoryCertificateStore;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

// Module declarations (organized by functional domain)
mod error; // Service error taxonomy
mod models; // Data structures
mod qr; // QR image rendering
mod services; // Business logic and API
mod storage; // Record storage layer
mod utils; // Helper functions

/// Default public validation base URL.
const DEFAULT_VALIDATION_BASE_URL: &str = "https://portal.issm.gov.mz";

/// Default QR image endpoint (qrserver-compatible).
const DEFAULT_QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Build the record store and QR renderer
/// 3. Initialize service components
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let bind_addr = std::env::var("ISSM_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let base_validation_url = std::env::var("ISSM_VALIDATION_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_VALIDATION_BASE_URL.into());
    let qr_endpoint =
        std::env::var("ISSM_QR_ENDPOINT").unwrap_or_else(|_| DEFAULT_QR_ENDPOINT.into());
    let qr_timeout_ms: u64 = std::env::var("ISSM_QR_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);

    // QR rendering is best-effort; an empty endpoint disables it entirely.
    let qr_renderer: Arc<dyn QrImageRenderer> = if qr_endpoint.is_empty() {
        info!("QR rendering disabled (no endpoint configured)");
        Arc::new(DisabledQrRenderer)
    } else {
        Arc::new(HttpQrRenderer::new(qr_endpoint))
    };

    // Initialize core components
    let store = Arc::new(MemoryCertificateStore::new());
    let qr_builder = Arc::new(QrPayloadBuilder::new(
        qr_renderer,
        base_validation_url.clone(),
        QrConfig::default(),
        Duration::from_millis(qr_timeout_ms),
    ));
    let manager = Arc::new(CertificateManager::new(
        store,
        Arc::clone(&qr_builder),
        base_validation_url.clone(),
    ));
    let validation = Arc::new(ValidationService::new(Arc::clone(&manager)));
    let template = Arc::new(TemplateRenderer::new(base_validation_url));

    // Initialize API Server with all dependencies
    let api_server = ApiServer::new(manager, validation, template, qr_builder);

    let addr: SocketAddr = bind_addr.parse()?;
    info!("certificate service running at http://{}", addr);
    info!("available endpoints:");
    info!("- POST /certificates");
    info!("- GET  /certificates/:id");
    info!("- GET  /certificates/:id/document");
    info!("- GET  /validate?cert=..&hash=..");

    api_server.run(addr).await
}
