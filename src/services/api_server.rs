// src/services/api_server.rs
//! REST API for the certificate service.
//!
//! The API is built using Axum and exposes the certificate core to the rest
//! of the portal:
//! - Certificate issuance from an approved verification
//! - Certificate retrieval
//! - Certificate document rendering (HTML, with an inline QR image)
//! - Public validity checks for third parties holding a validation URL

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::CertificateError;
use crate::models::verification::VerificationData;
use crate::services::certificate_manager::CertificateManager;
use crate::services::qr_builder::QrPayloadBuilder;
use crate::services::template_renderer::TemplateRenderer;
use crate::services::validation_service::ValidationService;

/// Query parameters of the public validation endpoint.
///
/// `t` is the issuance timestamp embedded in validation URLs; it is
/// accepted but not needed for the check itself.
#[derive(Serialize, Deserialize)]
struct ValidateQuery {
    cert: String,
    hash: String,
    #[serde(default)]
    t: Option<i64>,
}

/// Error body returned by every failing endpoint.
#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// API server state containing all service dependencies
pub struct ApiServer {
    /// Authority for minting and validating certificates
    manager: Arc<CertificateManager>,

    /// Public validity-check service
    validation: Arc<ValidationService>,

    /// Certificate document renderer
    template: Arc<TemplateRenderer>,

    /// Builder for QR payloads, used when rendering documents
    qr_builder: Arc<QrPayloadBuilder>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    pub fn new(
        manager: Arc<CertificateManager>,
        validation: Arc<ValidationService>,
        template: Arc<TemplateRenderer>,
        qr_builder: Arc<QrPayloadBuilder>,
    ) -> Self {
        ApiServer {
            manager,
            validation,
            template,
            qr_builder,
        }
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/certificates", post(Self::issue_certificate_handler))
            .route("/certificates/:id", get(Self::get_certificate_handler))
            .route(
                "/certificates/:id/document",
                get(Self::certificate_document_handler),
            )
            .route("/validate", get(Self::validate_handler))
            .with_state(Arc::new(self.clone()));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Issues a certificate for an approved verification
    ///
    /// # Endpoint
    /// POST /certificates
    ///
    /// # Responses
    /// - 200 OK: Issuance result (fresh or reused certificate)
    /// - 400 Bad Request: Missing required verification fields
    /// - 409 Conflict: Verification is not approved
    /// - 503 Service Unavailable: Record store unreachable
    async fn issue_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<VerificationData>,
    ) -> Response {
        match state.manager.generate(&payload).await {
            Ok(result) => (StatusCode::OK, Json(result)).into_response(),
            Err(e) => Self::error_response(e),
        }
    }

    /// Fetches a stored certificate record
    ///
    /// # Endpoint
    /// GET /certificates/:id
    ///
    /// # Responses
    /// - 200 OK: The certificate record
    /// - 404 Not Found: No certificate under that id
    async fn get_certificate_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
    ) -> Response {
        match state.manager.get_by_id(&id).await {
            Ok(record) => (StatusCode::OK, Json(record)).into_response(),
            Err(e) => Self::error_response(e),
        }
    }

    /// Renders the certificate document with a freshly built QR image
    ///
    /// # Endpoint
    /// GET /certificates/:id/document
    ///
    /// # Responses
    /// - 200 OK: HTML document
    /// - 404 Not Found: No certificate under that id
    /// - 500 Internal Server Error: Template rendering failed
    async fn certificate_document_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
    ) -> Response {
        let record = match state.manager.get_by_id(&id).await {
            Ok(record) => record,
            Err(e) => return Self::error_response(e),
        };

        let qr = state.qr_builder.build(&record).await;
        match state.template.render(&record, qr.qr_image.as_deref()) {
            Ok(document) => Html(document).into_response(),
            Err(e) => Self::error_response(e),
        }
    }

    /// Checks the validity of a presented certificate id and hash
    ///
    /// # Endpoint
    /// GET /validate?cert=..&hash=..
    ///
    /// # Responses
    /// - 200 OK: Validity outcome with `valid` and optional `reason`
    /// - 503 Service Unavailable: Record store unreachable
    async fn validate_handler(
        State(state): State<Arc<ApiServer>>,
        Query(query): Query<ValidateQuery>,
    ) -> Response {
        match state.validation.check_validity(&query.cert, &query.hash).await {
            Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
            Err(e) => Self::error_response(e),
        }
    }

    /// Maps a service error to its HTTP representation.
    fn error_response(err: CertificateError) -> Response {
        let status = match &err {
            CertificateError::Validation(_) => StatusCode::BAD_REQUEST,
            CertificateError::State(_) => StatusCode::CONFLICT,
            CertificateError::NotFound(_) => StatusCode::NOT_FOUND,
            CertificateError::Expired { .. } | CertificateError::Integrity(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CertificateError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CertificateError::Template(_)
            | CertificateError::QrRender(_)
            | CertificateError::IdAllocation => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("request failed: {}", err);
        }

        (
            status,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response()
    }
}

// Implement Clone for ApiServer to use with Axum's State
impl Clone for ApiServer {
    fn clone(&self) -> Self {
        ApiServer {
            manager: Arc::clone(&self.manager),
            validation: Arc::clone(&self.validation),
            template: Arc::clone(&self.template),
            qr_builder: Arc::clone(&self.qr_builder),
        }
    }
}
