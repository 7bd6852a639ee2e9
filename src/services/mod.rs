//! Business logic and API.

pub mod api_server;
pub mod certificate_manager;
pub mod qr_builder;
pub mod template_renderer;
pub mod validation_service;
