// src/services/template_renderer.rs
//! Certificate document renderer.
//!
//! Pure substitution of a certificate record (plus an optional QR image)
//! into the portal's certificate document. Every `{TOKEN}` in the template
//! must resolve to a field value; a token with no backing value is a
//! rendering error, never emitted literally. All field values are
//! HTML-escaped on the way in: names and other free-text fields are data,
//! not markup.

use crate::error::CertificateError;
use crate::models::certificate::CertificateRecord;

/// The certificate document, in the portal's layout. Tokens are
/// `{UPPER_SNAKE}` placeholders resolved against the record.
const CERTIFICATE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="pt">
<head>
    <meta charset="utf-8">
    <title>Certificado de Validação - {CERTIFICATE_ID}</title>
</head>
<body>
<div class="certificate-container">
    <header class="certificate-header">
        <h1>Certificado de Validação</h1>
        <div>Certificado Nº: {CERTIFICATE_ID}</div>
        <div>Data: {ISSUE_DATE}</div>
    </header>
    <main class="certificate-content">
        <section class="policy-details">
            <h3>Detalhes da Apólice</h3>
            <p>Número: {POLICY_NUMBER}</p>
            <p>Seguradora: {INSURANCE_COMPANY}</p>
            <p>Segurado: {INSURED_NAME}</p>
            <p>Tipo: {VERIFICATION_TYPE}</p>
            <p>Solicitante: {REQUESTER_NAME}</p>
            <p>Data Verificação: {VERIFICATION_DATE}</p>
        </section>
        <section class="validation-status">
            <h3>Status: {VALIDATION_STATUS}</h3>
            <p>Válido até: {EXPIRY_DATE}</p>
            <p>ID Verificação: {VERIFICATION_ID}</p>
        </section>
        <section class="qr-validation">
            <img src="{QR_IMAGE}" alt="QR Code" width="120" height="120">
            <p>URL: {VALIDATION_URL}</p>
            <p>Hash: {SECURITY_HASH}</p>
        </section>
    </main>
    <footer class="certificate-footer">
        <p>Assinado digitalmente em: {SIGNATURE_TIMESTAMP}</p>
    </footer>
</div>
</body>
</html>
"#;

/// Renderer producing the human-presentable certificate document.
pub struct TemplateRenderer {
    /// Base URL of the public validation endpoint, for the document's link
    base_validation_url: String,
}

impl TemplateRenderer {
    pub fn new(base_validation_url: String) -> Self {
        TemplateRenderer {
            base_validation_url,
        }
    }

    /// Renders the certificate document.
    ///
    /// # Arguments
    /// * `record` - Certificate to render
    /// * `qr_image` - PNG data URI for the QR code; an absent image leaves
    ///   the slot empty rather than failing the render
    ///
    /// # Errors
    /// `CertificateError::Template` when a template token has no backing
    /// value (including optional record fields that are absent).
    ///
    /// The output is a pure function of the inputs; rendering has no side
    /// effects and may be repeated freely.
    pub fn render(
        &self,
        record: &CertificateRecord,
        qr_image: Option<&str>,
    ) -> Result<String, CertificateError> {
        self.substitute(CERTIFICATE_TEMPLATE, record, qr_image)
    }

    /// Single pass over the template: copies literal text and swaps each
    /// token for its escaped field value. Substituted data is never
    /// re-scanned, so token-like text inside a field stays inert.
    fn substitute(
        &self,
        template: &str,
        record: &CertificateRecord,
        qr_image: Option<&str>,
    ) -> Result<String, CertificateError> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find('{') {
            output.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let token_len = after
                .bytes()
                .take_while(|b| b.is_ascii_uppercase() || *b == b'_')
                .count();

            if token_len > 0 && after.as_bytes().get(token_len) == Some(&b'}') {
                let token = &after[..token_len];
                let value = self.field_value(record, token, qr_image).ok_or_else(|| {
                    CertificateError::Template(format!("no value for placeholder {{{}}}", token))
                })?;
                output.push_str(&escape_html(&value));
                rest = &after[token_len + 1..];
            } else {
                output.push('{');
                rest = after;
            }
        }
        output.push_str(rest);
        Ok(output)
    }

    /// Resolves one template token against the record. `None` means the
    /// token is unknown or its backing field is absent.
    fn field_value(
        &self,
        record: &CertificateRecord,
        token: &str,
        qr_image: Option<&str>,
    ) -> Option<String> {
        match token {
            "CERTIFICATE_ID" => Some(record.certificate_id.clone()),
            "VERIFICATION_ID" => Some(record.verification_id.clone()),
            "ISSUE_DATE" => Some(record.issue_date.format("%d/%m/%Y").to_string()),
            "EXPIRY_DATE" => Some(record.expiry_date.format("%d/%m/%Y").to_string()),
            "POLICY_NUMBER" => Some(record.policy_number.clone()),
            "INSURANCE_COMPANY" => Some(record.insurance_company.clone()),
            "INSURED_NAME" => Some(record.insured_name.clone()),
            "VERIFICATION_TYPE" => Some(record.verification_type.clone()),
            "VALIDATION_STATUS" => Some(record.validation_status.clone()),
            "REQUESTER_NAME" => record.requester_name.clone(),
            "VERIFICATION_DATE" => record
                .verification_date
                .map(|d| d.format("%d/%m/%Y").to_string()),
            "SECURITY_HASH" => Some(record.security_hash.clone()),
            "SIGNATURE_TIMESTAMP" => Some(
                record
                    .signature_timestamp
                    .format("%d/%m/%Y %H:%M")
                    .to_string(),
            ),
            "VALIDATION_URL" => Some(record.validation_url(&self.base_validation_url)),
            "QR_IMAGE" => Some(qr_image.unwrap_or_default().to_string()),
            _ => None,
        }
    }
}

/// Escapes a field value for embedding in the HTML document.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
