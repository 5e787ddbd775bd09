//! The proxy handler: validate the inbound request, pick a model, make one
//! upstream call and relay the text.

use crate::ai::gemini::types::{
    relaxed_safety_settings, Content, GenerateContentRequest, InlineData, Part,
};
use crate::ai::{mime, GenerationService, UpstreamCall};
use crate::error::ProxyError;
use crate::models::{Config, ProxyRequest, ProxyResponse};
use axum::http::Method;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use std::sync::Arc;
use tracing::{error, info};

/// Standard alphabet, padding optional on input.
const IMAGE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub prompt: String,
    pub image: Option<InlineData>,
}

#[derive(Clone)]
pub struct ProxyHandler {
    config: Arc<Config>,
    upstream: Arc<dyn GenerationService>,
}

impl ProxyHandler {
    pub fn new(config: Arc<Config>, upstream: Arc<dyn GenerationService>) -> Self {
        Self { config, upstream }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn handle(&self, method: &Method, body: &[u8]) -> Result<ProxyResponse, ProxyError> {
        if method != Method::POST {
            return Err(ProxyError::MethodNotAllowed(method.clone()));
        }

        let request = parse_request(body)?;

        let api_key = self.config.gemini_api_key.as_deref().ok_or_else(|| {
            error!("GEMINI_API_KEY is not configured");
            ProxyError::MissingConfig("GEMINI_API_KEY is not set".to_string())
        })?;

        let has_image = request.image.is_some();
        let call = self.build_call(request);
        info!(model = %call.model, has_image, "Forwarding prompt to Gemini");

        let text = self.upstream.generate(api_key, &call).await.map_err(|e| {
            error!("Error calling Gemini API: {}", e);
            ProxyError::Upstream(e)
        })?;

        Ok(ProxyResponse { response: text })
    }

    /// Select the model and assemble the `generateContent` payload.
    pub fn build_call(&self, request: ValidatedRequest) -> UpstreamCall {
        let model = if request.image.is_some() {
            self.config.vision_model.clone()
        } else {
            self.config.text_model.clone()
        };

        let mut parts = vec![Part::Text {
            text: request.prompt,
        }];
        if let Some(inline_data) = request.image {
            parts.push(Part::InlineData { inline_data });
        }

        UpstreamCall {
            model,
            request: GenerateContentRequest {
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts,
                }],
                safety_settings: self.config.relax_safety.then(relaxed_safety_settings),
            },
        }
    }
}

/// Parse and validate a raw request body.
pub fn parse_request(body: &[u8]) -> Result<ValidatedRequest, ProxyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProxyError::invalid("Prompt is required"));
    }

    let request: ProxyRequest = serde_json::from_slice(body)
        .map_err(|e| ProxyError::invalid_with_details("Invalid request body", e))?;

    let prompt = match request.prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => return Err(ProxyError::invalid("Prompt is required")),
    };

    let image = match request.image_base64.as_deref().map(str::trim) {
        Some(encoded) if !encoded.is_empty() => {
            Some(resolve_image(encoded, request.mime_type.as_deref())?)
        }
        _ => None,
    };

    Ok(ValidatedRequest { prompt, image })
}

/// Build the inline image part.
///
/// MIME precedence: explicit `mimeType`, then a data-URL prefix, then the
/// decoded payload's signature.
fn resolve_image(encoded: &str, explicit_mime: Option<&str>) -> Result<InlineData, ProxyError> {
    let (url_mime, payload) = match mime::split_data_url(encoded) {
        Some((mime, payload)) => (Some(mime), payload),
        None => (None, encoded),
    };

    let mut data: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = IMAGE_BASE64
        .decode(&data)
        .map_err(|e| ProxyError::invalid_with_details("imageBase64 is not valid base64", e))?;
    if bytes.is_empty() {
        return Err(ProxyError::invalid("imageBase64 is empty"));
    }

    // Forward canonical padded base64.
    let padding = (4 - data.len() % 4) % 4;
    data.extend(std::iter::repeat('=').take(padding));

    let declared = explicit_mime
        .map(mime::essence)
        .filter(|m| !m.is_empty())
        .or_else(|| url_mime.map(mime::essence).filter(|m| !m.is_empty()));
    let mime_type = match declared {
        Some(m) if m.starts_with("image/") => m,
        Some(m) => {
            return Err(ProxyError::invalid_with_details(
                "Unsupported image MIME type",
                m,
            ))
        }
        None => mime::detect_image_mime(&bytes).to_string(),
    };

    Ok(InlineData { mime_type, data })
}
