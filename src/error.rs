//! Error handling and custom error types
//!
//! `Error` is the crate-wide failure type. `ProxyError` is what the proxy
//! handler returns, one variant per failure category a caller can see.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error: {0}")]
    AiProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by [`crate::proxy::ProxyHandler::handle`].
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    /// Rejected inbound request; `status` is 400 unless the body could not be read.
    #[error("{message}")]
    InvalidRequest {
        message: String,
        details: Option<String>,
        status: StatusCode,
    },

    #[error("Server configuration error: {0}")]
    MissingConfig(String),

    #[error("Error processing request: {0}")]
    Upstream(#[from] Error),
}

impl ProxyError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ProxyError::InvalidRequest {
            message: message.into(),
            details: None,
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_with_details(message: impl Into<String>, details: impl ToString) -> Self {
        ProxyError::InvalidRequest {
            message: message.into(),
            details: Some(details.to_string()),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::InvalidRequest { status, .. } => *status,
            ProxyError::MissingConfig(_) | ProxyError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error body: `{error, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&ProxyError> for ErrorBody {
    fn from(err: &ProxyError) -> Self {
        let (error, details) = match err {
            ProxyError::MethodNotAllowed(_) => ("Method Not Allowed".to_string(), None),
            ProxyError::InvalidRequest {
                message, details, ..
            } => (message.clone(), details.clone()),
            ProxyError::MissingConfig(what) => {
                ("Server configuration error".to_string(), Some(what.clone()))
            }
            ProxyError::Upstream(e) => ("Error processing request".to_string(), Some(e.to_string())),
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut res = (self.status(), Json(ErrorBody::from(&self))).into_response();

        if let ProxyError::MethodNotAllowed(_) = self {
            res.headers_mut().insert(
                axum::http::header::ALLOW,
                axum::http::HeaderValue::from_static("POST"),
            );
        }

        res
    }
}
