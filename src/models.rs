//! Data models and structures
//!
//! Defines the inbound proxy request, the relayed response and the
//! process-wide configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body accepted by the proxy endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    /// Explicit MIME type for `image_base64`; inferred when absent.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Body returned on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyResponse {
    pub response: String,
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-pro";
pub const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` is tolerated at startup; requests then fail with a config error.
    pub gemini_api_key: Option<String>,
    pub text_model: String,
    pub vision_model: String,
    pub base_url: String,
    pub relax_safety: bool,
    pub request_timeout: Duration,
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            relax_safety: true,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            host: "0.0.0.0".to_string(),
            port: 8888,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            text_model: get("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            vision_model: get("GEMINI_VISION_MODEL").unwrap_or(defaults.vision_model),
            base_url: get("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            relax_safety: match get("GEMINI_RELAX_SAFETY") {
                Some(v) => parse_bool("GEMINI_RELAX_SAFETY", &v)?,
                None => defaults.relax_safety,
            },
            request_timeout: match get("GEMINI_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_number("GEMINI_TIMEOUT_SECS", &v)?),
                None => defaults.request_timeout,
            },
            host: get("HOST").unwrap_or(defaults.host),
            port: match get("PORT") {
                Some(v) => parse_number("PORT", &v)?,
                None => defaults.port,
            },
            max_body_bytes: match get("MAX_BODY_BYTES") {
                Some(v) => parse_number("MAX_BODY_BYTES", &v)?,
                None => defaults.max_body_bytes,
            },
        })
    }
}

fn parse_bool(key: &str, value: &str) -> crate::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(crate::Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::Error::Config(format!("{} must be a number, got '{}'", key, value)))
}
