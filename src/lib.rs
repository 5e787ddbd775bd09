//! HTTP proxy for Google's Gemini `generateContent` API
//!
//! Accepts `{prompt, imageBase64?}`, forwards the prompt (and optional inline
//! image) to a text or vision model, and relays the model's text back as
//! `{response}`.

pub mod ai;
pub mod error;
pub mod models;
pub mod proxy;
pub mod server;

pub use error::{Error, ProxyError, Result};
