use super::{GenerationService, UpstreamCall};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the upstream model.
///
/// Replies cycle through the configured responses; every call is recorded
/// so tests can inspect the selected model and content parts.
#[derive(Clone)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    calls: Arc<Mutex<Vec<UpstreamCall>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_text_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(Ok(response));
        self
    }

    /// Queue a failure surfaced as [`Error::AiProvider`].
    pub fn with_error_response(self, message: String) -> Self {
        self.responses.lock().unwrap().push(Err(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<UpstreamCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, _api_key: &str, call: &UpstreamCall) -> Result<String> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call.clone());
            calls.len()
        };

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(format!("Mock response from {}", call.model));
        }

        let index = (count - 1) % responses.len();
        responses[index].clone().map_err(Error::AiProvider)
    }
}
