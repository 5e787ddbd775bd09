use super::client::GeminiHttpClient;
use super::types::GenerateContentResponse;
use crate::ai::{GenerationService, UpstreamCall};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiGenerationClient {
    http: GeminiHttpClient,
}

impl GeminiGenerationClient {
    pub fn new(timeout: Duration) -> Self {
        Self::new_with_client(timeout, reqwest::Client::new())
    }

    pub fn new_with_client(timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn extract_text(response: &GenerateContentResponse) -> Result<String> {
        if let Some(text) = response.first_text() {
            return Ok(text.to_string());
        }

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(Error::AiProvider(format!(
                "Prompt blocked by Gemini: {}",
                reason
            )));
        }

        match response.candidates.first() {
            None => Err(Error::AiProvider(
                "No candidates in Gemini response".to_string(),
            )),
            Some(candidate) => Err(Error::AiProvider(format!(
                "No text in Gemini response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }
}

#[async_trait]
impl GenerationService for GeminiGenerationClient {
    async fn generate(&self, api_key: &str, call: &UpstreamCall) -> Result<String> {
        let response: GenerateContentResponse = self
            .http
            .generate_content(api_key, &call.model, &call.request)
            .await?;

        let text = Self::extract_text(&response)?;
        tracing::debug!(
            model = %call.model,
            chars = text.len(),
            "Gemini returned text"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::ai::gemini::types::{Content, GenerateContentRequest, Part};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_call(model: &str, prompt: &str) -> UpstreamCall {
        UpstreamCall {
            model: model.to_string(),
            request: GenerateContentRequest {
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![Part::Text {
                        text: prompt.to_string(),
                    }],
                }],
                safety_settings: None,
            },
        }
    }

    fn make_client(server: &MockServer) -> GeminiGenerationClient {
        GeminiGenerationClient::new(Duration::from_secs(5)).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_generate_returns_first_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .and(body_string_contains("\"text\":\"hello\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    { "content": { "parts": [{ "text": "Hi there" }] } },
                    { "content": { "parts": [{ "text": "second" }] } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = make_client(&server)
            .generate("test-key", &text_call("gemini-pro", "hello"))
            .await
            .unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate("test-key", &text_call("gemini-pro", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_blocked_prompt_reports_reason() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate("test-key", &text_call("gemini-pro", "hello"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Prompt blocked by Gemini: SAFETY"));
    }

    #[tokio::test]
    async fn test_candidate_without_content_reports_finish_reason() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate("test-key", &text_call("gemini-pro", "hello"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("finish reason: SAFETY"));
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate("bad-key", &text_call("gemini-pro", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
