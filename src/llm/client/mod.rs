//! Gemini vision client.
//!
//! Builds `generateContent` requests from page images, applies the safety
//! policy and turns responses into text or a typed failure.

mod config;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::PageImage;

use super::error::ExtractionError;
use super::retry::{with_safety_retry, RetryState};

pub use config::{HarmCategory, LlmConfig, SafetyPolicy, SafetyThreshold};

/// Output size class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBudget {
    /// Full checks, field extraction and cross-checks.
    Full,
    /// The shorter disclosure form check.
    FormCheck,
}

/// A vision model that reads page images and answers an instruction.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Send pages plus instruction, returning the raw response text.
    async fn extract(
        &self,
        pages: &[PageImage],
        instruction: &str,
        budget: TokenBudget,
    ) -> Result<String, ExtractionError>;

    /// Model identifier, for display.
    fn model_name(&self) -> &str;
}

/// Raw HTTP exchange, separated so tests can script responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body and return status code and response body.
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<(u16, String), ExtractionError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<(u16, String), ExtractionError> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport(format!("HTTP request failed: {e}")))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| ExtractionError::Transport(format!("Failed to read response: {e}")))?;
        Ok((status, text))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<GeminiSafetyRating>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<GeminiSafetyRating>,
}

#[derive(Debug, Deserialize)]
struct GeminiSafetyRating {
    category: String,
    probability: Option<String>,
    #[serde(default)]
    blocked: bool,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

fn blocked_categories(ratings: &[GeminiSafetyRating]) -> Vec<String> {
    ratings
        .iter()
        .filter(|r| r.blocked || r.probability.as_deref() == Some("HIGH"))
        .map(|r| r.category.clone())
        .collect()
}

/// Turn a decoded response into text or a failure.
///
/// Blocked prompts, missing candidates and any finish reason other than
/// `STOP` or `MAX_TOKENS` count as safety blocks.
fn interpret_response(response: GeminiResponse) -> Result<String, ExtractionError> {
    if let Some(error) = response.error {
        return Err(ExtractionError::Transport(format!(
            "Gemini API error: {}",
            error.message
        )));
    }

    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(ExtractionError::SafetyBlock {
                categories: blocked_categories(&feedback.safety_ratings),
                finish_reason: Some(reason.clone()),
            });
        }
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ExtractionError::SafetyBlock {
            categories: response
                .prompt_feedback
                .map(|f| blocked_categories(&f.safety_ratings))
                .unwrap_or_default(),
            finish_reason: None,
        });
    };

    match candidate.finish_reason.as_deref() {
        None | Some("STOP") => {}
        Some("MAX_TOKENS") => warn!("Response hit the output token limit and may be truncated"),
        Some(reason) => {
            return Err(ExtractionError::SafetyBlock {
                categories: blocked_categories(&candidate.safety_ratings),
                finish_reason: Some(reason.to_string()),
            });
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    Ok(text)
}

/// Gemini `generateContent` client.
pub struct GeminiClient<T: Transport = HttpTransport> {
    config: LlmConfig,
    transport: T,
}

impl GeminiClient<HttpTransport> {
    /// Create a client over HTTP. Fails without an API key.
    pub fn new(config: LlmConfig) -> Result<Self, ExtractionError> {
        if config.api_key.is_none() {
            return Err(ExtractionError::NotConfigured(
                "no Gemini API key configured".to_string(),
            ));
        }
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> GeminiClient<T> {
    pub fn with_transport(config: LlmConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn build_request(
        &self,
        pages: &[PageImage],
        instruction: &str,
        budget: TokenBudget,
    ) -> GeminiRequest {
        let mut parts = Vec::with_capacity(pages.len() + 1);
        parts.push(GeminiPart::Text {
            text: format!("{}\n{}", prompts::TASK_DECLARATION, instruction),
        });
        parts.extend(pages.iter().map(|page| GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: page.mime_type.clone(),
                data: STANDARD.encode(&page.data),
            },
        }));

        let max_output_tokens = match budget {
            TokenBudget::Full => self.config.max_output_tokens,
            TokenBudget::FormCheck => self.config.form_check_max_output_tokens,
        };

        let threshold = self.config.safety.threshold.api_name();
        GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens,
                response_mime_type: "application/json",
            },
            safety_settings: self
                .config
                .safety
                .categories
                .iter()
                .map(|c| GeminiSafetySetting {
                    category: c.api_name(),
                    threshold,
                })
                .collect(),
        }
    }

    async fn attempt(
        &self,
        body: &serde_json::Value,
        api_key: &str,
        state: RetryState,
    ) -> Result<String, ExtractionError> {
        debug!(
            "Gemini request (attempt {}) to {}",
            state.attempt(),
            self.config.model
        );
        let (status, text) = self
            .transport
            .post_json(&self.config.generate_url(), api_key, body)
            .await?;

        if !(200..300).contains(&status) {
            return Err(ExtractionError::Transport(format!(
                "Gemini API error ({status}): {text}"
            )));
        }

        let response: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| ExtractionError::Transport(format!("Failed to parse response: {e}")))?;
        interpret_response(response)
    }
}

#[async_trait]
impl<T: Transport> VisionClient for GeminiClient<T> {
    async fn extract(
        &self,
        pages: &[PageImage],
        instruction: &str,
        budget: TokenBudget,
    ) -> Result<String, ExtractionError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ExtractionError::NotConfigured("no Gemini API key configured".to_string())
        })?;

        let request = self.build_request(pages, instruction, budget);
        let body = serde_json::to_value(&request)
            .map_err(|e| ExtractionError::Transport(format!("Failed to encode request: {e}")))?;

        with_safety_retry(|state| self.attempt(&body, api_key, state)).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays canned responses and records request bodies.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<(u16, String), ExtractionError>>>,
        requests: Mutex<Vec<serde_json::Value>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<(u16, String), ExtractionError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post_json(
            &self,
            _url: &str,
            _api_key: &str,
            body: &serde_json::Value,
        ) -> Result<(u16, String), ExtractionError> {
            self.requests.lock().unwrap().push(body.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExtractionError::Transport("script exhausted".into())))
        }
    }

    fn ok_text(text: &str) -> Result<(u16, String), ExtractionError> {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        });
        Ok((200, body.to_string()))
    }

    fn blocked_response() -> Result<(u16, String), ExtractionError> {
        let body = serde_json::json!({
            "candidates": [{
                "finishReason": "SAFETY",
                "safetyRatings": [
                    {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "probability": "HIGH", "blocked": true},
                    {"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}
                ]
            }]
        });
        Ok((200, body.to_string()))
    }

    fn client(
        responses: Vec<Result<(u16, String), ExtractionError>>,
    ) -> GeminiClient<ScriptedTransport> {
        GeminiClient::with_transport(
            LlmConfig::base_default().with_api_key("test-key"),
            ScriptedTransport::new(responses),
        )
    }

    fn page() -> PageImage {
        PageImage::jpeg(0, vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn test_request_shape() {
        let client = client(vec![ok_text("[]")]);
        client
            .extract(&[page()], "check this", TokenBudget::FormCheck)
            .await
            .unwrap();

        let requests = client.transport.requests.lock().unwrap();
        let body = &requests[0];
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        let text = parts[0]["text"].as_str().unwrap();
        assert!(text.starts_with(prompts::TASK_DECLARATION));
        assert!(text.ends_with("check this"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9j/");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let settings = body["safetySettings"].as_array().unwrap();
        assert_eq!(settings.len(), 5);
        assert!(settings.iter().all(|s| s["threshold"] == "BLOCK_NONE"));
        assert!(settings
            .iter()
            .any(|s| s["category"] == "HARM_CATEGORY_CIVIC_INTEGRITY"));
    }

    #[tokio::test]
    async fn test_block_then_success() {
        let client = client(vec![blocked_response(), ok_text("[{\"severity\":\"info\"}]")]);
        let text = client
            .extract(&[page()], "x", TokenBudget::Full)
            .await
            .unwrap();
        assert!(text.contains("info"));
        assert_eq!(client.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_two_blocks_surface_categories() {
        let client = client(vec![blocked_response(), blocked_response(), ok_text("[]")]);
        let err = client
            .extract(&[page()], "x", TokenBudget::Full)
            .await
            .unwrap_err();
        match err {
            ExtractionError::SafetyBlock {
                categories,
                finish_reason,
            } => {
                assert_eq!(categories, vec!["HARM_CATEGORY_DANGEROUS_CONTENT"]);
                assert_eq!(finish_reason.as_deref(), Some("SAFETY"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(client.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_http_error_is_transport_without_retry() {
        let client = client(vec![Ok((500, "internal".into())), ok_text("[]")]);
        let err = client
            .extract(&[page()], "x", TokenBudget::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Transport(_)));
        assert_eq!(client.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_response_is_empty() {
        let client = client(vec![ok_text("  \n ")]);
        let err = client
            .extract(&[page()], "x", TokenBudget::Full)
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::EmptyResponse);
        assert_eq!(client.transport.request_count(), 1);
    }

    #[test]
    fn test_prompt_block_reason() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"promptFeedback": {"blockReason": "PROHIBITED_CONTENT", "safetyRatings": []}}"#,
        )
        .unwrap();
        match interpret_response(response) {
            Err(ExtractionError::SafetyBlock { finish_reason, .. }) => {
                assert_eq!(finish_reason.as_deref(), Some("PROHIBITED_CONTENT"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_no_candidates_is_block() {
        let result = interpret_response(GeminiResponse::default());
        assert!(matches!(result, Err(ExtractionError::SafetyBlock { .. })));
    }

    #[test]
    fn test_max_tokens_keeps_text() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "[{\"a\": 1},"}]}, "finishReason": "MAX_TOKENS"}]}"#,
        )
        .unwrap();
        assert_eq!(interpret_response(response).unwrap(), "[{\"a\": 1},");
    }

    #[test]
    fn test_missing_api_key() {
        let err = GeminiClient::new(LlmConfig::base_default()).err().unwrap();
        assert!(matches!(err, ExtractionError::NotConfigured(_)));
    }
}
