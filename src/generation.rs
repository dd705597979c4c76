//! Content Generation Adapter
//!
//! Turns a topic into a raw, untyped candidate document by delegating to a
//! text generation service. All vendor-specific request/response shaping
//! lives here; nothing downstream knows which service produced the text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Untyped output of the adapter. Becomes a `Presentation` only after
/// validation.
pub type RawCandidate = Value;

/// Fixed instruction sent with every request. It pins the exact JSON shape
/// the validator expects.
pub const SYSTEM_INSTRUCTION: &str = r##"You are a presentation generator. Given a topic, respond with ONE JSON object describing a complete slide deck and nothing else.

Use exactly this shape:

{
  "title": "Presentation Title",
  "theme": {
    "primaryColor": "#1a5276",
    "secondaryColor": "#2ecc71",
    "fontFamily": "Inter, sans-serif"
  },
  "slides": [
    {
      "title": "Opening Slide",
      "imageUrl": "https://example.com/cover.jpg",
      "backgroundColor": "#1a5276",
      "textColor": "#ffffff"
    },
    {
      "title": "Slide Title",
      "imageUrl": "https://example.com/related.jpg",
      "backgroundColor": "#ffffff",
      "textColor": "#333333",
      "transition": "fade",
      "content": {
        "type": "paragraph",
        "text": "Body text",
        "notes": "Presenter notes"
      }
    }
  ]
}

Content block types and their fields:
- "paragraph": "text"
- "bullets": "bullets" (array of strings)
- "image-left" / "image-right": "text" (the slide's "imageUrl" is shown beside it)
- "quote": "quote": {"text", "author"}
- "title-only": no fields
- "two-column": "columns": {"left", "right", "leftTitle", "rightTitle"}
- "grid-images": "images" (array of image URLs)
- "timeline": "timelineEvents" (array of {"year", "event"})
- "chart": "chartData": {"labels", "values", "type": "bar" | "line" | "pie"}
- "section-divider": "text"
Every content object may carry "notes" for the presenter.
"transition" is one of "fade", "slide", "zoom", "flip", "none".

Rules:
1. Produce between 5 and 10 slides with an introduction, main points and a conclusion.
2. Vary the content block types across slides and fill every slide with substantial, accurate content.
3. Choose theme colors and a font that suit the topic.
4. Use valid image URLs related to the topic.
5. Do not include any text outside of the JSON object."##;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation service error: {0}")]
    Api(String),

    #[error("Could not extract a JSON object from the response")]
    Extraction,

    #[error("Response JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fixed sampling profile for every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub topic: String,
    pub system_instruction: String,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    pub fn for_topic(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            config: GenerationConfig::default(),
        }
    }
}

/// A text completion service: request in, raw response text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Wraps an async closure `topic -> text` as a generator.
pub struct FnGenerator<F> {
    name: String,
    func: F,
}

impl<F, Fut> FnGenerator<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, GenerationError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> TextGenerator for FnGenerator<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, GenerationError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        (self.func)(request.topic.clone()).await
    }
}

/// Generator used when no credential is configured. Always fails, which
/// routes every request through fallback synthesis.
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable(
            "no generation service credential configured".to_string(),
        ))
    }
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemini-1.5-pro";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Google Gemini `generateContent` client
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Unavailable(
                "Gemini API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn build_request_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: request.topic.clone(),
            }],
        }],
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: request.system_instruction.clone(),
            }],
        },
        generation_config: &request.config,
    }
}

fn response_text(body: &str) -> Result<String, GenerationError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Api(format!("Failed to parse response: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Api(format!(
            "Content blocked by safety filters: {}",
            reason
        )));
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| GenerationError::Api("No candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationError::Api("Empty candidate text".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        // Key goes in a header so it never shows up in URLs or logs.
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&build_request_body(request))
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiError>(&body)
                .map(|e| {
                    format!(
                        "{} ({})",
                        e.error.message,
                        e.error.status.as_deref().unwrap_or("unknown")
                    )
                })
                .unwrap_or(body);
            return Err(GenerationError::Api(format!("HTTP {}: {}", status, detail)));
        }

        response_text(&body)
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Locate the JSON object in free text: everything from the first `{` to
/// the last `}` inclusive.
///
/// Prose containing unbalanced braces outside the payload will mis-extract;
/// the parse step downstream catches that.
pub fn extract_json(text: &str) -> Result<&str, GenerationError> {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(GenerationError::Extraction),
    }
}

/// Sends a topic to the generator and returns the parsed candidate.
///
/// One call, no retries: any failure goes straight back to the caller.
pub struct GenerationAdapter {
    generator: Box<dyn TextGenerator>,
}

impl GenerationAdapter {
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
        }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub async fn generate(&self, topic: &str) -> Result<RawCandidate, GenerationError> {
        let request = GenerationRequest::for_topic(topic);
        let text = self.generator.complete(&request).await?;
        let json = extract_json(&text)?;
        tracing::debug!(generator = self.generator.name(), bytes = json.len(), "Extracted candidate JSON");
        Ok(serde_json::from_str(json)?)
    }
}
