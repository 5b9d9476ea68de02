/// LLM client, the single point of entry for all Gemini API calls in the bot.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Pipelines depend on the `CompletionService` trait so they can be driven by
/// scripted fakes in tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Fast models preferred when auto-detecting, best first.
pub const PRIORITY_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-2.0-flash-lite",
];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the configured model does not exist (HTTP 404 or a "not found" message).
    pub fn is_model_not_found(&self) -> bool {
        match self {
            LlmError::Api { status: 404, .. } => true,
            other => {
                let text = other.to_string().to_lowercase();
                text.contains("404") || text.contains("not found")
            }
        }
    }
}

/// Per-call knobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    /// Lets the model ground its answer with web search.
    pub grounding: bool,
}

impl CompletionOptions {
    pub fn grounded() -> Self {
        Self {
            temperature: Some(0.2),
            grounding: true,
        }
    }
}

/// Text completion backend used by the idea and meal pipelines.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String, LlmError>;

    /// Model identifiers the backend can serve. Empty on failure.
    async fn list_models(&self) -> Vec<String>;

    /// Model currently used for completions.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate, trimmed.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Gemini `generateContent` client with retry on 429 / 5xx.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Builds a client on the best available flash model, or `fallback_model`.
    pub async fn detect(api_key: String, fallback_model: String) -> Self {
        let mut client = Self::new(api_key, fallback_model.clone());
        let available = client.list_models().await;
        client.model = pick_best_model(&available, &fallback_model);
        info!("Gemini model selected: {}", client.model);
        client
    }

    /// Makes a raw `generateContent` call, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<GenerateResponse, LlmError> {
        let request_body = build_request(prompt, options);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Gemini call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Gemini API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let gemini_response: GenerateResponse = response.json().await?;

            if let Some(usage) = &gemini_response.usage_metadata {
                debug!(
                    "Gemini call succeeded: prompt_tokens={}, output_tokens={}, grounding={}",
                    usage.prompt_token_count, usage.candidates_token_count, options.grounding
                );
            }

            return Ok(gemini_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        self.call(prompt, options)
            .await?
            .text()
            .ok_or(LlmError::EmptyContent)
    }

    async fn list_models(&self) -> Vec<String> {
        let result = async {
            self.client
                .get(format!("{}/models", self.base_url))
                .query(&[("pageSize", "1000")])
                .header("x-goog-api-key", &self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json::<ModelList>()
                .await
        }
        .await;

        match result {
            Ok(list) => list
                .models
                .into_iter()
                .map(|m| m.name.trim_start_matches("models/").to_string())
                .collect(),
            Err(e) => {
                warn!("Failed to list Gemini models: {e}");
                Vec::new()
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn build_request<'a>(prompt: &'a str, options: &CompletionOptions) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![RequestPart { text: prompt }],
        }],
        generation_config: options
            .temperature
            .map(|temperature| GenerationConfig { temperature }),
        tools: if options.grounding {
            vec![Tool {
                google_search: serde_json::json!({}),
            }]
        } else {
            Vec::new()
        },
    }
}

/// Picks the preferred fast model from `available`.
///
/// Order: `PRIORITY_MODELS`, then any non-experimental flash model, then `fallback`.
pub fn pick_best_model(available: &[String], fallback: &str) -> String {
    let clean = |name: &str| name.trim_start_matches("models/").to_string();

    for preferred in PRIORITY_MODELS {
        if available.iter().any(|name| clean(name.as_str()) == *preferred) {
            return preferred.to_string();
        }
    }

    available
        .iter()
        .map(|name| clean(name.as_str()))
        .find(|name| {
            let lower = name.to_lowercase();
            lower.contains("flash") && !lower.contains("exp")
        })
        .unwrap_or_else(|| fallback.to_string())
}
