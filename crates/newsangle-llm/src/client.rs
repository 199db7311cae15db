// Generative-language API client (`generateContent`, non-streaming).
//
// Sends a single user prompt and returns the completion text. No retries:
// any failure is surfaced to the caller as an `LlmError`.

use std::time::Duration;

use newsangle_core::config::{Config, LlmConfig};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("API response contained no completion text")]
    EmptyCompletion,
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Low-level client for the `models/{model}:generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, llm: &LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: llm.model.clone(),
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            temperature: llm.temperature,
            max_output_tokens: llm.max_output_tokens,
            timeout: Duration::from_secs(llm.timeout_secs),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send `prompt` and return the completion text.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "generateContent request failed");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        if let Some(reason) = parse_block_reason(&value) {
            warn!(%reason, "prompt was blocked");
        }
        if let Some(n) = parse_output_tokens(&value) {
            debug!(output_tokens = n, "generateContent complete");
        }

        let completion = parse_completion_text(&value).ok_or(LlmError::EmptyCompletion)?;
        if completion.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(completion)
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active client or disabled.
pub enum LlmClient {
    /// API key configured, requests go out.
    Active(GeminiClient),
    /// No API key; every completion fails with `NotConfigured`.
    Disabled,
}

impl LlmClient {
    /// `Active` if an API key is present in credentials, otherwise `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.gemini_api_key {
            Some(key) if !key.is_empty() => {
                LlmClient::Active(GeminiClient::new(key.clone(), &config.llm))
            }
            _ => LlmClient::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match self {
            LlmClient::Active(client) => client.complete(prompt).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }
}

// ---------------------------------------------------------------------------
// Response JSON helpers
// ---------------------------------------------------------------------------

/// Concatenate `candidates[0].content.parts[*].text`.
pub(crate) fn parse_completion_text(v: &Value) -> Option<String> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.concat())
    }
}

/// `usageMetadata.candidatesTokenCount`, if reported.
pub(crate) fn parse_output_tokens(v: &Value) -> Option<u32> {
    v.get("usageMetadata")?
        .get("candidatesTokenCount")?
        .as_u64()
        .map(|n| n as u32)
}

/// `promptFeedback.blockReason`, present when the prompt was refused.
pub(crate) fn parse_block_reason(v: &Value) -> Option<String> {
    v.get("promptFeedback")?
        .get("blockReason")?
        .as_str()
        .map(str::to_string)
}

/// Human-readable message from an error body
/// (`{"error": {"code": 400, "message": "...", "status": "..."}}`),
/// falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
