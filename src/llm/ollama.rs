/// Ollama HTTP API client.
///
/// Talks to a local Ollama instance using the synchronous `ureq` HTTP
/// client:
///
/// - **Health check**: `GET /api/tags`, healthy when at least one model is
///   loaded.
/// - **Chat**: `POST /api/chat` with system + user messages.
///
/// The chat endpoint lets Ollama apply each model's own chat template, so no
/// template tokens are hard-coded here.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ChatMessage, CompletionBackend};
use crate::config::schema::LlmConfig;
use crate::error::LlmError;

// ---------------------------------------------------------------------------
// Request / response types for the Ollama API
// ---------------------------------------------------------------------------

/// Request body for `POST /api/chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    /// Ask Ollama to constrain the reply to valid JSON.
    format: &'static str,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: u32,
    num_ctx: u32,
}

/// Response body from `POST /api/chat` (non-streaming).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Response body from `GET /api/tags`.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous Ollama HTTP client, built from `[llm]` settings.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f64,
    timeout: Duration,
}

/// Context window requested for every call. Analysis prompts are short, so
/// this stays small enough to keep the KV cache on the GPU.
const CONTEXT_WINDOW: u32 = 8_192;

/// Upper bound on reply length. Analysis and suggestion replies are compact
/// JSON objects.
const RESPONSE_BUDGET: u32 = 1_024;

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// `localhost` may resolve to IPv6 first while Ollama binds IPv4 only.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url).replace("://localhost", "://127.0.0.1")
    }

    /// Names of the models Ollama has pulled. Empty when unreachable.
    pub fn list_models(&self) -> Vec<String> {
        let result = ureq::get(&self.url("/api/tags"))
            .timeout(Duration::from_secs(5))
            .call();

        match result {
            Ok(resp) => resp
                .into_json::<TagsResponse>()
                .map(|tags| tags.models.into_iter().map(|m| m.name).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!(error = %e, "ollama tags request failed");
                Vec::new()
            }
        }
    }
}

impl CompletionBackend for OllamaClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            format: "json",
            options: ChatOptions {
                temperature: self.temperature,
                num_predict: RESPONSE_BUDGET,
                num_ctx: CONTEXT_WINDOW,
            },
        };

        let resp = ureq::post(&self.url("/api/chat"))
            .timeout(self.timeout)
            .send_json(&body)
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let parsed: ChatResponse = resp
            .into_json()
            .map_err(|e| LlmError::Request(format!("unreadable chat response: {e}")))?;

        if parsed.message.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(parsed.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_healthy(&self) -> bool {
        !self.list_models().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
