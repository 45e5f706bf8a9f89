/// Optional AI backend for analysis and suggestions.
///
/// Rule-based scoring always runs. When `[llm] enabled = true` (or
/// `ENHANCE_USE_AI=1` / `--ai`) and the backend is healthy, the analyzer and
/// optimizer also ask a local model for a second opinion and merge the
/// results. Every failure here degrades to the rule-based output.
///
/// # Backend seam
///
/// Callers only see [`CompletionBackend`]. [`ollama::OllamaClient`] is the
/// production implementation; tests plug in canned backends.
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod ollama;
pub mod prompts;
pub mod validation;

use crate::config::schema::LlmConfig;
use crate::error::LlmError;
use ollama::OllamaClient;

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Anything that can answer a chat request.
pub trait CompletionBackend: Send + Sync {
    /// Send the conversation and return the assistant's reply text.
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Model identifier recorded as `model_used`.
    fn model_name(&self) -> &str;

    /// Cheap reachability check.
    fn is_healthy(&self) -> bool;
}

/// Build the configured backend, or `None` when the LLM is disabled.
pub fn backend_from_config(config: &LlmConfig) -> Option<Box<dyn CompletionBackend>> {
    if !config.enabled {
        return None;
    }
    Some(Box::new(OllamaClient::from_config(config)))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Per-dimension scores returned by the model. Absent dimensions stay `None`
/// and fall back to the rule-based value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AiScores {
    pub semantic_clarity: Option<u32>,
    pub structural_integrity: Option<u32>,
    pub logical_coherence: Option<u32>,
    pub specificity_score: Option<u32>,
    pub instruction_clarity: Option<u32>,
    pub context_completeness: Option<u32>,
}

/// Parsed model analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AiAnalysis {
    pub scores: AiScores,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Ask the backend to score `text`.
pub fn request_analysis(
    backend: &dyn CompletionBackend,
    text: &str,
) -> Result<AiAnalysis, LlmError> {
    let messages = prompts::analysis_messages(text);
    let reply = backend.chat(&messages)?;
    let json = validation::extract_json(&reply)?;

    let scores = json.get("scores").unwrap_or(&Value::Null);
    Ok(AiAnalysis {
        scores: AiScores {
            semantic_clarity: validation::score_field(scores, "semantic_clarity"),
            structural_integrity: validation::score_field(scores, "structural_integrity"),
            logical_coherence: validation::score_field(scores, "logical_coherence"),
            specificity_score: validation::score_field(scores, "specificity")
                .or_else(|| validation::score_field(scores, "specificity_score")),
            instruction_clarity: validation::score_field(scores, "instruction_clarity"),
            context_completeness: validation::score_field(scores, "context_completeness"),
        },
        strengths: validation::string_list(&json, "strengths"),
        weaknesses: validation::string_list(&json, "weaknesses"),
        suggestions: validation::string_list(&json, "suggestions"),
    })
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// One suggestion as the model describes it. Every field is optional on the
/// wire; defaults match a medium-priority clarity tip.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AiSuggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: u8,
    pub impact: String,
    pub title: String,
    pub description: String,
    pub improvement_plan: String,
    pub expected_improvement: std::collections::HashMap<String, f64>,
    pub examples: Vec<String>,
    pub reasoning: String,
    pub confidence: f64,
}

impl Default for AiSuggestion {
    fn default() -> Self {
        Self {
            kind: "clarity".to_string(),
            priority: 3,
            impact: "medium".to_string(),
            title: "Optimization suggestion".to_string(),
            description: String::new(),
            improvement_plan: String::new(),
            expected_improvement: Default::default(),
            examples: Vec::new(),
            reasoning: String::new(),
            confidence: 0.8,
        }
    }
}

/// Ask the backend for suggestions given an analysis summary. At most five
/// are returned; entries that do not parse are skipped.
pub fn request_suggestions(
    backend: &dyn CompletionBackend,
    summary: &Value,
) -> Result<Vec<AiSuggestion>, LlmError> {
    let messages = prompts::suggestion_messages(summary);
    let reply = backend.chat(&messages)?;
    let json = validation::extract_json(&reply)?;

    let list = match &json {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get("suggestions") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(LlmError::InvalidJson("no suggestions array".to_string())),
        },
        _ => return Err(LlmError::InvalidJson("unexpected JSON shape".to_string())),
    };

    Ok(list
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<AiSuggestion>(item) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable AI suggestion");
                None
            }
        })
        .take(5)
        .collect())
}

// ---------------------------------------------------------------------------
// Personalized recommendations
// ---------------------------------------------------------------------------

/// Ask for recommendations tailored to `use_case` and `depth`. A reply that
/// is not JSON is read as a bulleted list. At most five are returned.
pub fn request_recommendations(
    backend: &dyn CompletionBackend,
    use_case: &str,
    depth: &str,
    overall_score: u32,
    strengths: &[String],
    weaknesses: &[String],
) -> Result<Vec<String>, LlmError> {
    let messages =
        prompts::recommendation_messages(use_case, depth, overall_score, strengths, weaknesses);
    let reply = backend.chat(&messages)?;

    let mut list = match validation::extract_json(&reply) {
        Ok(json) => validation::string_list(&json, "recommendations"),
        Err(LlmError::InvalidJson(_)) => validation::bullet_lines(&reply),
        Err(e) => return Err(e),
    };
    if list.is_empty() {
        return Err(LlmError::InvalidJson("no recommendations".to_string()));
    }
    list.truncate(5);
    Ok(list)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
