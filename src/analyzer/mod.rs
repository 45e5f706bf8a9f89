//! Multi-dimensional prompt analysis.
//!
//! Six dimensions are scored by rule from plain text statistics. When an AI
//! backend is supplied and healthy, its scores and feedback take precedence
//! dimension by dimension; any backend failure leaves the rule-based result
//! untouched.

use std::time::Instant;

use serde::{Deserialize, Serialize};

pub mod lexicon;
pub mod metrics;

use crate::config::EnhanceConfig;
use crate::llm::{self, AiAnalysis, CompletionBackend};
use crate::utils::token_counter;
use metrics::BasicMetrics;

/// `model_used` value when no AI result was merged.
pub const RULE_BASED: &str = "rule-based";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Dimension scores, each 0-100 except `complexity_score`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub overall_score: u32,
    pub semantic_clarity: u32,
    pub structural_integrity: u32,
    pub logical_coherence: u32,
    pub specificity_score: u32,
    /// Average sentence length in words.
    pub complexity_score: f64,
    pub readability_score: u32,
    pub instruction_clarity: u32,
    pub context_completeness: u32,
}

impl AnalysisMetrics {
    /// Mean of the six scored dimensions, truncated.
    fn compute_overall(&mut self) {
        let sum = self.semantic_clarity
            + self.structural_integrity
            + self.logical_coherence
            + self.specificity_score
            + self.instruction_clarity
            + self.context_completeness;
        self.overall_score = sum / 6;
    }

    /// `(field name, value)` for each scored dimension, in display order.
    pub fn dimensions(&self) -> [(&'static str, u32); 6] {
        [
            ("semantic_clarity", self.semantic_clarity),
            ("structural_integrity", self.structural_integrity),
            ("logical_coherence", self.logical_coherence),
            ("specificity_score", self.specificity_score),
            ("instruction_clarity", self.instruction_clarity),
            ("context_completeness", self.context_completeness),
        ]
    }
}

/// Complete result of analyzing one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    pub metrics: AnalysisMetrics,
    pub basic_metrics: BasicMetrics,
    pub token_count: usize,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
    pub processing_ms: u64,
    pub model_used: String,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Scores prompts. Holds an optional AI backend.
#[derive(Default)]
pub struct PromptAnalyzer {
    backend: Option<Box<dyn CompletionBackend>>,
}

impl PromptAnalyzer {
    /// Rule-based analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Option<Box<dyn CompletionBackend>>) -> Self {
        Self { backend }
    }

    /// Analyzer wired to the configured LLM backend, if `[llm] enabled`.
    pub fn from_config(config: &EnhanceConfig) -> Self {
        Self::with_backend(llm::backend_from_config(&config.llm))
    }

    pub fn backend(&self) -> Option<&dyn CompletionBackend> {
        self.backend.as_deref()
    }

    /// Analyze `text`. With `use_ai` set, the backend (if any, and if
    /// healthy) is consulted and its output merged.
    pub fn analyze(&self, text: &str, use_ai: bool) -> DetailedAnalysis {
        let start = Instant::now();

        let basic = metrics::basic_metrics(text);
        let mut scores = rule_scores(text, &basic);

        let ai = if use_ai { self.ai_analysis(text) } else { None };

        let mut model_used = RULE_BASED.to_string();
        let mut ai_feedback = AiAnalysis::default();
        if let Some((model, ai)) = ai {
            merge_scores(&mut scores, &ai);
            model_used = model;
            ai_feedback = ai;
        }
        scores.compute_overall();

        let strengths = non_empty_or(ai_feedback.strengths, || rule_strengths(&basic, &scores));
        let weaknesses = non_empty_or(ai_feedback.weaknesses, || rule_weaknesses(&basic, &scores));
        let suggestions =
            non_empty_or(ai_feedback.suggestions, || rule_suggestions(&basic, &scores));

        let analysis = DetailedAnalysis {
            metrics: scores,
            token_count: token_counter::estimate_tokens(text),
            basic_metrics: basic,
            strengths,
            weaknesses,
            suggestions,
            processing_ms: start.elapsed().as_millis() as u64,
            model_used,
        };

        tracing::debug!(
            overall = analysis.metrics.overall_score,
            model = %analysis.model_used,
            ms = analysis.processing_ms,
            "prompt analyzed"
        );
        analysis
    }

    fn ai_analysis(&self, text: &str) -> Option<(String, AiAnalysis)> {
        let backend = self.backend.as_deref()?;
        if !backend.is_healthy() {
            tracing::warn!(model = backend.model_name(), "AI backend unavailable, using rule-based analysis");
            return None;
        }
        match llm::request_analysis(backend, text) {
            Ok(ai) => Some((backend.model_name().to_string(), ai)),
            Err(e) => {
                tracing::warn!(error = %e, "AI analysis failed, using rule-based analysis");
                None
            }
        }
    }
}

fn rule_scores(text: &str, basic: &BasicMetrics) -> AnalysisMetrics {
    AnalysisMetrics {
        overall_score: 0,
        semantic_clarity: metrics::semantic_clarity(basic),
        structural_integrity: metrics::structural_integrity(basic),
        logical_coherence: metrics::logical_coherence(basic),
        specificity_score: metrics::specificity_score(text),
        complexity_score: basic.avg_sentence_length,
        readability_score: basic.readability_score,
        instruction_clarity: metrics::instruction_clarity(text),
        context_completeness: metrics::context_completeness(basic),
    }
}

fn merge_scores(scores: &mut AnalysisMetrics, ai: &AiAnalysis) {
    let s = &ai.scores;
    let pairs = [
        (&mut scores.semantic_clarity, s.semantic_clarity),
        (&mut scores.structural_integrity, s.structural_integrity),
        (&mut scores.logical_coherence, s.logical_coherence),
        (&mut scores.specificity_score, s.specificity_score),
        (&mut scores.instruction_clarity, s.instruction_clarity),
        (&mut scores.context_completeness, s.context_completeness),
    ];
    for (slot, value) in pairs {
        if let Some(v) = value {
            *slot = v;
        }
    }
}

fn non_empty_or(list: Vec<String>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if list.is_empty() { fallback() } else { list }
}

// ---------------------------------------------------------------------------
// Rule-based feedback
// ---------------------------------------------------------------------------

fn rule_strengths(basic: &BasicMetrics, m: &AnalysisMetrics) -> Vec<String> {
    let se = &basic.structural_elements;
    let mut out = Vec::new();
    if m.readability_score > 70 {
        out.push("Readable and easy to follow".to_string());
    }
    if se.has_examples {
        out.push("Includes examples that show the expected output".to_string());
    }
    if se.has_constraints {
        out.push("States explicit constraints".to_string());
    }
    if m.specificity_score > 70 {
        out.push("Concrete wording without vague terms".to_string());
    }
    if basic.word_count > 50 {
        out.push("Provides ample context".to_string());
    }
    out
}

fn rule_weaknesses(basic: &BasicMetrics, m: &AnalysisMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if m.readability_score < 50 {
        out.push("Hard to read; may be misunderstood".to_string());
    }
    if !basic.structural_elements.has_examples {
        out.push("No examples; output may not match expectations".to_string());
    }
    if m.specificity_score < 50 {
        out.push("Instructions are too vague".to_string());
    }
    if basic.word_count < 20 {
        out.push("Too little context for a high-quality answer".to_string());
    }
    if m.instruction_clarity < 60 {
        out.push("Expected behavior is unclear".to_string());
    }
    out
}

fn rule_suggestions(basic: &BasicMetrics, m: &AnalysisMetrics) -> Vec<String> {
    let se = &basic.structural_elements;
    let mut out = Vec::new();
    if m.specificity_score < 70 {
        out.push("Replace vague words like \"some\" or \"many\" with concrete quantities".to_string());
    }
    if !se.has_examples {
        out.push("Add a concrete example of the expected output".to_string());
    }
    if m.instruction_clarity < 70 {
        out.push("State the role the model should play and the task to perform".to_string());
    }
    if !se.has_format_specification {
        out.push("Specify the output format (JSON, list, paragraphs, ...)".to_string());
    }
    if basic.sentence_count == 1 {
        out.push("Split long sentences into shorter ones".to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::ChatMessage;

    struct FixedBackend {
        reply: Result<&'static str, ()>,
        healthy: bool,
    }

    impl CompletionBackend for FixedBackend {
        fn chat(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.reply
                .map(str::to_string)
                .map_err(|_| LlmError::Request("connection refused".to_string()))
        }
        fn model_name(&self) -> &str {
            "test-model"
        }
        fn is_healthy(&self) -> bool {
            self.healthy
        }
    }

    fn analyzer(reply: Result<&'static str, ()>, healthy: bool) -> PromptAnalyzer {
        PromptAnalyzer::with_backend(Some(Box::new(FixedBackend { reply, healthy })))
    }

    const PROMPT: &str = "You are a travel writer. Write exactly 3 tips for visiting Kyoto in spring. \
                          Use a numbered list format.";

    #[test]
    fn overall_is_truncated_mean() {
        let a = PromptAnalyzer::new().analyze(PROMPT, false);
        let sum: u32 = a.metrics.dimensions().iter().map(|(_, v)| v).sum();
        assert_eq!(a.metrics.overall_score, sum / 6);
        assert_eq!(a.model_used, RULE_BASED);
        assert!(a.token_count > 0);
    }

    #[test]
    fn rule_feedback_is_generated() {
        let a = PromptAnalyzer::new().analyze("make it good", false);
        assert!(a.weaknesses.iter().any(|w| w.contains("No examples")));
        assert!(a.suggestions.iter().any(|s| s.contains("output format")));
    }

    #[test]
    fn ai_scores_override_rule_scores() {
        let reply = r#"{"scores":{"semantic_clarity":91,"context_completeness":12},"strengths":["Sharp"],"weaknesses":[],"suggestions":[]}"#;
        let rule = PromptAnalyzer::new().analyze(PROMPT, false);
        let a = analyzer(Ok(reply), true).analyze(PROMPT, true);

        assert_eq!(a.model_used, "test-model");
        assert_eq!(a.metrics.semantic_clarity, 91);
        assert_eq!(a.metrics.context_completeness, 12);
        assert_eq!(a.metrics.structural_integrity, rule.metrics.structural_integrity);
        assert_eq!(a.strengths, vec!["Sharp"]);
        // Empty AI list falls back to rules.
        assert_eq!(a.weaknesses, rule.weaknesses);
    }

    #[test]
    fn ai_failure_falls_back_to_rules() {
        let rule = PromptAnalyzer::new().analyze(PROMPT, false);

        let a = analyzer(Err(()), true).analyze(PROMPT, true);
        assert_eq!(a.model_used, RULE_BASED);
        assert_eq!(a.metrics, rule.metrics);

        let a = analyzer(Ok("not json"), true).analyze(PROMPT, true);
        assert_eq!(a.model_used, RULE_BASED);

        let a = analyzer(Ok("{}"), false).analyze(PROMPT, true);
        assert_eq!(a.model_used, RULE_BASED);
    }

    #[test]
    fn ai_is_skipped_when_not_requested() {
        let a = analyzer(Ok(r#"{"scores":{"semantic_clarity":1}}"#), true).analyze(PROMPT, false);
        assert_eq!(a.model_used, RULE_BASED);
        assert_ne!(a.metrics.semantic_clarity, 1);
    }
}
