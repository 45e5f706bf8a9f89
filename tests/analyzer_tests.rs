//! End-to-end analyzer and optimizer behavior, with a scripted backend
//! standing in for the LLM.

use std::sync::Mutex;

use enhance::analyzer::{PromptAnalyzer, RULE_BASED};
use enhance::error::LlmError;
use enhance::llm::{ChatMessage, CompletionBackend};
use enhance::optimizer::{Optimizer, Priority};

const STRUCTURED: &str = "You are a senior technical editor.\n\
Summarize the attached release notes in exactly 3 bullet points.\n\
Each bullet must be under 20 words.\n\
Output format: JSON array of strings, for example [\"Faster builds\"].";

const VAGUE: &str = "make some good stuff";

/// Replies with queued answers in order, then errors.
struct Scripted {
    replies: Mutex<Vec<String>>,
    healthy: bool,
}

impl Scripted {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            healthy: true,
        }
    }

    fn unhealthy() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            healthy: false,
        }
    }
}

impl CompletionBackend for Scripted {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        assert_eq!(messages[0].role, "system");
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| LlmError::Request("script exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted-7b"
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}

#[test]
fn rule_based_scores_stay_in_range() {
    let analyzer = PromptAnalyzer::new();
    for text in [STRUCTURED, VAGUE, "写一首关于秋天的诗。要求：必须押韵。", "?"] {
        let analysis = analyzer.analyze(text, true);
        assert_eq!(analysis.model_used, RULE_BASED);
        assert!(analysis.metrics.overall_score <= 100);
        for (name, score) in analysis.metrics.dimensions() {
            assert!(score <= 100, "{name} = {score} for {text:?}");
        }
    }
}

#[test]
fn structure_and_instructions_are_rewarded() {
    let analyzer = PromptAnalyzer::new();
    let good = analyzer.analyze(STRUCTURED, false);
    let weak = analyzer.analyze(VAGUE, false);

    assert!(good.basic_metrics.has_role);
    assert!(good.metrics.structural_integrity > weak.metrics.structural_integrity);
    assert!(good.metrics.instruction_clarity > weak.metrics.instruction_clarity);
    assert!(good.metrics.specificity_score > weak.metrics.specificity_score);
    assert!(good.token_count > weak.token_count);
}

#[test]
fn ai_scores_override_rule_scores() {
    let reply = r#"Here you go:
```json
{"scores": {"semantic_clarity": 91, "structural_integrity": 88, "logical_coherence": 140,
            "specificity": 77, "instruction_clarity": 95, "context_completeness": 64},
 "strengths": ["Clear role"], "weaknesses": [], "suggestions": ["Name the audience"]}
```"#;
    let analyzer = PromptAnalyzer::with_backend(Some(Box::new(Scripted::new(&[reply]))));
    let analysis = analyzer.analyze(STRUCTURED, true);

    assert_eq!(analysis.model_used, "scripted-7b");
    let m = &analysis.metrics;
    assert_eq!(m.semantic_clarity, 91);
    assert_eq!(m.logical_coherence, 100);
    assert_eq!(m.specificity_score, 77);
    assert_eq!(m.overall_score, (91 + 88 + 100 + 77 + 95 + 64) / 6);
    assert_eq!(analysis.strengths, vec!["Clear role"]);
    assert_eq!(analysis.suggestions, vec!["Name the audience"]);
}

#[test]
fn ai_is_skipped_when_not_requested_or_unhealthy() {
    let analyzer = PromptAnalyzer::with_backend(Some(Box::new(Scripted::new(&["{}"]))));
    assert_eq!(analyzer.analyze(VAGUE, false).model_used, RULE_BASED);

    let down = PromptAnalyzer::with_backend(Some(Box::new(Scripted::unhealthy())));
    assert_eq!(down.analyze(VAGUE, true).model_used, RULE_BASED);
}

#[test]
fn malformed_ai_reply_falls_back() {
    let analyzer = PromptAnalyzer::with_backend(Some(Box::new(Scripted::new(&["I cannot help"]))));
    let with_ai = analyzer.analyze(VAGUE, true);
    let without = PromptAnalyzer::new().analyze(VAGUE, false);

    assert_eq!(with_ai.model_used, RULE_BASED);
    assert_eq!(with_ai.metrics, without.metrics);
}

#[test]
fn optimizer_merges_ai_suggestions() {
    let suggestions = r#"{"suggestions": [
        {"type": "role", "priority": 1, "impact": "high", "title": "Assign an expert role",
         "description": "Open with who the model should be.",
         "expected_improvement": {"overall_score": 12}, "confidence": 0.99},
        {"title": "Bad entry", "priority": "urgent"}
    ]}"#;
    let backend = Scripted::new(&[suggestions]);
    let backend: &dyn CompletionBackend = &backend;

    let analysis = PromptAnalyzer::new().analyze(VAGUE, false);
    let result = Optimizer::new(Some(backend), 10).optimize(analysis, true);

    assert_eq!(result.model_used, "scripted-7b");
    let first = &result.suggestions[0];
    assert_eq!(first.title, "Assign an expert role");
    assert_eq!(first.priority, Priority::Critical);
    assert!(result.suggestions.iter().all(|s| s.title != "Bad entry"));
    assert!(result.roadmap.immediate.contains(&"Assign an expert role".to_string()));
    assert!(result.estimated_score_improvement >= 12);
    assert!(result.estimated_score_improvement <= 30);
}

#[test]
fn optimizer_without_backend_is_rule_based() {
    let analysis = PromptAnalyzer::new().analyze(VAGUE, false);
    let result = Optimizer::new(None, 3).optimize(analysis, true);

    assert_eq!(result.model_used, RULE_BASED);
    assert!(!result.suggestions.is_empty());
    assert!(result.suggestions.len() <= 3);
    let levels: Vec<u8> = result.suggestions.iter().map(|s| s.priority.level()).collect();
    let mut sorted = levels.clone();
    sorted.sort();
    assert_eq!(levels, sorted);
}
