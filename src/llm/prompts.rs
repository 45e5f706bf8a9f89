//! Prompt templates for AI analysis and suggestion requests.
//!
//! Each request is a system message (role, scoring rubric, output contract)
//! plus a user message carrying the payload. Both ask for a single JSON
//! object so the reply can go straight through [`super::validation`].

use serde_json::Value;

use super::ChatMessage;

/// Upper bound on prompt text forwarded to the model, in characters.
const MAX_PROMPT_CHARS: usize = 12_000;

const ANALYSIS_SYSTEM_PROMPT: &str = "\
You are an expert prompt engineer. Evaluate the quality of the prompt the user sends.

Score each dimension from 0 to 100:
1. semantic_clarity: is the meaning explicit and unambiguous?
2. structural_integrity: is the prompt well organized and complete?
3. logical_coherence: do the instructions follow each other logically?
4. specificity: are requirements concrete rather than vague?
5. instruction_clarity: is the expected output and behavior clear?
6. context_completeness: is there enough background information?

Reply with one JSON object and nothing else:
{\"scores\": {\"semantic_clarity\": 0, \"structural_integrity\": 0, \"logical_coherence\": 0, \
\"specificity\": 0, \"instruction_clarity\": 0, \"context_completeness\": 0}, \
\"strengths\": [\"...\"], \"weaknesses\": [\"...\"], \"suggestions\": [\"...\"]}";

const SUGGESTION_SYSTEM_PROMPT: &str = "\
You are an expert prompt engineer. Given an analysis of a prompt, propose concrete, actionable improvements.

For each suggestion provide:
- type: one of clarity, structure, specificity, context, format, role, examples, constraints
- priority: 1 (critical) to 5 (optional)
- impact: high, medium or low
- title and description
- improvement_plan: numbered steps
- expected_improvement: object mapping dimension names to expected score gains
- examples: list of before/after snippets
- reasoning
- confidence: 0 to 1

Reply with one JSON object and nothing else: {\"suggestions\": [ ... ]} containing 3 to 5 suggestions.";

const RECOMMENDATION_SYSTEM_PROMPT: &str = "\
You are an expert prompt engineer who tailors advice to the person asking. \
Given their preferences and a short analysis of their prompt, give 3 to 5 \
personal, practical recommendations that fit their use case.

Reply with one JSON object and nothing else: {\"recommendations\": [\"...\"]}";

/// Messages for scoring `text`.
pub fn analysis_messages(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Analyze the following prompt:\n\n{}",
            clip(text, MAX_PROMPT_CHARS)
        )),
    ]
}

/// Messages for generating suggestions from an analysis summary.
pub fn suggestion_messages(summary: &Value) -> Vec<ChatMessage> {
    let rendered = serde_json::to_string_pretty(summary).unwrap_or_else(|_| summary.to_string());
    vec![
        ChatMessage::system(SUGGESTION_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Generate optimization suggestions for this analysis result:\n\n{rendered}"
        )),
    ]
}

/// Messages asking for recommendations tailored to the user's preferences.
pub fn recommendation_messages(
    use_case: &str,
    depth: &str,
    overall_score: u32,
    strengths: &[String],
    weaknesses: &[String],
) -> Vec<ChatMessage> {
    let top = |items: &[String]| items.iter().take(3).cloned().collect::<Vec<_>>().join("; ");
    vec![
        ChatMessage::system(RECOMMENDATION_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "User preferences:\n- use case: {use_case}\n- analysis depth: {depth}\n\n\
             Current prompt analysis:\n- overall score: {overall_score}/100\n\
             - main strengths: {}\n- main weaknesses: {}",
            top(strengths),
            top(weaknesses),
        )),
    ]
}

/// Keep at most `max` characters, respecting char boundaries.
fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analysis_messages_are_system_then_user() {
        let msgs = analysis_messages("Summarize this article");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert!(msgs[0].content.contains("semantic_clarity"));
        assert_eq!(msgs[1].role, "user");
        assert!(msgs[1].content.ends_with("Summarize this article"));
    }

    #[test]
    fn suggestion_messages_embed_summary() {
        let msgs = suggestion_messages(&json!({"overall_score": 42}));
        assert!(msgs[0].content.contains("improvement_plan"));
        assert!(msgs[1].content.contains("\"overall_score\": 42"));
    }

    #[test]
    fn recommendation_messages_carry_preferences() {
        let weaknesses: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let msgs = recommendation_messages("customer support", "deep", 61, &[], &weaknesses);
        assert!(msgs[0].content.contains("recommendations"));
        assert!(msgs[1].content.contains("use case: customer support"));
        assert!(msgs[1].content.contains("61/100"));
        assert!(msgs[1].content.contains("a; b; c"));
        assert!(!msgs[1].content.contains("; d"));
    }

    #[test]
    fn long_prompts_are_clipped() {
        let text = "é".repeat(MAX_PROMPT_CHARS + 10);
        let msgs = analysis_messages(&text);
        let payload = msgs[1].content.split("\n\n").nth(1).unwrap();
        assert_eq!(payload.chars().count(), MAX_PROMPT_CHARS);
    }

    #[test]
    fn clip_short_text_is_untouched() {
        assert_eq!(clip("abc", 10), "abc");
        assert_eq!(clip("abcdef", 3), "abc");
    }
}
