//! Text statistics and rule-based dimension scores.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::lexicon::{self, contains_any, count_matches};

/// Number of keywords kept in [`BasicMetrics::word_frequency`].
const TOP_KEYWORDS: usize = 10;

// ---------------------------------------------------------------------------
// Basic metrics
// ---------------------------------------------------------------------------

/// Structural features detected in the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralElements {
    pub has_questions: bool,
    pub has_examples: bool,
    pub has_constraints: bool,
    pub has_format_specification: bool,
}

impl StructuralElements {
    fn count(&self) -> u32 {
        [
            self.has_questions,
            self.has_examples,
            self.has_constraints,
            self.has_format_specification,
        ]
        .into_iter()
        .filter(|&b| b)
        .count() as u32
    }
}

/// Raw statistics for a prompt, independent of any scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub word_count: usize,
    pub char_count: usize,
    pub sentence_count: usize,
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
    pub readability_score: u32,
    /// Most frequent non-stopword words, most frequent first.
    pub word_frequency: Vec<(String, usize)>,
    pub structural_elements: StructuralElements,
    pub has_role: bool,
}

pub fn basic_metrics(text: &str) -> BasicMetrics {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    let sentence_count = sentence_count(text);

    let avg_word_length = if word_count == 0 {
        0.0
    } else {
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count as f64
    };
    let avg_sentence_length = word_count as f64 / sentence_count.max(1) as f64;

    let lower = text.to_lowercase();
    let structural_elements = StructuralElements {
        has_questions: text.contains(['?', '？']),
        has_examples: contains_any(&lower, lexicon::EXAMPLE_MARKERS),
        has_constraints: contains_any(&lower, lexicon::CONSTRAINT_MARKERS),
        has_format_specification: contains_any(&lower, lexicon::FORMAT_MARKERS),
    };

    BasicMetrics {
        word_count,
        char_count: text.chars().count(),
        sentence_count,
        avg_word_length: round2(avg_word_length),
        avg_sentence_length: round2(avg_sentence_length),
        readability_score: readability(word_count, sentence_count, avg_word_length, avg_sentence_length),
        word_frequency: word_frequency(&lower),
        structural_elements,
        has_role: contains_any(&lower, lexicon::ROLE_INDICATORS),
    }
}

/// Count non-empty segments between sentence terminators.
pub fn sentence_count(text: &str) -> usize {
    text.split(lexicon::SENTENCE_TERMINATORS)
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Simplified Flesch reading ease, clamped to `0..=100`. Returns 50 when
/// there is nothing to measure.
///
/// The word-length term is scaled by `100 / words`, so long prompts are
/// penalised less for long words than short ones.
pub fn readability(
    word_count: usize,
    sentence_count: usize,
    avg_word_length: f64,
    avg_sentence_length: f64,
) -> u32 {
    if word_count == 0 || sentence_count == 0 {
        return 50;
    }
    let raw = 206.835
        - 1.015 * avg_sentence_length
        - 84.6 * avg_word_length / word_count as f64 * 100.0;
    raw.clamp(0.0, 100.0).round() as u32
}

fn word_frequency(lower: &str) -> Vec<(String, usize)> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for word in lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty() && !lexicon::is_stopword(w))
    {
        *freq.entry(word).or_default() += 1;
    }

    let mut sorted: Vec<(String, usize)> = freq
        .into_iter()
        .map(|(w, c)| (w.to_string(), c))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(TOP_KEYWORDS);
    sorted
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn clamp(score: i64) -> u32 {
    score.clamp(0, 100) as u32
}

// ---------------------------------------------------------------------------
// Dimension scores
// ---------------------------------------------------------------------------

/// Concrete wording raises the score, vague wording lowers it.
pub fn specificity_score(text: &str) -> u32 {
    let lower = text.to_lowercase();
    let vague = count_matches(&lower, lexicon::VAGUE_WORDS) as i64;
    let specific = count_matches(&lower, lexicon::SPECIFIC_INDICATORS) as i64;

    let mut score = 50 + specific * 10 - vague * 5;
    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 10;
    }
    if text.contains(['"', '\'']) {
        score += 5;
    }
    if text.contains(['[', '(']) {
        score += 5;
    }
    clamp(score)
}

pub fn instruction_clarity(text: &str) -> u32 {
    let lower = text.to_lowercase();
    let verbs = count_matches(&lower, lexicon::INSTRUCTION_VERBS) as i64;

    let mut score = 40 + verbs * 8;
    if contains_any(&lower, lexicon::ROLE_INDICATORS) {
        score += 15;
    }
    if contains_any(&lower, lexicon::OUTPUT_INDICATORS) {
        score += 15;
    }
    clamp(score)
}

pub fn semantic_clarity(basic: &BasicMetrics) -> u32 {
    let bonus = if basic.structural_elements.has_examples { 10 } else { 0 };
    clamp(i64::from(basic.readability_score) + bonus)
}

pub fn structural_integrity(basic: &BasicMetrics) -> u32 {
    clamp(60 + 10 * i64::from(basic.structural_elements.count()))
}

pub fn logical_coherence(basic: &BasicMetrics) -> u32 {
    clamp(70 + 2 * basic.sentence_count as i64)
}

pub fn context_completeness(basic: &BasicMetrics) -> u32 {
    clamp(50 + (basic.word_count / 10) as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
