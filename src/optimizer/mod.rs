//! Optimization suggestions and improvement roadmap.
//!
//! Works from a finished [`DetailedAnalysis`]: weak dimensions map to
//! canned rule suggestions, an optional AI backend adds its own, and the
//! merged list is deduplicated, prioritised, and grouped into a roadmap.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analyzer::{DetailedAnalysis, RULE_BASED};
use crate::config::schema::AnalysisConfig;
use crate::llm::{self, AiSuggestion, CompletionBackend};

/// Dimensions below this score count as weak.
const WEAK_THRESHOLD: u32 = 70;

/// Dimensions below this score are critical.
const CRITICAL_THRESHOLD: u32 = 50;

/// Cap on rule suggestions before merging.
const MAX_RULE_SUGGESTIONS: usize = 5;

/// Cap on the estimated overall gain.
const MAX_ESTIMATED_GAIN: i64 = 30;

/// Shown when personalized recommendations were asked for but the model
/// could not produce them.
const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Adjust the prompt's tone and format to your use case",
    "Write instructions that play to the strengths of the model you deploy with",
    "Track scores over time and keep the changes that raise them",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Clarity,
    Structure,
    Specificity,
    Context,
    Format,
    Role,
    Examples,
    Constraints,
}

impl SuggestionType {
    /// Lenient parse; unknown kinds become `Clarity`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "structure" => Self::Structure,
            "specificity" => Self::Specificity,
            "context" => Self::Context,
            "format" => Self::Format,
            "role" => Self::Role,
            "examples" => Self::Examples,
            "constraints" => Self::Constraints,
            _ => Self::Clarity,
        }
    }
}

/// 1 is most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
    Optional = 5,
}

impl Priority {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Out-of-range levels clamp to the nearest end.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Critical,
            2 => Self::High,
            3 => Self::Medium,
            4 => Self::Low,
            _ => Self::Optional,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub priority: Priority,
    pub impact: Impact,
    pub title: String,
    pub description: String,
    pub improvement_plan: String,
    /// Expected score gain per dimension (including `overall_score`).
    pub expected_improvement: BTreeMap<String, i64>,
    pub examples: Vec<String>,
    pub reasoning: String,
    /// 0.0 to 1.0.
    pub confidence: f64,
}

/// A dimension scoring under the weak threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Weakness {
    pub dimension: &'static str,
    /// 1 when critical, 2 otherwise.
    pub severity: u8,
    pub description: &'static str,
}

/// Suggestion titles grouped by urgency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    /// Priority 1-2.
    pub immediate: Vec<String>,
    /// Priority 3.
    pub short_term: Vec<String>,
    /// Priority 4-5.
    pub long_term: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub analysis: DetailedAnalysis,
    pub suggestions: Vec<OptimizationSuggestion>,
    pub roadmap: Roadmap,
    pub estimated_score_improvement: i64,
    pub processing_ms: u64,
    pub model_used: String,
    /// AI recommendations tailored to the configured use case.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personalized_recommendations: Vec<String>,
}

/// How the user works with prompts, for personalized recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub use_case: String,
    pub analysis_depth: String,
}

impl Preferences {
    /// `None` when no use case is configured.
    pub fn from_config(config: &AnalysisConfig) -> Option<Self> {
        let use_case = config.use_case.trim();
        if use_case.is_empty() {
            return None;
        }
        Some(Self {
            use_case: use_case.to_string(),
            analysis_depth: config.analysis_depth.trim().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Weakness detection
// ---------------------------------------------------------------------------

/// Weak dimensions, most severe first. Ties keep dimension order.
pub fn weaknesses(analysis: &DetailedAnalysis) -> Vec<Weakness> {
    let mut out: Vec<Weakness> = analysis
        .metrics
        .dimensions()
        .into_iter()
        .filter(|&(_, score)| score < WEAK_THRESHOLD)
        .map(|(dimension, score)| Weakness {
            dimension,
            severity: if score < CRITICAL_THRESHOLD { 1 } else { 2 },
            description: describe(dimension),
        })
        .collect();
    out.sort_by_key(|w| w.severity);
    out
}

fn describe(dimension: &str) -> &'static str {
    match dimension {
        "semantic_clarity" => "Meaning is not expressed clearly",
        "structural_integrity" => "Organization needs work",
        "logical_coherence" => "Logical flow could be tighter",
        "specificity_score" => "Instructions are not specific enough",
        "instruction_clarity" => "Instructions need to be clearer",
        _ => "Context is incomplete",
    }
}

// ---------------------------------------------------------------------------
// Rule suggestions
// ---------------------------------------------------------------------------

fn gains(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Suggestions derived from weak dimensions and missing structure, capped
/// at five.
pub fn rule_suggestions(analysis: &DetailedAnalysis) -> Vec<OptimizationSuggestion> {
    let mut out = Vec::new();
    let mut next_id = 0;
    let mut id = || {
        next_id += 1;
        format!("rule_{next_id}")
    };

    for weakness in weaknesses(analysis) {
        let suggestion = match weakness.dimension {
            "semantic_clarity" => OptimizationSuggestion {
                id: id(),
                kind: SuggestionType::Clarity,
                priority: if weakness.severity == 1 { Priority::Critical } else { Priority::High },
                impact: Impact::High,
                title: "Improve semantic clarity".to_string(),
                description: "Use precise, concrete wording and avoid vague expressions".to_string(),
                improvement_plan: "1. Replace vague words (\"some\", \"many\") with exact quantities\n\
                                   2. Prefer domain terms over generic words\n\
                                   3. State the expected output type and format"
                    .to_string(),
                expected_improvement: gains(&[("semantic_clarity", 15), ("overall_score", 8)]),
                examples: strings(&[
                    "Vague: 'Write something about AI'",
                    "Clear: 'Write 3 concrete case studies of AI in healthcare, 200 words each'",
                ]),
                reasoning: "Unclear wording leads the model to guess at intent".to_string(),
                confidence: 0.9,
            },
            "structural_integrity" => OptimizationSuggestion {
                id: id(),
                kind: SuggestionType::Structure,
                priority: Priority::High,
                impact: Impact::Medium,
                title: "Reorganize the structure".to_string(),
                description: "Improve how information and requirements are laid out".to_string(),
                improvement_plan: "1. Number or bullet the requirements\n\
                                   2. Order information logically\n\
                                   3. Separate background from instructions"
                    .to_string(),
                expected_improvement: gains(&[("structural_integrity", 20), ("logical_coherence", 10)]),
                examples: strings(&[
                    "Before: one long mixed paragraph",
                    "After: 1. Background 2. Task 3. Requirements 4. Output format",
                ]),
                reasoning: "Clear structure shows the model what matters most".to_string(),
                confidence: 0.85,
            },
            "specificity_score" => OptimizationSuggestion {
                id: id(),
                kind: SuggestionType::Specificity,
                priority: Priority::Critical,
                impact: Impact::High,
                title: "Make instructions more specific".to_string(),
                description: "Give concrete, measurable requirements".to_string(),
                improvement_plan: "1. Specify counts, length and format\n\
                                   2. Define quality criteria\n\
                                   3. State constraints and limits"
                    .to_string(),
                expected_improvement: gains(&[("specificity_score", 25), ("instruction_clarity", 15)]),
                examples: strings(&[
                    "Vague: 'Make it better'",
                    "Specific: 'Use technical terms, stay under 500 words, cover 3 key points'",
                ]),
                reasoning: "Specific instructions markedly improve accuracy and relevance".to_string(),
                confidence: 0.95,
            },
            "context_completeness" => OptimizationSuggestion {
                id: id(),
                kind: SuggestionType::Context,
                priority: Priority::Medium,
                impact: Impact::Medium,
                title: "Add background context".to_string(),
                description: "Provide the background and purpose of the task".to_string(),
                improvement_plan: "1. Explain the task's goal\n\
                                   2. Name the audience and use case\n\
                                   3. Include relevant reference material"
                    .to_string(),
                expected_improvement: gains(&[("context_completeness", 20), ("overall_score", 10)]),
                examples: strings(&[
                    "Missing context: 'Translate this text'",
                    "With context: 'Translate this for technical docs read by Chinese software engineers'",
                ]),
                reasoning: "Context lets the model tailor its answer".to_string(),
                confidence: 0.8,
            },
            _ => continue,
        };
        out.push(suggestion);
    }

    let basic = &analysis.basic_metrics;
    if !basic.structural_elements.has_examples {
        out.push(OptimizationSuggestion {
            id: id(),
            kind: SuggestionType::Examples,
            priority: Priority::Medium,
            impact: Impact::Medium,
            title: "Add examples".to_string(),
            description: "Show a concrete example of the expected output".to_string(),
            improvement_plan: "1. Add one or two sample outputs\n\
                               2. Show the desired format and tone\n\
                               3. Point out what makes the sample good"
                .to_string(),
            expected_improvement: gains(&[("instruction_clarity", 15), ("overall_score", 8)]),
            examples: strings(&["Example: 'Title: The Future of AI\\nBody: Artificial intelligence is...'"]),
            reasoning: "Examples make the target output unambiguous".to_string(),
            confidence: 0.75,
        });
    }

    if !basic.has_role {
        out.push(OptimizationSuggestion {
            id: id(),
            kind: SuggestionType::Role,
            priority: Priority::Low,
            impact: Impact::Medium,
            title: "Define a role".to_string(),
            description: "Tell the model which expert persona to adopt".to_string(),
            improvement_plan: "1. Open with the role\n\
                               2. Give relevant expertise\n\
                               3. State the role's scope and limits"
                .to_string(),
            expected_improvement: gains(&[("instruction_clarity", 10), ("context_completeness", 10)]),
            examples: strings(&["Role: 'You are a senior technical writer who simplifies complex ideas'"]),
            reasoning: "A role sets tone and perspective".to_string(),
            confidence: 0.7,
        });
    }

    out.truncate(MAX_RULE_SUGGESTIONS);
    out
}

// ---------------------------------------------------------------------------
// AI suggestions
// ---------------------------------------------------------------------------

fn from_ai(index: usize, s: AiSuggestion) -> OptimizationSuggestion {
    OptimizationSuggestion {
        id: format!("ai_{}", index + 1),
        kind: SuggestionType::parse(&s.kind),
        priority: Priority::from_level(s.priority),
        impact: Impact::parse(&s.impact),
        title: s.title,
        description: s.description,
        improvement_plan: s.improvement_plan,
        expected_improvement: s
            .expected_improvement
            .into_iter()
            .map(|(k, v)| (k, v.round() as i64))
            .collect(),
        examples: s.examples,
        reasoning: s.reasoning,
        confidence: if s.confidence.is_nan() { 0.0 } else { s.confidence.clamp(0.0, 1.0) },
    }
}

fn analysis_summary(analysis: &DetailedAnalysis) -> serde_json::Value {
    let dimensions: BTreeMap<&str, u32> = analysis.metrics.dimensions().into_iter().collect();
    json!({
        "overall_score": analysis.metrics.overall_score,
        "dimensions": dimensions,
        "strengths": analysis.strengths,
        "weaknesses": analysis.weaknesses,
        "basic_metrics": analysis.basic_metrics,
    })
}

// ---------------------------------------------------------------------------
// Merge, roadmap, estimate
// ---------------------------------------------------------------------------

/// Drop later suggestions whose title was already seen, then order by
/// priority and descending confidence.
pub fn merge(suggestions: Vec<OptimizationSuggestion>) -> Vec<OptimizationSuggestion> {
    let mut seen = HashSet::new();
    let mut unique: Vec<OptimizationSuggestion> = suggestions
        .into_iter()
        .filter(|s| seen.insert(s.title.clone()))
        .collect();
    unique.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
    });
    unique
}

pub fn roadmap(suggestions: &[OptimizationSuggestion]) -> Roadmap {
    let mut map = Roadmap::default();
    for s in suggestions {
        let bucket = match s.priority.level() {
            1 | 2 => &mut map.immediate,
            3 => &mut map.short_term,
            _ => &mut map.long_term,
        };
        bucket.push(s.title.clone());
    }
    map
}

/// Sum of expected `overall_score` gains of the top three, capped at 30.
pub fn estimated_improvement(suggestions: &[OptimizationSuggestion]) -> i64 {
    suggestions
        .iter()
        .take(3)
        .filter_map(|s| s.expected_improvement.get("overall_score"))
        .sum::<i64>()
        .min(MAX_ESTIMATED_GAIN)
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Produces an [`OptimizationResult`] from an analysis.
pub struct Optimizer<'a> {
    backend: Option<&'a dyn CompletionBackend>,
    max_suggestions: usize,
    preferences: Option<Preferences>,
}

impl<'a> Optimizer<'a> {
    pub fn new(backend: Option<&'a dyn CompletionBackend>, max_suggestions: usize) -> Self {
        Self {
            backend,
            max_suggestions: max_suggestions.max(1),
            preferences: None,
        }
    }

    /// Ask for personalized recommendations on AI runs.
    pub fn with_preferences(mut self, preferences: Option<Preferences>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn optimize(&self, analysis: DetailedAnalysis, use_ai: bool) -> OptimizationResult {
        let start = Instant::now();

        let mut all = rule_suggestions(&analysis);
        let mut model_used = RULE_BASED.to_string();
        if use_ai && let Some((model, ai)) = self.ai_suggestions(&analysis) {
            all.extend(ai);
            model_used = model;
        }

        let personalized_recommendations = if use_ai {
            self.recommendations(&analysis)
        } else {
            Vec::new()
        };

        let mut suggestions = merge(all);
        let roadmap = roadmap(&suggestions);
        let estimated_score_improvement = estimated_improvement(&suggestions);
        suggestions.truncate(self.max_suggestions);

        tracing::debug!(
            suggestions = suggestions.len(),
            estimated = estimated_score_improvement,
            "optimization complete"
        );

        OptimizationResult {
            analysis,
            suggestions,
            roadmap,
            estimated_score_improvement,
            processing_ms: start.elapsed().as_millis() as u64,
            model_used,
            personalized_recommendations,
        }
    }

    /// Empty without preferences or a backend; the generic fallback when
    /// the backend is down or its reply is unusable.
    fn recommendations(&self, analysis: &DetailedAnalysis) -> Vec<String> {
        let (Some(prefs), Some(backend)) = (&self.preferences, self.backend) else {
            return Vec::new();
        };
        let fallback = || FALLBACK_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect();
        if !backend.is_healthy() {
            return fallback();
        }

        match llm::request_recommendations(
            backend,
            &prefs.use_case,
            &prefs.analysis_depth,
            analysis.metrics.overall_score,
            &analysis.strengths,
            &analysis.weaknesses,
        ) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "personalized recommendations failed, using defaults");
                fallback()
            }
        }
    }

    fn ai_suggestions(&self, analysis: &DetailedAnalysis) -> Option<(String, Vec<OptimizationSuggestion>)> {
        let backend = self.backend?;
        if !backend.is_healthy() {
            tracing::warn!(model = backend.model_name(), "AI backend unavailable, using rule suggestions only");
            return None;
        }
        match llm::request_suggestions(backend, &analysis_summary(analysis)) {
            Ok(list) if !list.is_empty() => Some((
                backend.model_name().to_string(),
                list.into_iter().enumerate().map(|(i, s)| from_ai(i, s)).collect(),
            )),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "AI suggestions failed, using rule suggestions only");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
