//! Keyword lists used by the rule-based scorers.
//!
//! Matching is substring-based on lowercased text, so each entry counts at
//! most once per prompt regardless of how often it appears. English and
//! Chinese entries live side by side.

pub const EXAMPLE_MARKERS: &[&str] = &["example", "for instance", "such as", "例如", "比如"];

pub const CONSTRAINT_MARKERS: &[&str] = &["must", "should", "required", "必须", "应该", "要求"];

pub const FORMAT_MARKERS: &[&str] = &["format", "structure", "json", "xml", "格式", "结构"];

pub const VAGUE_WORDS: &[&str] = &[
    "some", "many", "few", "several", "various", "different", "good", "bad", "nice", "great",
    "一些", "很多", "少数", "各种", "不同", "好的", "坏的", "不错", "很好",
];

pub const SPECIFIC_INDICATORS: &[&str] = &[
    "exactly",
    "precisely",
    "specifically",
    "detailed",
    "step-by-step",
    "format",
    "确切",
    "精确",
    "具体",
    "详细",
    "逐步",
    "格式",
];

pub const INSTRUCTION_VERBS: &[&str] = &[
    "write", "create", "generate", "analyze", "explain", "describe", "list", "compare",
    "summarize", "translate", "convert", "format", "extract", "identify", "写", "创建", "生成",
    "分析", "解释", "描述", "列出", "比较", "总结", "翻译", "转换", "格式化", "提取", "识别",
];

pub const ROLE_INDICATORS: &[&str] = &[
    "you are",
    "act as",
    "pretend to be",
    "imagine you are",
    "as a",
    "你是",
    "扮演",
    "假设你是",
    "作为一个",
];

pub const OUTPUT_INDICATORS: &[&str] = &[
    "output", "result", "response", "answer", "format", "structure", "输出", "结果", "回答",
    "格式", "结构",
];

/// Sentence terminators, ASCII and full-width.
pub const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// English stopwords excluded from keyword frequency.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Number of `markers` contained in `lower`.
pub fn count_matches(lower: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| lower.contains(*m)).count()
}

pub fn contains_any(lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| lower.contains(m))
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}
