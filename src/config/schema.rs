/// Configuration schema and defaults for enhance.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[general]`, `[analysis]`, `[llm]`, `[trends]`, `[comparison]`,
/// `[templates]`, `[web]`, and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level enhance configuration.
///
/// Maps directly to the `~/.enhance/config.toml` and `.enhance.toml` file
/// schemas. All sections and fields are optional; missing values fall back
/// to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub general: GeneralConfig,
    pub analysis: AnalysisConfig,
    pub llm: LlmConfig,
    pub trends: TrendsConfig,
    pub comparison: ComparisonConfig,
    pub templates: TemplatesConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

/// Analysis profile presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Rule-based scoring only, short LLM timeout.
    Quick,
    /// Default balanced settings.
    #[default]
    Balanced,
    /// AI-assisted scoring with a generous LLM timeout.
    Thorough,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Balanced => write!(f, "balanced"),
            Self::Thorough => write!(f, "thorough"),
        }
    }
}

/// General enhance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Master switch for recording analysis history.
    pub enabled: bool,
    /// Profile preset applied after all layers are merged.
    pub profile: Profile,
    /// Directory holding history and template files. `~` is expanded.
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            profile: Profile::default(),
            data_dir: "~/.enhance".to_string(),
        }
    }
}

impl GeneralConfig {
    /// Resolve `data_dir`, expanding a leading `~` to the home directory.
    pub fn data_dir_path(&self) -> Option<PathBuf> {
        expand_home(&self.data_dir)
    }
}

/// Expand a leading `~` or `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> Option<PathBuf> {
    if raw == "~" {
        return dirs::home_dir();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

// ---------------------------------------------------------------------------
// [analysis]
// ---------------------------------------------------------------------------

/// Prompt analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ask the LLM for dimension scores in addition to the rule-based pass.
    pub use_ai: bool,
    /// Maximum number of optimization suggestions returned.
    pub max_suggestions: usize,
    /// What the prompts are for, e.g. "customer support". Empty disables
    /// personalized recommendations.
    pub use_case: String,
    /// `quick`, `standard` or `deep`; passed to the model as a preference.
    pub analysis_depth: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_ai: false,
            max_suggestions: 5,
            use_case: String::new(),
            analysis_depth: "standard".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [llm]
// ---------------------------------------------------------------------------

/// Local LLM (Ollama) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether the LLM backend may be contacted at all (opt-in).
    pub enabled: bool,
    /// Ollama model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Ollama HTTP base URL.
    pub ollama_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "llama3.2:3b".to_string(),
            temperature: 0.3,
            timeout_ms: 30_000,
            ollama_url: "http://localhost:11434".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [trends]
// ---------------------------------------------------------------------------

/// Trend report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    /// Append forecast points to trend reports.
    pub forecast: bool,
    /// Default look-back window in days.
    pub default_days: u32,
    /// Window size for the trailing moving average.
    pub rolling_window: usize,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            forecast: true,
            default_days: 30,
            rolling_window: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// [comparison]
// ---------------------------------------------------------------------------

/// Comparison/ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Metrics averaged into each entity's ranking score.
    pub metrics: Vec<String>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            metrics: vec![
                "overall_score".to_string(),
                "semantic_clarity".to_string(),
                "structural_integrity".to_string(),
                "logical_coherence".to_string(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// [templates]
// ---------------------------------------------------------------------------

/// Template library settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Default page size for template listings.
    pub page_size: usize,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address for `enhance web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive: `"info"`, `"debug"`, `"enhance=trace"`.
    pub level: String,
    /// Output format: `"text"` or `"json"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile application
// ---------------------------------------------------------------------------

impl EnhanceConfig {
    /// Apply the active profile's overrides to this config.
    ///
    /// Profiles run after every layer has been merged, so they overwrite the
    /// handful of settings they manage.
    pub fn apply_profile(&mut self) {
        match self.general.profile {
            Profile::Quick => self.apply_quick_profile(),
            Profile::Balanced => {}
            Profile::Thorough => self.apply_thorough_profile(),
        }
    }

    fn apply_quick_profile(&mut self) {
        self.analysis.use_ai = false;
        self.analysis.max_suggestions = 3;
        self.llm.timeout_ms = 5_000;
    }

    fn apply_thorough_profile(&mut self) {
        self.analysis.use_ai = true;
        self.llm.enabled = true;
        self.llm.timeout_ms = 120_000;
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl EnhanceConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `enhance config init`.
    pub fn default_toml() -> String {
        r#"# enhance configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (ENHANCE_*)
#   2. Project config (.enhance.toml in current directory)
#   3. User global config (~/.enhance/config.toml)
#   4. Built-in defaults

[general]
enabled = true
profile = "balanced"   # quick | balanced | thorough
data_dir = "~/.enhance"

[analysis]
use_ai = false         # Ask the LLM for dimension scores
max_suggestions = 5
use_case = ""          # Set to get AI recommendations tailored to it
analysis_depth = "standard"

[llm]
enabled = false        # Opt-in: set true or ENHANCE_USE_AI=1
model = "llama3.2:3b"
temperature = 0.3
timeout_ms = 30000
ollama_url = "http://localhost:11434"

[trends]
forecast = true
default_days = 30
rolling_window = 3

[comparison]
metrics = ["overall_score", "semantic_clarity", "structural_integrity", "logical_coherence"]

[templates]
page_size = 20

[web]
addr = "127.0.0.1:9747"
open_browser = true

[logging]
level = "warn"         # or a filter directive, e.g. "enhance=debug"
format = "text"        # text | json
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
