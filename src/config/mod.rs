/// Configuration system for enhance.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::EnhanceConfig::default()`]
/// 2. **User global config**: `~/.enhance/config.toml`
/// 3. **Project local config**: `.enhance.toml` in the current working directory
/// 4. **Environment variables**: `ENHANCE_*` overrides (highest precedence)
///
/// Missing sections in a TOML file fall back to built-in defaults.
///
/// # Profiles
///
/// After merging all layers, the active profile (`general.profile`) is
/// applied:
///
/// - **quick**: rule-based analysis only, short LLM timeout
/// - **balanced**: built-in defaults (no-op)
/// - **thorough**: AI-assisted analysis, long LLM timeout
///
/// # Usage
///
/// ```rust,ignore
/// use enhance::config;
///
/// let cfg = config::load();
/// if cfg.trends.forecast {
///     // ...
/// }
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::EnhanceConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved enhance configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars → profile application.
pub fn load() -> EnhanceConfig {
    let mut config = EnhanceConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        merge_config(&mut config, &global);
    }

    if let Some(project) = load_toml_file(project_config_path()) {
        merge_config(&mut config, &project);
    }

    apply_env_overrides(&mut config);
    config.apply_profile();

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Malformed files are skipped with a warning so a typo never blocks the
/// CLI from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<EnhanceConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Merge a loaded config layer into the base config.
///
/// Each file is deserialized with `serde(default)`, so keys the user did not
/// set already carry default values. The overlay therefore replaces the base
/// wholesale.
fn merge_config(base: &mut EnhanceConfig, overlay: &EnhanceConfig) {
    *base = overlay.clone();
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".enhance").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".enhance.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `ENHANCE_ENABLED`: history recording switch (`1`/`true`/`yes`/`on`)
/// - `ENHANCE_PROFILE`: `quick`, `balanced`, `thorough`
/// - `ENHANCE_DATA_DIR`: data directory
/// - `ENHANCE_USE_AI`: enable AI-assisted analysis (also enables the LLM)
/// - `ENHANCE_LLM_MODEL`: Ollama model name
/// - `ENHANCE_LLM_URL`: Ollama endpoint URL
/// - `ENHANCE_LLM_TIMEOUT_MS`: LLM request timeout
/// - `ENHANCE_LOG`: log filter directive
fn apply_env_overrides(config: &mut EnhanceConfig) {
    if let Ok(val) = std::env::var("ENHANCE_ENABLED") {
        config.general.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("ENHANCE_PROFILE")
        && let Some(profile) = parse_profile(&val)
    {
        config.general.profile = profile;
    }
    if let Ok(val) = std::env::var("ENHANCE_DATA_DIR")
        && !val.is_empty()
    {
        config.general.data_dir = val;
    }

    if let Ok(val) = std::env::var("ENHANCE_USE_AI") {
        let on = is_truthy(&val);
        config.analysis.use_ai = on;
        if on {
            config.llm.enabled = true;
        }
    }
    if let Ok(val) = std::env::var("ENHANCE_LLM_MODEL")
        && !val.is_empty()
    {
        config.llm.model = val;
    }
    if let Ok(val) = std::env::var("ENHANCE_LLM_URL")
        && !val.is_empty()
    {
        config.llm.ollama_url = val;
    }
    if let Ok(val) = std::env::var("ENHANCE_LLM_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.llm.timeout_ms = ms;
    }

    if let Ok(val) = std::env::var("ENHANCE_LOG")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_profile(val: &str) -> Option<schema::Profile> {
    match val.to_ascii_lowercase().as_str() {
        "quick" | "fast" => Some(schema::Profile::Quick),
        "balanced" => Some(schema::Profile::Balanced),
        "thorough" | "quality" => Some(schema::Profile::Thorough),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.enhance/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.enhance/ directory")?;
    }

    fs::write(&path, EnhanceConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `llm.enabled`. When no file exists yet, the
/// defaults are serialized first and the key is updated in that tree.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let source = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&EnhanceConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&source).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    // Reject updates that would leave the file unloadable.
    let rendered =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    toml::from_str::<EnhanceConfig>(&rendered)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, rendered).context("failed to write config file")?;

    tracing::debug!(key, value, "config value updated");
    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw_value
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
