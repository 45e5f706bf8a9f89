/// Integration tests for the LLM layer and its configuration.
///
/// Unit tests for individual LLM submodules live in each file's `#[cfg(test)]`
/// block. These tests exercise cross-module behavior:
///
/// - Environment overrides of `[llm]` / `[analysis]` settings
/// - Backend construction from config
/// - Prompt construction and reply validation end-to-end
///
/// # Safety
///
/// The environment test uses `std::env::set_var` / `remove_var`, which are
/// `unsafe` in Rust 2024 edition. All mutations happen inside one `#[test]`
/// and no other test in this binary reads these variables.
use enhance::config::{self, schema::LlmConfig};
use enhance::error::LlmError;
use enhance::llm::prompts::{analysis_messages, suggestion_messages};
use enhance::llm::validation::{extract_json, score_field, string_list};
use enhance::llm::{self, backend_from_config};

/// Helper: set an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn set_env(key: &str, val: &str) {
    unsafe { std::env::set_var(key, val) }
}

/// Helper: remove an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) }
}

// ---------------------------------------------------------------------------
// Environment overrides
//
// Combined into a single #[test] so the mutations cannot race.
// ---------------------------------------------------------------------------

#[test]
fn llm_env_overrides() {
    // --- "1" enables AI and the backend ---
    unsafe { set_env("ENHANCE_USE_AI", "1") };
    let cfg = config::load();
    assert!(cfg.analysis.use_ai, "ENHANCE_USE_AI=1 should enable AI analysis");
    assert!(cfg.llm.enabled, "ENHANCE_USE_AI=1 should also enable the LLM");
    assert!(backend_from_config(&cfg.llm).is_some());

    // --- "false" disables AI analysis ---
    unsafe { set_env("ENHANCE_USE_AI", "false") };
    let cfg = config::load();
    assert!(!cfg.analysis.use_ai, "ENHANCE_USE_AI=false should disable");
    unsafe { remove_env("ENHANCE_USE_AI") };

    // --- model override ---
    unsafe { set_env("ENHANCE_LLM_MODEL", "qwen2.5:7b") };
    assert_eq!(config::load().llm.model, "qwen2.5:7b");
    unsafe { remove_env("ENHANCE_LLM_MODEL") };

    // --- url override ---
    unsafe { set_env("ENHANCE_LLM_URL", "http://myhost:9999") };
    assert_eq!(config::load().llm.ollama_url, "http://myhost:9999");
    unsafe { remove_env("ENHANCE_LLM_URL") };

    // --- timeout override, garbage ignored ---
    unsafe { set_env("ENHANCE_LLM_TIMEOUT_MS", "4500") };
    assert_eq!(config::load().llm.timeout_ms, 4500);
    unsafe { set_env("ENHANCE_LLM_TIMEOUT_MS", "soon") };
    assert_ne!(config::load().llm.timeout_ms, 0);
    unsafe { remove_env("ENHANCE_LLM_TIMEOUT_MS") };
}

// ---------------------------------------------------------------------------
// Backend construction
// ---------------------------------------------------------------------------

#[test]
fn disabled_llm_builds_no_backend() {
    let cfg = LlmConfig {
        enabled: false,
        ..LlmConfig::default()
    };
    assert!(backend_from_config(&cfg).is_none());

    let cfg = LlmConfig {
        enabled: true,
        model: "llama3.2:3b".to_string(),
        ..LlmConfig::default()
    };
    let backend = backend_from_config(&cfg).unwrap();
    assert_eq!(backend.model_name(), "llama3.2:3b");
}

#[test]
fn unreachable_backend_reports_unhealthy() {
    // Port 9 (discard) on loopback is closed in test environments.
    let cfg = LlmConfig {
        enabled: true,
        ollama_url: "http://127.0.0.1:9".to_string(),
        timeout_ms: 500,
        ..LlmConfig::default()
    };
    let backend = backend_from_config(&cfg).unwrap();
    assert!(!backend.is_healthy());
    assert!(matches!(
        llm::request_analysis(backend.as_ref(), "Explain ownership."),
        Err(LlmError::Request(_))
    ));
}

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

#[test]
fn analysis_prompt_embeds_the_text() {
    let messages = analysis_messages("Translate the menu into French.");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "system");
    assert!(messages[0].content.contains("JSON"));
    assert_eq!(messages[1].role, "user");
    assert!(messages[1].content.contains("Translate the menu into French."));
}

#[test]
fn suggestion_prompt_carries_the_summary() {
    let summary = serde_json::json!({ "overall_score": 42, "weaknesses": ["Too vague"] });
    let messages = suggestion_messages(&summary);
    assert_eq!(messages[0].role, "system");
    assert!(messages[1].content.contains("Too vague"));
}

// ---------------------------------------------------------------------------
// Reply validation
// ---------------------------------------------------------------------------

#[test]
fn fenced_reply_with_prose_parses() {
    let reply = "Sure! Here is the analysis:\n```json\n{\"scores\": {\"specificity\": \"82.6\"}, \"strengths\": [\" Clear \", \"\", 3]}\n```\nHope this helps.";
    let json = extract_json(reply).unwrap();
    assert_eq!(score_field(&json["scores"], "specificity"), Some(83));
    assert_eq!(string_list(&json, "strengths"), vec!["Clear"]);
}

#[test]
fn empty_and_non_json_replies_are_errors() {
    assert!(matches!(extract_json("   "), Err(LlmError::EmptyResponse)));
    assert!(matches!(extract_json("no json here"), Err(LlmError::InvalidJson(_))));
}
