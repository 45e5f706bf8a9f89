//! JSON API handlers for the web dashboard.
//!
//! Handlers return an [`ApiResponse`]; the server loop turns it into a
//! `tiny_http` response. Failures are `anyhow` errors, and [`status_for`]
//! maps known error types onto HTTP status codes.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WebState;
use crate::analytics::export;
use crate::analytics::history::{self, AnalysisRecord};
use crate::analytics::reporter::{self, HistorySummary, TrendReport};
use crate::analyzer::PromptAnalyzer;
use crate::config;
use crate::error::{PromptError, TemplateError};
use crate::llm::ollama::OllamaClient;
use crate::optimizer::{Optimizer, Preferences};
use crate::prompts::{DEFAULT_PAGE_LIMIT, NewPrompt, PromptQuery, PromptUpdate};
use crate::templates::{NewTemplate, SearchQuery, TemplateUpdate};

pub(crate) const JSON: &str = "application/json; charset=utf-8";
const CSV: &str = "text/csv; charset=utf-8";

/// Response body plus status, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// An error with an explicit HTTP status.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }
}

/// HTTP status for a handler error. Unknown errors are 500.
pub fn status_for(err: &anyhow::Error) -> u16 {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return api.status;
    }
    if let Some(template) = err.downcast_ref::<TemplateError>() {
        return match template {
            TemplateError::NotFound(_) => 404,
            TemplateError::DuplicateName(_) => 409,
            TemplateError::Store(_) => 500,
            _ => 400,
        };
    }
    if let Some(prompt) = err.downcast_ref::<PromptError>() {
        return match prompt {
            PromptError::NotFound(_) => 404,
            PromptError::Store(_) => 500,
            _ => 400,
        };
    }
    if err.downcast_ref::<serde_json::Error>().is_some() {
        return 400;
    }
    500
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TrendsResponse {
    days: u32,
    #[serde(flatten)]
    report: TrendReport,
}

#[derive(Serialize)]
struct HistoryResponse {
    summary: HistorySummary,
    records: Vec<AnalysisRecord>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    text: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    use_ai: Option<bool>,
    #[serde(default = "default_true")]
    save: bool,
}

fn default_true() -> bool {
    true
}

/// Body of `POST /api/prompts/{id}/analyze`. The text comes from the prompt.
#[derive(Debug, Deserialize)]
struct SavedAnalyzeRequest {
    #[serde(default)]
    use_ai: Option<bool>,
    #[serde(default = "default_true")]
    save: bool,
}

#[derive(Serialize)]
struct PromptAnalysisResponse {
    prompt_id: Uuid,
    latest: Option<AnalysisRecord>,
    history: Vec<AnalysisRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderRequest {
    #[serde(default)]
    values: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RateRequest {
    #[serde(default)]
    user: Option<String>,
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
}

/// Config API response: the full config as JSON plus the raw TOML.
#[derive(Serialize)]
struct ConfigResponse {
    config: config::EnhanceConfig,
    toml_text: String,
}

/// Config update request: a list of key-value pairs.
#[derive(Deserialize)]
struct ConfigUpdateRequest {
    updates: Vec<ConfigKeyValue>,
}

#[derive(Deserialize)]
struct ConfigKeyValue {
    key: String,
    value: String,
}

#[derive(Serialize)]
struct HealthResponse {
    version: &'static str,
    history_exists: bool,
    history_records: usize,
    template_count: usize,
    prompt_count: usize,
    llm_enabled: bool,
    ollama_available: bool,
    model: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(data: &T) -> Result<ApiResponse> {
    json_with_status(200, data)
}

fn json_with_status<T: Serialize>(status: u16, data: &T) -> Result<ApiResponse> {
    let body = serde_json::to_vec(data).context("failed to serialize JSON response")?;
    Ok(ApiResponse {
        status,
        content_type: JSON,
        body,
    })
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: Option<&str>) -> Result<T> {
    let body = body.filter(|b| !b.trim().is_empty()).unwrap_or("{}");
    serde_json::from_str(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")).into())
}

/// Decoded value of query parameter `key`.
pub(crate) fn query_param(url: &str, key: &str) -> Option<String> {
    url.split_once('?')?.1.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| percent_decode(v))
    })
}

fn parse_param<T: std::str::FromStr>(url: &str, key: &str) -> Result<Option<T>> {
    match query_param(url, key).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("invalid value for '{key}': {raw}")).into()),
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid id '{raw}'")).into())
}

fn ensure_metric(metric: &str) -> Result<()> {
    if history::METRIC_NAMES.contains(&metric) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("unknown metric '{metric}'")).into())
    }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// `GET /api/trends?metric=M&days=N&forecast=false`
pub fn get_trends(state: &WebState, url: &str) -> Result<ApiResponse> {
    let metric = query_param(url, "metric").unwrap_or_else(|| "overall_score".to_string());
    ensure_metric(&metric)?;
    let days = parse_param(url, "days")?.unwrap_or(state.config.trends.default_days);

    let mut settings = state.config.trends.clone();
    if let Some(forecast) = parse_param::<bool>(url, "forecast")? {
        settings.forecast = settings.forecast && forecast;
    }

    let records = state.history.read_since_days(Some(days));
    let report = reporter::trend_report(&records, &metric, &settings);
    json_response(&TrendsResponse { days, report })
}

/// `GET /api/compare?metrics=a,b&days=N`
pub fn get_compare(state: &WebState, url: &str) -> Result<ApiResponse> {
    let metrics: Vec<String> = match query_param(url, "metrics").filter(|m| !m.trim().is_empty()) {
        Some(raw) => raw.split(',').map(|m| m.trim().to_string()).collect(),
        None => state.config.comparison.metrics.clone(),
    };
    for m in &metrics {
        ensure_metric(m)?;
    }
    let days = parse_param(url, "days")?;
    let records = state.history.read_since_days(days);
    json_response(&reporter::compare_history(&records, &metrics))
}

/// `GET /api/history?days=N&limit=L`, newest first.
pub fn get_history(state: &WebState, url: &str) -> Result<ApiResponse> {
    let days = parse_param(url, "days")?;
    let limit = parse_param(url, "limit")?.unwrap_or(50usize);
    let records = state.history.read_since_days(days);
    let summary = reporter::summarize(&records);
    let records = records.into_iter().rev().take(limit).collect();
    json_response(&HistoryResponse { summary, records })
}

/// `DELETE /api/history/{id}`
pub fn delete_history(state: &WebState, id: &str) -> Result<ApiResponse> {
    let id = parse_id(id)?;
    if !state.history.delete(id)? {
        return Err(ApiError::not_found(format!("no analysis with id {id}")).into());
    }
    json_response(&serde_json::json!({ "success": true }))
}

/// `GET /api/export.csv?days=N`
pub fn get_export_csv(state: &WebState, url: &str) -> Result<ApiResponse> {
    let days = parse_param(url, "days")?;
    let records = state.history.read_since_days(days);
    Ok(ApiResponse {
        status: 200,
        content_type: CSV,
        body: export::records_to_csv(&records).into_bytes(),
    })
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

fn analyze_request(state: &WebState, body: Option<&str>) -> Result<(PromptAnalyzer, AnalyzeRequest, bool)> {
    let req: AnalyzeRequest = parse_body(body)?;
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("text must not be empty").into());
    }
    let use_ai = req.use_ai.unwrap_or(state.config.analysis.use_ai);
    Ok((PromptAnalyzer::from_config(&state.config), req, use_ai))
}

fn record(state: &WebState, req: &AnalyzeRequest, analysis: &crate::analyzer::DetailedAnalysis) -> Result<()> {
    if req.save && state.config.general.enabled {
        let label = req
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| history::prompt_label(&req.text));
        state
            .history
            .append(&AnalysisRecord::from_analysis(&label, analysis))?;
    }
    Ok(())
}

/// `POST /api/analyze` with `{ "text": "...", "use_ai": bool, "save": bool }`
pub fn post_analyze(state: &WebState, body: Option<&str>) -> Result<ApiResponse> {
    let (analyzer, req, use_ai) = analyze_request(state, body)?;
    let analysis = analyzer.analyze(&req.text, use_ai);
    record(state, &req, &analysis)?;
    json_response(&analysis)
}

/// `POST /api/optimize`, same body as analyze.
pub fn post_optimize(state: &WebState, body: Option<&str>) -> Result<ApiResponse> {
    let (analyzer, req, use_ai) = analyze_request(state, body)?;
    let analysis = analyzer.analyze(&req.text, use_ai);
    record(state, &req, &analysis)?;
    let optimizer = Optimizer::new(analyzer.backend(), state.config.analysis.max_suggestions)
        .with_preferences(Preferences::from_config(&state.config.analysis));
    json_response(&optimizer.optimize(analysis, use_ai))
}

// ---------------------------------------------------------------------------
// Saved prompts
// ---------------------------------------------------------------------------

/// `GET /api/prompts?q=&category=&skip=&limit=`
pub fn get_prompts(state: &WebState, url: &str) -> Result<ApiResponse> {
    let query = PromptQuery {
        text: query_param(url, "q").filter(|q| !q.trim().is_empty()),
        category: query_param(url, "category").filter(|c| !c.trim().is_empty()),
        skip: parse_param(url, "skip")?.unwrap_or(0),
        limit: parse_param(url, "limit")?.unwrap_or(DEFAULT_PAGE_LIMIT),
    };
    json_response(&state.prompts.list(&query)?)
}

/// `GET /api/prompts/categories`
pub fn get_prompt_categories(state: &WebState) -> Result<ApiResponse> {
    let categories: Vec<_> = state
        .prompts
        .categories()?
        .into_iter()
        .map(|(name, count)| serde_json::json!({ "name": name, "count": count }))
        .collect();
    json_response(&categories)
}

/// `POST /api/prompts`
pub fn post_prompt(state: &WebState, body: Option<&str>) -> Result<ApiResponse> {
    let new: NewPrompt = parse_body(body)?;
    let created = state.prompts.create(new)?;
    json_with_status(201, &created)
}

/// `GET /api/prompts/{id}`
pub fn get_prompt(state: &WebState, id: &str) -> Result<ApiResponse> {
    json_response(&state.prompts.get(parse_id(id)?)?)
}

/// `PUT /api/prompts/{id}`
pub fn put_prompt(state: &WebState, id: &str, body: Option<&str>) -> Result<ApiResponse> {
    let update: PromptUpdate = parse_body(body)?;
    json_response(&state.prompts.update(parse_id(id)?, update)?)
}

/// `DELETE /api/prompts/{id}`. Recorded analyses are kept.
pub fn delete_prompt(state: &WebState, id: &str) -> Result<ApiResponse> {
    state.prompts.delete(parse_id(id)?)?;
    json_response(&serde_json::json!({ "success": true }))
}

/// `GET /api/prompts/{id}/analysis`: latest analysis plus the full series.
pub fn get_prompt_analysis(state: &WebState, id: &str) -> Result<ApiResponse> {
    let prompt = state.prompts.get(parse_id(id)?)?;
    let history = state.history.for_prompt(prompt.id);
    json_response(&PromptAnalysisResponse {
        prompt_id: prompt.id,
        latest: history.last().cloned(),
        history,
    })
}

/// `POST /api/prompts/{id}/analyze` with optional `{ "use_ai": bool, "save": bool }`
pub fn post_prompt_analyze(state: &WebState, id: &str, body: Option<&str>) -> Result<ApiResponse> {
    let prompt = state.prompts.get(parse_id(id)?)?;
    let req: SavedAnalyzeRequest = match body.map(str::trim).filter(|b| !b.is_empty()) {
        Some(raw) => serde_json::from_str(raw)?,
        None => SavedAnalyzeRequest {
            use_ai: None,
            save: true,
        },
    };
    let use_ai = req.use_ai.unwrap_or(state.config.analysis.use_ai);
    let analysis = PromptAnalyzer::from_config(&state.config).analyze(&prompt.content, use_ai);
    if req.save && state.config.general.enabled {
        let entry = AnalysisRecord::from_analysis(&prompt.label(), &analysis).with_prompt_id(prompt.id);
        state.history.append(&entry)?;
    }
    json_response(&analysis)
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// `GET /api/templates?q=&category=&tags=a,b&featured=&sort_by=&sort_order=&page=&page_size=`
pub fn get_templates(state: &WebState, url: &str) -> Result<ApiResponse> {
    let query = SearchQuery {
        text: query_param(url, "q").filter(|q| !q.trim().is_empty()),
        category: query_param(url, "category").filter(|c| !c.trim().is_empty()),
        tags: query_param(url, "tags")
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        featured: parse_param(url, "featured")?,
        sort_by: parse_param(url, "sort_by")?.unwrap_or_default(),
        sort_order: parse_param(url, "sort_order")?.unwrap_or_default(),
        page: parse_param(url, "page")?.unwrap_or(1),
        page_size: parse_param(url, "page_size")?.unwrap_or(state.config.templates.page_size),
    };
    json_response(&state.templates.search(&query)?)
}

/// `GET /api/templates/{popular|featured|recent}?limit=N`
pub fn get_template_list(state: &WebState, which: &str, url: &str) -> Result<ApiResponse> {
    let limit = parse_param(url, "limit")?.unwrap_or(10usize);
    let list = match which {
        "popular" => state.templates.popular(limit)?,
        "featured" => state.templates.featured(limit)?,
        _ => state.templates.recent(limit)?,
    };
    json_response(&list)
}

/// `GET /api/templates/categories`
pub fn get_template_categories(state: &WebState) -> Result<ApiResponse> {
    let categories: Vec<_> = state
        .templates
        .categories()?
        .into_iter()
        .map(|(name, count)| serde_json::json!({ "name": name, "count": count }))
        .collect();
    json_response(&categories)
}

/// `POST /api/templates`
pub fn post_template(state: &WebState, body: Option<&str>) -> Result<ApiResponse> {
    let new: NewTemplate = parse_body(body)?;
    let created = state.templates.create(new)?;
    json_with_status(201, &created)
}

/// `GET /api/templates/{id}`
pub fn get_template(state: &WebState, id: &str) -> Result<ApiResponse> {
    json_response(&state.templates.get(parse_id(id)?)?)
}

/// `PUT /api/templates/{id}`
pub fn put_template(state: &WebState, id: &str, body: Option<&str>) -> Result<ApiResponse> {
    let update: TemplateUpdate = parse_body(body)?;
    json_response(&state.templates.update(parse_id(id)?, update)?)
}

/// `DELETE /api/templates/{id}`
pub fn delete_template(state: &WebState, id: &str) -> Result<ApiResponse> {
    state.templates.delete(parse_id(id)?)?;
    json_response(&serde_json::json!({ "success": true }))
}

/// `POST /api/templates/{id}/render` with `{ "values": { "k": "v" } }`.
/// Counts as a use.
pub fn post_template_render(state: &WebState, id: &str, body: Option<&str>) -> Result<ApiResponse> {
    let req: RenderRequest = parse_body(body)?;
    let id = parse_id(id)?;
    let template = state.templates.get(id)?;
    let rendered = template.render(&req.values)?;
    state.templates.record_use(id)?;
    json_response(&serde_json::json!({ "content": rendered }))
}

/// `POST /api/templates/{id}/rate` with `{ "rating": 1..5, "user": "...", "comment": "..." }`
pub fn post_template_rate(state: &WebState, id: &str, body: Option<&str>) -> Result<ApiResponse> {
    let req: RateRequest = parse_body(body)?;
    let user = req
        .user
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string());
    let rated = state
        .templates
        .rate(parse_id(id)?, &user, req.rating, req.comment)?;
    json_response(&rated)
}

// ---------------------------------------------------------------------------
// Configuration and health
// ---------------------------------------------------------------------------

/// `GET /api/config`: the configuration the server is running with.
pub fn get_config(state: &WebState) -> Result<ApiResponse> {
    let toml_text = toml::to_string_pretty(&state.config).unwrap_or_default();
    json_response(&ConfigResponse {
        config: state.config.clone(),
        toml_text,
    })
}

/// `PUT /api/config` with `{ "updates": [{ "key": "llm.enabled", "value": "true" }] }`.
/// Writes the global config file, then reloads.
pub fn put_config(state: &mut WebState, body: Option<&str>) -> Result<ApiResponse> {
    let req: ConfigUpdateRequest = parse_body(body)?;

    let mut errors: Vec<String> = Vec::new();
    let mut applied: Vec<String> = Vec::new();
    for kv in &req.updates {
        match config::set_config_value(&kv.key, &kv.value) {
            Ok(()) => applied.push(format!("{} = {}", kv.key, kv.value)),
            Err(e) => errors.push(format!("{}: {}", kv.key, e)),
        }
    }
    if !applied.is_empty() {
        state.reload()?;
    }

    json_response(&serde_json::json!({
        "applied": applied,
        "errors": errors,
        "success": errors.is_empty(),
    }))
}

/// `POST /api/config/reset`
pub fn post_config_reset(state: &mut WebState) -> Result<ApiResponse> {
    config::reset_config().context("failed to reset config")?;
    state.reload()?;
    json_response(&serde_json::json!({
        "success": true,
        "message": "Configuration reset to defaults",
    }))
}

/// `GET /api/health`
pub fn get_health(state: &WebState) -> Result<ApiResponse> {
    let llm = &state.config.llm;
    let ollama_available = llm.enabled && !OllamaClient::from_config(llm).list_models().is_empty();
    json_response(&HealthResponse {
        version: env!("CARGO_PKG_VERSION"),
        history_exists: state.history.path().exists(),
        history_records: state.history.read_all().len(),
        template_count: state.templates.load().map(|t| t.len()).unwrap_or(0),
        prompt_count: state.prompts.load().map(|p| p.len()).unwrap_or(0),
        llm_enabled: llm.enabled,
        ollama_available,
        model: llm.model.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_extracts_and_decodes() {
        assert_eq!(query_param("/api/trends?days=7", "days").as_deref(), Some("7"));
        assert_eq!(
            query_param("/api/templates?q=code%20review&page=2", "q").as_deref(),
            Some("code review")
        );
        assert_eq!(query_param("/api/templates?q=a+b", "q").as_deref(), Some("a b"));
        assert_eq!(query_param("/api/trends", "days"), None);
        assert_eq!(query_param("/api/trends?foo=bar", "days"), None);
    }

    #[test]
    fn percent_decode_keeps_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%E6%8F%90"), "提");
    }

    #[test]
    fn parse_param_rejects_garbage() {
        let err = parse_param::<u32>("/api/trends?days=abc", "days").unwrap_err();
        assert_eq!(status_for(&err), 400);
        assert_eq!(parse_param::<u32>("/api/trends?days=", "days").unwrap(), None);
        assert_eq!(parse_param::<u32>("/api/trends?days=14", "days").unwrap(), Some(14));
    }

    #[test]
    fn template_errors_map_to_statuses() {
        let not_found: anyhow::Error = TemplateError::NotFound("x".into()).into();
        assert_eq!(status_for(&not_found), 404);
        let invalid: anyhow::Error = TemplateError::InvalidRating(9).into();
        assert_eq!(status_for(&invalid), 400);
        let dup: anyhow::Error = TemplateError::DuplicateName("x".into()).into();
        assert_eq!(status_for(&dup), 409);
        assert_eq!(status_for(&anyhow::anyhow!("boom")), 500);
    }

    #[test]
    fn prompt_errors_map_to_statuses() {
        let not_found: anyhow::Error = PromptError::NotFound("x".into()).into();
        assert_eq!(status_for(&not_found), 404);
        let empty: anyhow::Error = PromptError::EmptyContent.into();
        assert_eq!(status_for(&empty), 400);
        let long: anyhow::Error = PromptError::TitleTooLong { max: 200 }.into();
        assert_eq!(status_for(&long), 400);
    }

    #[test]
    fn config_update_request_deserializes() {
        let json = r#"{"updates": [{"key": "llm.enabled", "value": "true"}]}"#;
        let req: ConfigUpdateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.updates.len(), 1);
        assert_eq!(req.updates[0].key, "llm.enabled");
    }

    #[test]
    fn analyze_request_defaults_to_saving() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert!(req.save);
        assert_eq!(req.use_ai, None);
    }
}
