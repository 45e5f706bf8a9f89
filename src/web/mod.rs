//! Embedded web dashboard for enhance.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard: analyzer, trends, comparison, templates, prompts
//! - JSON API endpoints backing each panel, plus config management
//!
//! Launched via `enhance web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::history::HistoryStore;
use crate::config::{self, EnhanceConfig};
use crate::prompts::PromptStore;
use crate::templates::TemplateStore;

pub use api::{ApiError, ApiResponse, status_for};

/// Everything a request handler needs.
pub struct WebState {
    pub config: EnhanceConfig,
    pub history: HistoryStore,
    pub templates: TemplateStore,
    pub prompts: PromptStore,
}

impl WebState {
    pub fn new(
        config: EnhanceConfig,
        history: HistoryStore,
        templates: TemplateStore,
        prompts: PromptStore,
    ) -> Self {
        Self {
            config,
            history,
            templates,
            prompts,
        }
    }

    pub fn from_config(config: EnhanceConfig) -> Result<Self> {
        let history = HistoryStore::from_config(&config)?;
        let templates = TemplateStore::from_config(&config)?;
        let prompts = PromptStore::from_config(&config)?;
        Ok(Self::new(config, history, templates, prompts))
    }

    /// Re-read config files and rebuild the stores.
    fn reload(&mut self) -> Result<()> {
        *self = Self::from_config(config::load())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Requests are handled sequentially; a failing
/// request gets a JSON error and the server keeps going.
pub fn serve(mut state: WebState, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("enhance dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if state.config.web.open_browser {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            tracing::debug!(error = %e, "could not open browser");
        }
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            match request.as_reader().read_to_string(&mut buf) {
                Ok(_) => Some(buf),
                Err(e) => {
                    tracing::warn!(error = %e, %url, "failed to read request body");
                    None
                }
            }
        } else {
            None
        };

        let resp = respond(&mut state, &method, &url, body.as_deref());
        let status = resp.status;
        if let Err(e) = request.respond(into_http(resp)) {
            tracing::warn!(error = %e, %url, "failed to send response");
        }

        tracing::info!(%method, %url, status, "request");
    }

    Ok(())
}

/// Dispatch and turn handler errors into JSON error bodies.
pub fn respond(state: &mut WebState, method: &Method, url: &str, body: Option<&str>) -> ApiResponse {
    match dispatch(state, method, url, body) {
        Ok(resp) => resp,
        Err(e) => {
            let status = status_for(&e);
            if status >= 500 {
                tracing::error!(error = %format!("{e:#}"), %url, "request failed");
            }
            error_response(status, &e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn dispatch(state: &mut WebState, method: &Method, url: &str, body: Option<&str>) -> Result<ApiResponse> {
    let path = url.split('?').next().unwrap_or(url);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        // Frontend
        (&Method::Get, [""] | ["index.html"]) => Ok(serve_frontend()),

        // Analysis
        (&Method::Post, ["api", "analyze"]) => api::post_analyze(state, body),
        (&Method::Post, ["api", "optimize"]) => api::post_optimize(state, body),

        // Analytics
        (&Method::Get, ["api", "trends"]) => api::get_trends(state, url),
        (&Method::Get, ["api", "compare"]) => api::get_compare(state, url),
        (&Method::Get, ["api", "history"]) => api::get_history(state, url),
        (&Method::Delete, ["api", "history", id]) => api::delete_history(state, id),
        (&Method::Get, ["api", "export.csv"]) => api::get_export_csv(state, url),

        // Saved prompts
        (&Method::Get, ["api", "prompts"]) => api::get_prompts(state, url),
        (&Method::Post, ["api", "prompts"]) => api::post_prompt(state, body),
        (&Method::Get, ["api", "prompts", "categories"]) => api::get_prompt_categories(state),
        (&Method::Get, ["api", "prompts", id]) => api::get_prompt(state, id),
        (&Method::Put, ["api", "prompts", id]) => api::put_prompt(state, id, body),
        (&Method::Delete, ["api", "prompts", id]) => api::delete_prompt(state, id),
        (&Method::Get, ["api", "prompts", id, "analysis"]) => api::get_prompt_analysis(state, id),
        (&Method::Post, ["api", "prompts", id, "analyze"]) => {
            api::post_prompt_analyze(state, id, body)
        }

        // Templates
        (&Method::Get, ["api", "templates"]) => api::get_templates(state, url),
        (&Method::Post, ["api", "templates"]) => api::post_template(state, body),
        (&Method::Get, ["api", "templates", "categories"]) => api::get_template_categories(state),
        (&Method::Get, ["api", "templates", which @ ("popular" | "featured" | "recent")]) => {
            api::get_template_list(state, which, url)
        }
        (&Method::Get, ["api", "templates", id]) => api::get_template(state, id),
        (&Method::Put, ["api", "templates", id]) => api::put_template(state, id, body),
        (&Method::Delete, ["api", "templates", id]) => api::delete_template(state, id),
        (&Method::Post, ["api", "templates", id, "render"]) => {
            api::post_template_render(state, id, body)
        }
        (&Method::Post, ["api", "templates", id, "rate"]) => api::post_template_rate(state, id, body),

        // Configuration
        (&Method::Get, ["api", "config"]) => api::get_config(state),
        (&Method::Put, ["api", "config"]) => api::put_config(state, body),
        (&Method::Post, ["api", "config", "reset"]) => api::post_config_reset(state),

        // Health
        (&Method::Get, ["api", "health"]) => api::get_health(state),

        _ => Err(ApiError::not_found("not found").into()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> ApiResponse {
    ApiResponse {
        status: 200,
        content_type: "text/html; charset=utf-8",
        body: frontend::INDEX_HTML.as_bytes().to_vec(),
    }
}

fn error_response(status: u16, message: &str) -> ApiResponse {
    ApiResponse {
        status,
        content_type: api::JSON,
        body: serde_json::json!({ "error": message }).to_string().into_bytes(),
    }
}

fn into_http(resp: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let mut http = Response::from_data(resp.body).with_status_code(StatusCode(resp.status));
    if let Ok(header) = Header::from_bytes("Content-Type", resp.content_type) {
        http = http.with_header(header);
    }
    http
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dir: &tempfile::TempDir) -> WebState {
        WebState::new(
            EnhanceConfig::default(),
            HistoryStore::at(dir.path().join("analysis-history.jsonl")),
            TemplateStore::at(dir.path().join("templates.json")),
            PromptStore::at(dir.path().join("prompts.json")),
        )
    }

    fn json(resp: &ApiResponse) -> serde_json::Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn serves_frontend_and_404s() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);

        let index = respond(&mut st, &Method::Get, "/", None);
        assert_eq!(index.status, 200);
        assert!(index.content_type.starts_with("text/html"));

        let missing = respond(&mut st, &Method::Get, "/api/nope", None);
        assert_eq!(missing.status, 404);
        assert_eq!(json(&missing)["error"], "not found");
    }

    #[test]
    fn analyze_records_history_and_feeds_trends() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);

        let body = r#"{"text": "You are a reviewer. Summarize the report in 3 bullet points."}"#;
        let resp = respond(&mut st, &Method::Post, "/api/analyze", Some(body));
        assert_eq!(resp.status, 200);
        let analysis = json(&resp);
        assert_eq!(analysis["model_used"], "rule-based");
        assert!(analysis["metrics"]["overall_score"].as_u64().is_some());
        assert_eq!(st.history.read_all().len(), 1);

        let trends = json(&respond(&mut st, &Method::Get, "/api/trends?days=7", None));
        assert_eq!(trends["days"], 7);
        assert_eq!(trends["series"].as_array().unwrap().len(), 1);

        let csv = respond(&mut st, &Method::Get, "/api/export.csv", None);
        assert!(csv.content_type.starts_with("text/csv"));
        assert_eq!(String::from_utf8(csv.body).unwrap().lines().count(), 2);
    }

    #[test]
    fn analyze_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);
        let body = r#"{"text": "Explain recursion.", "save": false}"#;
        assert_eq!(respond(&mut st, &Method::Post, "/api/optimize", Some(body)).status, 200);
        assert!(st.history.read_all().is_empty());
    }

    #[test]
    fn bad_input_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);
        assert_eq!(respond(&mut st, &Method::Post, "/api/analyze", Some("{not json")).status, 400);
        assert_eq!(
            respond(&mut st, &Method::Post, "/api/analyze", Some(r#"{"text": "  "}"#)).status,
            400
        );
        assert_eq!(respond(&mut st, &Method::Get, "/api/trends?metric=vibes", None).status, 400);
        assert_eq!(respond(&mut st, &Method::Get, "/api/prompts?limit=lots", None).status, 400);
        assert_eq!(respond(&mut st, &Method::Get, "/api/templates/not-a-uuid", None).status, 400);
    }

    #[test]
    fn template_lifecycle_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);

        let created = respond(
            &mut st,
            &Method::Post,
            "/api/templates",
            Some(r#"{"name": "Translate", "content": "Translate {{text}} to {{lang}}", "category": "language"}"#),
        );
        assert_eq!(created.status, 201);
        let id = json(&created)["id"].as_str().unwrap().to_string();

        let dup = respond(
            &mut st,
            &Method::Post,
            "/api/templates",
            Some(r#"{"name": "translate", "content": "x"}"#),
        );
        assert_eq!(dup.status, 409);

        let render_url = format!("/api/templates/{id}/render");
        let missing = respond(&mut st, &Method::Post, &render_url, Some(r#"{"values": {"text": "hi"}}"#));
        assert_eq!(missing.status, 400);

        let rendered = respond(
            &mut st,
            &Method::Post,
            &render_url,
            Some(r#"{"values": {"text": "hi", "lang": "German"}}"#),
        );
        assert_eq!(json(&rendered)["content"], "Translate hi to German");

        let rated = respond(
            &mut st,
            &Method::Post,
            &format!("/api/templates/{id}/rate"),
            Some(r#"{"rating": 5, "user": "kim"}"#),
        );
        let rated = json(&rated);
        assert_eq!(rated["rating_count"], 1);
        assert_eq!(rated["usage_count"], 1);

        let categories = json(&respond(&mut st, &Method::Get, "/api/templates/categories", None));
        assert_eq!(categories[0]["name"], "language");

        let search = json(&respond(&mut st, &Method::Get, "/api/templates?q=translate", None));
        assert_eq!(search["total"], 1);

        let template_url = format!("/api/templates/{id}");
        assert_eq!(respond(&mut st, &Method::Delete, &template_url, None).status, 200);
        assert_eq!(respond(&mut st, &Method::Get, &template_url, None).status, 404);
    }

    #[test]
    fn huge_trend_window_is_not_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);
        let body = r#"{"text": "Summarize the report in 3 bullet points."}"#;
        respond(&mut st, &Method::Post, "/api/analyze", Some(body));

        let resp = respond(&mut st, &Method::Get, "/api/trends?days=100000000", None);
        assert_eq!(resp.status, 200);
        assert_eq!(json(&resp)["series"].as_array().unwrap().len(), 1);
        let history = respond(&mut st, &Method::Get, "/api/history?days=4294967295", None);
        assert_eq!(history.status, 200);
    }

    #[test]
    fn prompt_library_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let mut st = state(&dir);

        let created = respond(
            &mut st,
            &Method::Post,
            "/api/prompts",
            Some(r#"{"title": "Release notes", "content": "You are a technical writer. Draft release notes for version 2.0 in 5 bullet points.", "category": "writing"}"#),
        );
        assert_eq!(created.status, 201);
        let created = json(&created);
        assert_eq!(created["is_public"], false);
        let id = created["id"].as_str().unwrap().to_string();

        let empty = respond(&mut st, &Method::Post, "/api/prompts", Some(r#"{"content": " "}"#));
        assert_eq!(empty.status, 400);

        let analysis_url = format!("/api/prompts/{id}/analysis");
        let before = json(&respond(&mut st, &Method::Get, &analysis_url, None));
        assert!(before["latest"].is_null());

        let analyzed = respond(&mut st, &Method::Post, &format!("/api/prompts/{id}/analyze"), None);
        assert_eq!(analyzed.status, 200);
        let score = json(&analyzed)["metrics"]["overall_score"].clone();

        // Ad-hoc analyses do not show up under the saved prompt.
        let adhoc = r#"{"text": "Explain recursion."}"#;
        respond(&mut st, &Method::Post, "/api/analyze", Some(adhoc));

        let after = json(&respond(&mut st, &Method::Get, &analysis_url, None));
        assert_eq!(after["history"].as_array().unwrap().len(), 1);
        assert_eq!(after["latest"]["overall_score"], score);
        assert_eq!(after["latest"]["prompt"], "Release notes");
        assert_eq!(after["latest"]["prompt_id"], id.as_str());

        let prompt_url = format!("/api/prompts/{id}");
        let renamed = respond(
            &mut st,
            &Method::Put,
            &prompt_url,
            Some(r#"{"title": "Changelog", "tags": ["Docs"]}"#),
        );
        assert_eq!(json(&renamed)["tags"][0], "docs");

        let list = json(&respond(&mut st, &Method::Get, "/api/prompts?category=writing&limit=5", None));
        assert_eq!(list["total"], 1);
        assert_eq!(list["limit"], 5);
        let categories = json(&respond(&mut st, &Method::Get, "/api/prompts/categories", None));
        assert_eq!(categories[0]["name"], "writing");
        assert_eq!(categories[0]["count"], 1);

        assert_eq!(respond(&mut st, &Method::Delete, &prompt_url, None).status, 200);
        assert_eq!(respond(&mut st, &Method::Get, &prompt_url, None).status, 404);
        assert_eq!(respond(&mut st, &Method::Get, &analysis_url, None).status, 404);
        assert_eq!(st.history.read_all().len(), 2);
    }
}
