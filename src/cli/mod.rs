//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `enhance analyze` / `enhance optimize`: score a prompt, suggest fixes
//! - `enhance trends`: per-metric trend stats, rolling average, forecast
//! - `enhance compare`: rank analyzed prompts
//! - `enhance export` / `enhance history`: raw history access
//! - `enhance health`: check config, data files, and the LLM backend
//! - `enhance config show|init|set|reset`: configuration management
//!
//! Template commands live in [`templates`], saved-prompt commands in
//! [`prompts`].

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::analytics::export;
use crate::analytics::history::{self, AnalysisRecord, HistoryStore};
use crate::analytics::reporter::{self, TrendReport};
use crate::analytics::comparison::Comparison;
use crate::analytics::trend::Trend;
use crate::analyzer::{DetailedAnalysis, PromptAnalyzer};
use crate::config::{self, EnhanceConfig};
use crate::llm::ollama::OllamaClient;
use crate::optimizer::{OptimizationResult, Optimizer, Preferences};
use crate::prompts::PromptStore;
use crate::templates::TemplateStore;

pub mod prompts;
pub mod templates;

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Where the prompt text comes from.
#[derive(Debug, Clone, Default)]
pub struct PromptInput {
    pub text: Option<String>,
    pub file: Option<PathBuf>,
    /// Label stored in history. Defaults to the first line of the text.
    pub name: Option<String>,
}

impl PromptInput {
    /// Resolve to text: `--file`, then the positional argument, then stdin.
    pub fn read(&self) -> Result<String> {
        let text = if let Some(path) = &self.file {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read prompt file {}", path.display()))?
        } else if let Some(text) = self.text.as_deref().filter(|t| *t != "-") {
            text.to_string()
        } else {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            buf
        };

        if text.trim().is_empty() {
            bail!("prompt text is empty");
        }
        Ok(text)
    }

    fn label(&self, text: &str) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| history::prompt_label(text))
    }
}

// ---------------------------------------------------------------------------
// enhance analyze
// ---------------------------------------------------------------------------

/// Score a prompt and (unless `save` is off) append it to the history.
pub fn run_analyze(
    cfg: &EnhanceConfig,
    input: &PromptInput,
    save: bool,
    format: OutputFormat,
) -> Result<()> {
    let text = input.read()?;
    let analyzer = PromptAnalyzer::from_config(cfg);
    let analysis = analyzer.analyze(&text, cfg.analysis.use_ai);
    record(cfg, AnalysisRecord::from_analysis(&input.label(&text), &analysis), save)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Csv => print_analysis_csv(&analysis),
        OutputFormat::Table => print_analysis_table(&analysis),
    }
    Ok(())
}

fn record(cfg: &EnhanceConfig, entry: AnalysisRecord, save: bool) -> Result<()> {
    if !save || !cfg.general.enabled {
        return Ok(());
    }
    let store = HistoryStore::from_config(cfg)?;
    store
        .append(&entry)
        .context("failed to record analysis")?;
    Ok(())
}

fn print_analysis_table(a: &DetailedAnalysis) {
    let m = &a.metrics;
    println!("{}", "Prompt Analysis".bold().cyan());
    println!("{}", "=".repeat(50));
    println!(
        "  {:<24} {}",
        "Overall score".bold(),
        colorize_score(m.overall_score).bold()
    );
    println!("  {}", "-".repeat(46));
    for (name, score) in m.dimensions() {
        println!("  {:<24} {:>5}", metric_title(name), colorize_score(score));
    }
    println!("  {:<24} {:>5}", "Readability", colorize_score(m.readability_score));
    println!("  {:<24} {:>5.2}", "Complexity", m.complexity_score);
    println!();

    let b = &a.basic_metrics;
    println!(
        "  {} {} words, {} sentences, ~{} tokens",
        "Text:".dimmed(),
        format_number(b.word_count),
        b.sentence_count,
        format_number(a.token_count),
    );
    println!("  {} {} ({} ms)", "Model:".dimmed(), a.model_used, a.processing_ms);

    print_list("Strengths", &a.strengths, |s| s.green());
    print_list("Weaknesses", &a.weaknesses, |s| s.yellow());
    print_list("Suggestions", &a.suggestions, |s| s.normal());
}

fn print_analysis_csv(a: &DetailedAnalysis) {
    println!("metric,score");
    println!("overall_score,{}", a.metrics.overall_score);
    for (name, score) in a.metrics.dimensions() {
        println!("{name},{score}");
    }
    println!("readability_score,{}", a.metrics.readability_score);
}

fn print_list(title: &str, items: &[String], paint: impl Fn(&str) -> colored::ColoredString) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", title.bold());
    for item in items {
        println!("  • {}", paint(item));
    }
}

// ---------------------------------------------------------------------------
// enhance optimize
// ---------------------------------------------------------------------------

/// Analyze a prompt and print prioritised suggestions with a roadmap.
pub fn run_optimize(
    cfg: &EnhanceConfig,
    input: &PromptInput,
    save: bool,
    format: OutputFormat,
) -> Result<()> {
    let text = input.read()?;
    let analyzer = PromptAnalyzer::from_config(cfg);
    let analysis = analyzer.analyze(&text, cfg.analysis.use_ai);
    record(cfg, AnalysisRecord::from_analysis(&input.label(&text), &analysis), save)?;

    let optimizer = Optimizer::new(analyzer.backend(), cfg.analysis.max_suggestions)
        .with_preferences(Preferences::from_config(&cfg.analysis));
    let result = optimizer.optimize(analysis, cfg.analysis.use_ai);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Csv => print_optimize_csv(&result),
        OutputFormat::Table => print_optimize_table(&result),
    }
    Ok(())
}

fn print_optimize_table(r: &OptimizationResult) {
    println!("{}", "Optimization Suggestions".bold().cyan());
    println!("{}", "=".repeat(50));
    println!(
        "  {} {}  {} +{}",
        "Current score:".bold(),
        colorize_score(r.analysis.metrics.overall_score),
        "Estimated gain:".bold(),
        r.estimated_score_improvement
    );

    for (i, s) in r.suggestions.iter().enumerate() {
        println!();
        println!(
            "  {}. {} {}",
            i + 1,
            s.title.bold(),
            format!("[P{} · {:?} impact · {:.0}%]", s.priority.level(), s.impact, s.confidence * 100.0)
                .dimmed()
        );
        if !s.description.is_empty() {
            println!("     {}", s.description);
        }
        for step in s.improvement_plan.lines() {
            println!("     {}", step.dimmed());
        }
    }

    let roadmap = &r.roadmap;
    println!();
    println!("{}", "Roadmap".bold());
    for (label, items) in [
        ("Now", &roadmap.immediate),
        ("Next", &roadmap.short_term),
        ("Later", &roadmap.long_term),
    ] {
        if !items.is_empty() {
            println!("  {:<6} {}", label.bold(), items.join(", "));
        }
    }

    if !r.personalized_recommendations.is_empty() {
        println!();
        println!("{}", "For your use case".bold());
        for rec in &r.personalized_recommendations {
            println!("  • {rec}");
        }
    }
}

fn print_optimize_csv(r: &OptimizationResult) {
    println!("id,type,priority,impact,confidence,title");
    for s in &r.suggestions {
        println!(
            "{},{:?},{},{:?},{:.2},{}",
            s.id,
            s.kind,
            s.priority.level(),
            s.impact,
            s.confidence,
            csv_field(&s.title),
        );
    }
}

// ---------------------------------------------------------------------------
// enhance trends
// ---------------------------------------------------------------------------

/// Show trend statistics for one metric.
pub fn run_trends(
    cfg: &EnhanceConfig,
    metric: &str,
    days: Option<u32>,
    forecast: bool,
    format: OutputFormat,
) -> Result<()> {
    ensure_metric(metric)?;
    let days = days.unwrap_or(cfg.trends.default_days);
    let records = HistoryStore::from_config(cfg)?.read_since_days(Some(days));

    if records.is_empty() {
        println!("{}", format!("No analyses in the last {days} days.").yellow());
        return Ok(());
    }

    let mut settings = cfg.trends.clone();
    settings.forecast = settings.forecast && forecast;
    let report = reporter::trend_report(&records, metric, &settings);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print_trends_csv(&report),
        OutputFormat::Table => print_trends_table(&report, days),
    }
    Ok(())
}

fn print_trends_table(report: &TrendReport, days: u32) {
    println!(
        "{}",
        format!("{} · last {days} days", metric_title(&report.metric)).bold().cyan()
    );
    println!("{}", "=".repeat(50));
    println!("  {:<12} {:>8} {:>10}", "Date", "Value", "Rolling");
    println!("  {}", "-".repeat(32));
    for (point, rolling) in report.series.iter().zip(&report.rolling) {
        println!("  {:<12} {:>8.1} {:>10.1}", point.timestamp, point.value, rolling.value);
    }
    for p in &report.forecast {
        println!(
            "  {}",
            format!("{:<12} {:>8.1} {:>10}", p.timestamp, p.value, "forecast").dimmed()
        );
    }

    let s = &report.stats;
    println!();
    println!(
        "  {} {:.1} → {:.1} ({:+.1}, {:+.1}%) {}",
        "Change:".bold(),
        s.previous,
        s.current,
        s.change,
        s.change_percent,
        colorize_trend(s.trend)
    );
    println!(
        "  {} max {:.1} · min {:.1} · avg {:.1}",
        "Range: ".bold(),
        s.max,
        s.min,
        s.avg
    );
}

fn print_trends_csv(report: &TrendReport) {
    println!("date,value,rolling,is_prediction");
    for (point, rolling) in report.series.iter().zip(&report.rolling) {
        println!("{},{:.2},{:.2},false", point.timestamp, point.value, rolling.value);
    }
    for p in &report.forecast {
        println!("{},{:.2},,true", p.timestamp, p.value);
    }
}

// ---------------------------------------------------------------------------
// enhance compare
// ---------------------------------------------------------------------------

/// Rank analyzed prompts by mean score over `metrics`.
pub fn run_compare(
    cfg: &EnhanceConfig,
    metrics: Option<Vec<String>>,
    days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let metrics = metrics
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| cfg.comparison.metrics.clone());
    for m in &metrics {
        ensure_metric(m)?;
    }

    let records = HistoryStore::from_config(cfg)?.read_since_days(days);
    if records.is_empty() {
        println!("{}", "No analyses to compare yet.".yellow());
        return Ok(());
    }
    let comparison = reporter::compare_history(&records, &metrics);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Csv => print_compare_csv(&comparison, &metrics),
        OutputFormat::Table => print_compare_table(&comparison, &metrics),
    }
    Ok(())
}

fn print_compare_table(c: &Comparison, metrics: &[String]) {
    println!("{}", "Prompt Comparison".bold().cyan());
    println!("{}", "=".repeat(60));
    print!("  {:<4} {:<32} {:>7}", "#", "Prompt", "Avg");
    for m in metrics {
        print!(" {:>8}", truncate(&short_metric(m), 8));
    }
    println!();

    for row in &c.ranking {
        print!(
            "  {:<4} {:<32} {:>7.1}",
            row.rank,
            truncate(&row.name, 32),
            row.avg_score
        );
        for m in metrics {
            match row.metrics.get(m) {
                Some(v) => print!(" {:>8.1}", v),
                None => print!(" {:>8}", "-".dimmed()),
            }
        }
        println!();
    }

    println!();
    if let Some(best) = &c.best_metric {
        println!("  {} {} ({:.1})", "Strongest:".green().bold(), metric_title(&best.metric), best.mean);
    }
    if let Some(worst) = &c.worst_metric {
        println!("  {} {} ({:.1})", "Weakest:  ".red().bold(), metric_title(&worst.metric), worst.mean);
    }
}

fn print_compare_csv(c: &Comparison, metrics: &[String]) {
    println!("rank,name,avg_score,{}", metrics.join(","));
    for row in &c.ranking {
        let values: Vec<String> = metrics
            .iter()
            .map(|m| row.metrics.get(m).map(|v| format!("{v:.2}")).unwrap_or_default())
            .collect();
        println!(
            "{},{},{:.2},{}",
            row.rank,
            csv_field(&row.name),
            row.avg_score,
            values.join(",")
        );
    }
}

// ---------------------------------------------------------------------------
// enhance export / history
// ---------------------------------------------------------------------------

/// Write the score history as CSV to `output` or stdout.
pub fn run_export(cfg: &EnhanceConfig, days: Option<u32>, output: Option<&Path>) -> Result<()> {
    let records = HistoryStore::from_config(cfg)?.read_since_days(days);
    let csv = export::records_to_csv(&records);

    match output {
        Some(path) => {
            std::fs::write(path, format!("{csv}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} Exported {} rows to {}",
                "✓".green().bold(),
                records.len(),
                path.display()
            );
        }
        None => println!("{csv}"),
    }
    Ok(())
}

/// List recent analyses with a summary.
pub fn run_history(
    cfg: &EnhanceConfig,
    days: Option<u32>,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let records = HistoryStore::from_config(cfg)?.read_since_days(days);
    let summary = reporter::summarize(&records);
    let recent: Vec<&AnalysisRecord> = records.iter().rev().take(limit).collect();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "summary": summary, "records": recent });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            let rows: Vec<AnalysisRecord> = recent.into_iter().rev().cloned().collect();
            println!("{}", export::records_to_csv(&rows));
        }
        OutputFormat::Table => {
            if records.is_empty() {
                println!("{}", "No analyses recorded yet. Run `enhance analyze` first.".yellow());
                return Ok(());
            }
            println!("{}", "Analysis History".bold().cyan());
            println!("{}", "=".repeat(70));
            println!(
                "  {} {} analyses · {} prompts · avg {:.1}",
                "Total:".bold(),
                format_number(summary.total_analyses),
                summary.distinct_prompts,
                summary.avg_overall
            );
            println!();
            println!("  {:<17} {:>7} {:<14} {}", "Time", "Overall", "Model", "Prompt");
            println!("  {}", "-".repeat(66));
            for r in recent {
                println!(
                    "  {:<17} {:>7} {:<14} {}",
                    r.timestamp.get(..16).unwrap_or(&r.timestamp).replace('T', " "),
                    colorize_score(r.overall_score),
                    truncate(&r.model_used, 14),
                    truncate(&r.prompt, 40),
                );
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// enhance health
// ---------------------------------------------------------------------------

/// Check config files, data files, and the LLM backend.
pub fn run_health(cfg: &EnhanceConfig) -> Result<()> {
    println!("{}", "Enhance Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.enhance/config.toml found"
        } else {
            "not found (run `enhance config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists { ".enhance.toml found" } else { "none (optional)" },
    );
    print_health_item("Profile", true, &cfg.general.profile.to_string());

    match HistoryStore::from_config(cfg) {
        Ok(store) => {
            let exists = store.path().exists();
            let detail = if exists {
                format!("{} analyses", store.read_all().len())
            } else {
                "no history yet".to_string()
            };
            print_health_item("History", exists, &detail);
        }
        Err(e) => print_health_item("History", false, &e.to_string()),
    }

    match TemplateStore::from_config(cfg).map(|s| s.load()) {
        Ok(Ok(list)) => print_health_item("Templates", true, &format!("{} templates", list.len())),
        Ok(Err(e)) => print_health_item("Templates", false, &e.to_string()),
        Err(e) => print_health_item("Templates", false, &e.to_string()),
    }

    match PromptStore::from_config(cfg).map(|s| s.load()) {
        Ok(Ok(list)) => print_health_item("Prompts", true, &format!("{} saved prompts", list.len())),
        Ok(Err(e)) => print_health_item("Prompts", false, &e.to_string()),
        Err(e) => print_health_item("Prompts", false, &e.to_string()),
    }

    print_health_item(
        "LLM backend",
        cfg.llm.enabled,
        if cfg.llm.enabled {
            "enabled"
        } else {
            "disabled (set ENHANCE_USE_AI=1 or use --ai)"
        },
    );

    if cfg.llm.enabled {
        let client = OllamaClient::from_config(&cfg.llm);
        let models = client.list_models();
        let reachable = !models.is_empty();
        print_health_item(
            "Ollama",
            reachable,
            &if reachable {
                format!("reachable at {}", cfg.llm.ollama_url)
            } else {
                "not reachable, is Ollama running?".to_string()
            },
        );
        let pulled = models.iter().any(|m| m == &cfg.llm.model);
        print_health_item(
            "Model",
            pulled,
            &if pulled {
                cfg.llm.model.clone()
            } else {
                format!("{} (not pulled: `ollama pull {}`)", cfg.llm.model, cfg.llm.model)
            },
        );
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// enhance config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Enhance Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (exists, label) in [
        (global_exists, "~/.enhance/config.toml"),
        (project_exists, ".enhance.toml"),
    ] {
        if exists {
            println!("  {} {}", "✓".green(), label.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
        }
    }
    println!("  {} {}", "·".dimmed(), "ENHANCE_* environment variables".dimmed());
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    println!("  {}", "Edit the file to customize enhance.".dimmed());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!("{} Config reset to defaults at {}", "✓".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn ensure_metric(metric: &str) -> Result<()> {
    if history::METRIC_NAMES.contains(&metric) {
        Ok(())
    } else {
        bail!(
            "unknown metric '{metric}' (expected one of: {})",
            history::METRIC_NAMES.join(", ")
        )
    }
}

/// `semantic_clarity` → `Semantic clarity`.
fn metric_title(metric: &str) -> String {
    let spaced = metric.trim_end_matches("_score").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `structural_integrity` → `structural`.
fn short_metric(metric: &str) -> String {
    metric.split('_').next().unwrap_or(metric).to_string()
}

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn colorize_score(score: u32) -> colored::ColoredString {
    let text = score.to_string();
    match score {
        80.. => text.green(),
        60..=79 => text.yellow(),
        _ => text.red(),
    }
}

fn colorize_trend(trend: Trend) -> colored::ColoredString {
    match trend {
        Trend::Up => "▲ up".green(),
        Trend::Down => "▼ down".red(),
        Trend::Stable => "■ stable".normal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
