//! `enhance prompt ...` subcommands.

use anyhow::Result;
use colored::Colorize;

use super::{
    OutputFormat, colorize_score, csv_field, print_analysis_csv, print_analysis_table, record,
    truncate,
};
use crate::analytics::export;
use crate::analytics::history::{AnalysisRecord, HistoryStore};
use crate::analyzer::PromptAnalyzer;
use crate::config::EnhanceConfig;
use crate::prompts::{NewPrompt, PromptQuery, PromptStore, PromptUpdate};

pub fn run_prompt_list(cfg: &EnhanceConfig, query: PromptQuery, format: OutputFormat) -> Result<()> {
    let page = PromptStore::from_config(cfg)?.list(&query)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Csv => {
            println!("id,title,category,tags,created_at");
            for p in &page.items {
                println!(
                    "{},{},{},{},{}",
                    p.id,
                    csv_field(p.title.as_deref().unwrap_or("")),
                    csv_field(p.category.as_deref().unwrap_or("")),
                    csv_field(&p.tags.join(" ")),
                    p.created_at.to_rfc3339(),
                );
            }
        }
        OutputFormat::Table => {
            if page.items.is_empty() {
                println!("{}", "No saved prompts. Add one with `enhance prompt add`.".yellow());
                return Ok(());
            }
            println!("{}", "Saved Prompts".bold().cyan());
            println!("{}", "=".repeat(70));
            println!("  {:<36} {:<14} {:<10}  {}", "Prompt", "Category", "Created", "Id");
            println!("  {}", "-".repeat(66));
            for p in &page.items {
                println!(
                    "  {:<36} {:<14} {:<10}  {}",
                    truncate(&p.label(), 36),
                    truncate(p.category.as_deref().unwrap_or("-"), 14),
                    p.created_at.format("%Y-%m-%d"),
                    p.id.to_string().dimmed(),
                );
            }
            println!();
            let shown_to = page.skip.saturating_add(page.items.len());
            println!(
                "  {}",
                format!("{}-{} of {} prompts", page.skip + 1, shown_to, page.total).dimmed()
            );
        }
    }
    Ok(())
}

/// Show a saved prompt with its latest score.
pub fn run_prompt_show(cfg: &EnhanceConfig, id_or_title: &str, format: OutputFormat) -> Result<()> {
    let p = PromptStore::from_config(cfg)?.resolve(id_or_title)?;
    let latest = HistoryStore::from_config(cfg)?.for_prompt(p.id).pop();

    if format == OutputFormat::Json {
        let value = serde_json::json!({ "prompt": p, "latest_analysis": latest });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", p.label().bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Id:".dimmed(), p.id);
    if let Some(category) = &p.category {
        println!("  {} {}", "Category:".dimmed(), category);
    }
    if !p.tags.is_empty() {
        println!("  {} {}", "Tags:".dimmed(), p.tags.join(", "));
    }
    match &latest {
        Some(r) => println!(
            "  {} {} ({})",
            "Last score:".dimmed(),
            colorize_score(r.overall_score),
            r.timestamp.get(..10).unwrap_or(&r.timestamp)
        ),
        None => println!("  {} {}", "Last score:".dimmed(), "not analyzed yet".dimmed()),
    }
    println!();
    println!("{}", p.content);
    Ok(())
}

pub fn run_prompt_add(cfg: &EnhanceConfig, new: NewPrompt) -> Result<()> {
    let p = PromptStore::from_config(cfg)?.create(new)?;
    println!("{} Saved prompt {} ({})", "✓".green().bold(), p.label().bold(), p.id);
    Ok(())
}

pub fn run_prompt_update(cfg: &EnhanceConfig, id_or_title: &str, update: PromptUpdate) -> Result<()> {
    let store = PromptStore::from_config(cfg)?;
    let id = store.resolve(id_or_title)?.id;
    let p = store.update(id, update)?;
    println!("{} Updated prompt {}", "✓".green().bold(), p.label().bold());
    Ok(())
}

pub fn run_prompt_delete(cfg: &EnhanceConfig, id_or_title: &str) -> Result<()> {
    let store = PromptStore::from_config(cfg)?;
    let p = store.resolve(id_or_title)?;
    store.delete(p.id)?;
    println!("{} Deleted prompt {}", "✓".green().bold(), p.label().bold());
    Ok(())
}

/// Score a saved prompt and link the result to it in history.
pub fn run_prompt_analyze(
    cfg: &EnhanceConfig,
    id_or_title: &str,
    save: bool,
    format: OutputFormat,
) -> Result<()> {
    let p = PromptStore::from_config(cfg)?.resolve(id_or_title)?;
    let analysis = PromptAnalyzer::from_config(cfg).analyze(&p.content, cfg.analysis.use_ai);
    let entry = AnalysisRecord::from_analysis(&p.label(), &analysis).with_prompt_id(p.id);
    record(cfg, entry, save)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Csv => print_analysis_csv(&analysis),
        OutputFormat::Table => print_analysis_table(&analysis),
    }
    Ok(())
}

/// Every recorded analysis of one saved prompt, oldest first.
pub fn run_prompt_history(cfg: &EnhanceConfig, id_or_title: &str, format: OutputFormat) -> Result<()> {
    let p = PromptStore::from_config(cfg)?.resolve(id_or_title)?;
    let records = HistoryStore::from_config(cfg)?.for_prompt(p.id);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Csv => println!("{}", export::records_to_csv(&records)),
        OutputFormat::Table => {
            println!("{} {}", "Score history:".bold().cyan(), p.label().bold());
            println!("{}", "=".repeat(60));
            if records.is_empty() {
                println!(
                    "  {}",
                    "No analyses yet. Run `enhance prompt analyze` first.".dimmed()
                );
                return Ok(());
            }
            println!("  {:<17} {:>7} {:>7} {:>7}  {}", "Time", "Overall", "Clarity", "Specif.", "Model");
            println!("  {}", "-".repeat(56));
            for r in &records {
                println!(
                    "  {:<17} {:>7} {:>7} {:>7}  {}",
                    r.timestamp.get(..16).unwrap_or(&r.timestamp).replace('T', " "),
                    colorize_score(r.overall_score),
                    colorize_score(r.semantic_clarity),
                    colorize_score(r.specificity_score),
                    r.model_used.dimmed(),
                );
            }
            if let (Some(first), Some(last)) = (records.first(), records.last()) {
                let delta = i64::from(last.overall_score) - i64::from(first.overall_score);
                println!();
                println!("  {} {:+} since first analysis", "Change:".dimmed(), delta);
            }
        }
    }
    Ok(())
}

pub fn run_prompt_categories(cfg: &EnhanceConfig, format: OutputFormat) -> Result<()> {
    let categories = PromptStore::from_config(cfg)?.categories()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&categories)?),
        OutputFormat::Csv => {
            println!("category,count");
            for (name, count) in &categories {
                println!("{},{}", csv_field(name), count);
            }
        }
        OutputFormat::Table => {
            println!("{}", "Prompt Categories".bold().cyan());
            println!("{}", "=".repeat(40));
            if categories.is_empty() {
                println!("  {}", "none yet".dimmed());
            }
            for (name, count) in &categories {
                println!("  {:<28} {:>5}", name, count);
            }
        }
    }
    Ok(())
}
