//! `enhance template ...` subcommands.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;

use super::{OutputFormat, csv_field, truncate};
use crate::config::EnhanceConfig;
use crate::templates::{self, NewTemplate, SearchQuery, Template, TemplateStore, TemplateUpdate};

/// Rating author when none is given: `$USER`, else "local".
pub fn default_user() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| "local".to_string())
}

pub fn run_template_list(
    cfg: &EnhanceConfig,
    mut query: SearchQuery,
    format: OutputFormat,
) -> Result<()> {
    if query.page_size == 0 {
        query.page_size = cfg.templates.page_size;
    }
    let store = TemplateStore::from_config(cfg)?;
    let page = store.search(&query)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Csv => {
            println!("id,name,category,rating,usage_count,tags");
            for t in &page.items {
                println!(
                    "{},{},{},{:.2},{},{}",
                    t.id,
                    csv_field(&t.name),
                    csv_field(t.category.as_deref().unwrap_or("")),
                    t.rating,
                    t.usage_count,
                    csv_field(&t.tags.join(" ")),
                );
            }
        }
        OutputFormat::Table => {
            if page.items.is_empty() {
                println!("{}", "No templates found. Add one with `enhance template add`.".yellow());
                return Ok(());
            }
            println!("{}", "Prompt Templates".bold().cyan());
            println!("{}", "=".repeat(70));
            println!(
                "  {:<28} {:<14} {:>6} {:>6}  {}",
                "Name", "Category", "Rating", "Uses", "Tags"
            );
            println!("  {}", "-".repeat(66));
            for t in &page.items {
                let star = if t.is_featured { "★ " } else { "" };
                println!(
                    "  {:<28} {:<14} {:>6} {:>6}  {}",
                    truncate(&format!("{star}{}", t.name), 28),
                    truncate(t.category.as_deref().unwrap_or("-"), 14),
                    format_rating(t),
                    t.usage_count,
                    t.tags.join(", ").dimmed(),
                );
            }
            let pages = page.total.div_ceil(query.page_size.max(1)).max(1);
            println!();
            println!(
                "  {}",
                format!("Page {} of {} · {} templates", page.page, pages, page.total).dimmed()
            );
        }
    }
    Ok(())
}

pub fn run_template_show(cfg: &EnhanceConfig, id_or_name: &str, format: OutputFormat) -> Result<()> {
    let store = TemplateStore::from_config(cfg)?;
    let t = store.resolve(id_or_name)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&t)?);
        return Ok(());
    }

    println!("{}", t.name.bold().cyan());
    println!("{}", "=".repeat(50));
    if !t.description.is_empty() {
        println!("  {}", t.description);
    }
    println!("  {} {}", "Id:".dimmed(), t.id);
    if let Some(category) = &t.category {
        println!("  {} {}", "Category:".dimmed(), category);
    }
    if !t.tags.is_empty() {
        println!("  {} {}", "Tags:".dimmed(), t.tags.join(", "));
    }
    println!(
        "  {} {} ({} ratings) · used {} times",
        "Rating:".dimmed(),
        format_rating(&t),
        t.rating_count,
        t.usage_count
    );
    let vars = t.variables();
    if !vars.is_empty() {
        println!("  {} {}", "Variables:".dimmed(), vars.join(", "));
    }
    println!();
    println!("{}", t.content);
    Ok(())
}

pub fn run_template_add(cfg: &EnhanceConfig, new: NewTemplate) -> Result<()> {
    let store = TemplateStore::from_config(cfg)?;
    let t = store.create(new)?;
    println!("{} Added template {} ({})", "✓".green().bold(), t.name.bold(), t.id);
    let vars = t.variables();
    if !vars.is_empty() {
        println!("  {} {}", "Variables:".dimmed(), vars.join(", "));
    }
    Ok(())
}

pub fn run_template_update(cfg: &EnhanceConfig, id_or_name: &str, update: TemplateUpdate) -> Result<()> {
    let store = TemplateStore::from_config(cfg)?;
    let id = store.resolve(id_or_name)?.id;
    let t = store.update(id, update)?;
    println!("{} Updated template {}", "✓".green().bold(), t.name.bold());
    Ok(())
}

/// Render with `key=value` assignments and count it as a use.
pub fn run_template_render(cfg: &EnhanceConfig, id_or_name: &str, assignments: &[String]) -> Result<()> {
    let values = templates::parse_assignments(assignments.iter().map(String::as_str))
        .map_err(|e| anyhow!(e))?;
    let store = TemplateStore::from_config(cfg)?;
    let t = store.resolve(id_or_name)?;
    let rendered = t.render(&values)?;
    store
        .record_use(t.id)
        .context("failed to update template usage count")?;
    println!("{rendered}");
    Ok(())
}

pub fn run_template_rate(
    cfg: &EnhanceConfig,
    id_or_name: &str,
    rating: u8,
    comment: Option<String>,
    user: Option<String>,
) -> Result<()> {
    let store = TemplateStore::from_config(cfg)?;
    let id = store.resolve(id_or_name)?.id;
    let user = user.unwrap_or_else(default_user);
    let t = store.rate(id, &user, rating, comment)?;
    println!(
        "{} Rated {} {} · now {} from {} ratings",
        "✓".green().bold(),
        t.name.bold(),
        stars(rating),
        format_rating(&t),
        t.rating_count
    );
    Ok(())
}

pub fn run_template_delete(cfg: &EnhanceConfig, id_or_name: &str) -> Result<()> {
    let store = TemplateStore::from_config(cfg)?;
    let t = store.resolve(id_or_name)?;
    store.delete(t.id)?;
    println!("{} Deleted template {}", "✓".green().bold(), t.name.bold());
    Ok(())
}

pub fn run_template_categories(cfg: &EnhanceConfig, format: OutputFormat) -> Result<()> {
    let store = TemplateStore::from_config(cfg)?;
    let categories = store.categories()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&categories)?),
        OutputFormat::Csv => {
            println!("category,count");
            for (name, count) in &categories {
                println!("{},{}", csv_field(name), count);
            }
        }
        OutputFormat::Table => {
            println!("{}", "Template Categories".bold().cyan());
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

fn format_rating(t: &Template) -> String {
    if t.rating_count == 0 {
        "-".to_string()
    } else {
        format!("{:.1}", t.rating)
    }
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(5), "★★★★★");
    }

    #[test]
    fn test_format_rating_unrated() {
        let store_dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::at(store_dir.path().join("templates.json"));
        let t = store
            .create(NewTemplate {
                name: "Summary".to_string(),
                content: "Summarize {{text}}".to_string(),
                ..NewTemplate::default()
            })
            .unwrap();
        assert_eq!(format_rating(&t), "-");

        let rated = store.rate(t.id, "ana", 4, None).unwrap();
        assert_eq!(format_rating(&rated), "4.0");
    }
}
