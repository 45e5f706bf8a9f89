//! Reusable prompt templates with `{{variable}}` placeholders.
//!
//! [`Template`] is the stored record; [`store::TemplateStore`] persists the
//! library to a JSON file and implements search, ratings, and usage counts.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TemplateError;

pub mod store;

pub use store::TemplateStore;

/// Matches `{{ name }}` placeholders. Names are identifier-like.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex must compile")
});

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One user's rating of a template. A user has at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRating {
    pub user: String,
    /// 1 to 5.
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub usage_count: u64,
    /// Mean of `ratings`, 0.0 when unrated.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: usize,
    #[serde(default)]
    pub ratings: Vec<TemplateRating>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Template {
    pub fn variables(&self) -> Vec<String> {
        variables(&self.content)
    }

    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, TemplateError> {
        render(&self.content, values)
    }

    /// Recompute `rating` and `rating_count` from `ratings`.
    pub(crate) fn recompute_rating(&mut self) {
        self.rating_count = self.ratings.len();
        self.rating = if self.ratings.is_empty() {
            0.0
        } else {
            let total: u32 = self.ratings.iter().map(|r| u32::from(r.rating)).sum();
            f64::from(total) / self.ratings.len() as f64
        };
    }
}

/// Input for creating a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub is_public: Option<bool>,
}

/// Partial update. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_public: Option<bool>,
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Distinct placeholder names in order of first appearance.
pub fn variables(content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in PLACEHOLDER_RE.captures_iter(content) {
        let name = &cap[1];
        if !out.iter().any(|v| v == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Substitute every placeholder. Fails listing all names without a value;
/// extra values are ignored.
pub fn render(content: &str, values: &HashMap<String, String>) -> Result<String, TemplateError> {
    let missing: Vec<String> = variables(content)
        .into_iter()
        .filter(|v| !values.contains_key(v))
        .collect();
    if !missing.is_empty() {
        return Err(TemplateError::MissingVariables(missing));
    }

    let rendered = PLACEHOLDER_RE.replace_all(content, |cap: &regex::Captures<'_>| {
        values.get(&cap[1]).cloned().unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Parse `key=value` pairs (as given on the command line).
pub fn parse_assignments<'a>(
    pairs: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, String>, String> {
    pairs
        .into_iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| format!("expected key=value, got '{pair}'"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Rating,
    UsageCount,
    Name,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "rating" => Ok(Self::Rating),
            "usage_count" => Ok(Self::UsageCount),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown sort field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// Filters, ordering, and pagination for [`TemplateStore::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Case-insensitive match on name, description or content.
    pub text: Option<String>,
    pub category: Option<String>,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    pub featured: Option<bool>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            tags: Vec::new(),
            featured: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of search results. `total` counts all matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub items: Vec<Template>,
    pub page: usize,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
