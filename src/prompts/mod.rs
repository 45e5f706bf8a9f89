//! The user's saved prompts.
//!
//! A [`Prompt`] is a piece of text worth keeping around and re-scoring as it
//! evolves. Analyses of a saved prompt are linked to it through
//! [`AnalysisRecord::prompt_id`](crate::analytics::history::AnalysisRecord),
//! so each prompt carries its own score history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::history;

pub mod store;

pub use store::PromptStore;

pub const MAX_TITLE_CHARS: usize = 200;
pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Meant to be copied into a template rather than used as is.
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Title, or an excerpt of the content for untitled prompts.
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => history::prompt_label(&self.content),
        }
    }
}

/// Input for saving a prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPrompt {
    pub title: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_template: bool,
    pub is_public: bool,
}

/// Partial update. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_template: Option<bool>,
    pub is_public: Option<bool>,
}

/// Listing filter with offset pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptQuery {
    /// Matched case-insensitively against title and content.
    pub text: Option<String>,
    pub category: Option<String>,
    pub skip: usize,
    /// Clamped to `1..=MAX_PAGE_LIMIT`.
    pub limit: usize,
}

impl Default for PromptQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptPage {
    pub items: Vec<Prompt>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untitled_prompt_labels_from_content() {
        let now = Utc::now();
        let mut prompt = Prompt {
            id: Uuid::new_v4(),
            title: None,
            content: "\nSummarize the attached report for executives.\nKeep it short.".into(),
            category: None,
            tags: Vec::new(),
            is_template: false,
            is_public: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(prompt.label(), "Summarize the attached report for execu…");

        prompt.title = Some("Exec summary".into());
        assert_eq!(prompt.label(), "Exec summary");
    }

    #[test]
    fn stored_prompt_defaults_optional_fields() {
        let json = r#"{
            "id": "5f1d7c36-2f0e-4a43-9d1e-7a4c2b7f0c11",
            "content": "Explain borrowing",
            "created_at": "2025-01-15T10:00:00Z",
            "updated_at": "2025-01-15T10:00:00Z"
        }"#;
        let prompt: Prompt = serde_json::from_str(json).unwrap();
        assert_eq!(prompt.title, None);
        assert!(prompt.tags.is_empty());
        assert!(!prompt.is_template);
        assert!(!prompt.is_public);
    }
}
