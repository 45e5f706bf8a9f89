//! JSON-file persistence for saved prompts (`~/.enhance/prompts.json`).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::{MAX_PAGE_LIMIT, MAX_TITLE_CHARS, NewPrompt, Prompt, PromptPage, PromptQuery, PromptUpdate};
use crate::config::EnhanceConfig;
use crate::error::{PromptError, StoreError};
use crate::templates::store::normalize_tags;

const PROMPTS_FILE: &str = "prompts.json";

#[derive(Debug, Clone)]
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &EnhanceConfig) -> Result<Self, StoreError> {
        let dir = config
            .general
            .data_dir_path()
            .ok_or(StoreError::NoDataDir)?;
        Ok(Self::at(dir.join(PROMPTS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All prompts in creation order. A missing file is an empty library.
    pub fn load(&self) -> Result<Vec<Prompt>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, prompts: &[Prompt]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(prompts)?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }

    pub fn create(&self, new: NewPrompt) -> Result<Prompt, PromptError> {
        if new.content.trim().is_empty() {
            return Err(PromptError::EmptyContent);
        }
        let title = clean_title(new.title)?;

        let now = Utc::now();
        let prompt = Prompt {
            id: Uuid::new_v4(),
            title,
            content: new.content,
            category: clean_category(new.category),
            tags: normalize_tags(new.tags),
            is_template: new.is_template,
            is_public: new.is_public,
            created_at: now,
            updated_at: now,
        };

        let mut prompts = self.load()?;
        prompts.push(prompt.clone());
        self.save(&prompts)?;

        tracing::debug!(id = %prompt.id, "prompt saved");
        Ok(prompt)
    }

    pub fn get(&self, id: Uuid) -> Result<Prompt, PromptError> {
        self.load()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PromptError::NotFound(id.to_string()))
    }

    /// Look up by UUID, falling back to the first case-insensitive title match.
    pub fn resolve(&self, id_or_title: &str) -> Result<Prompt, PromptError> {
        if let Ok(id) = Uuid::parse_str(id_or_title) {
            return self.get(id);
        }
        let wanted = id_or_title.trim();
        self.load()?
            .into_iter()
            .find(|p| {
                p.title
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| PromptError::NotFound(id_or_title.to_string()))
    }

    /// Apply `update`. An empty title or category clears it.
    pub fn update(&self, id: Uuid, update: PromptUpdate) -> Result<Prompt, PromptError> {
        if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(PromptError::EmptyContent);
        }
        let title = update.title.map(|t| clean_title(Some(t))).transpose()?;

        let mut prompts = self.load()?;
        let prompt = prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PromptError::NotFound(id.to_string()))?;

        if let Some(title) = title {
            prompt.title = title;
        }
        if let Some(content) = update.content {
            prompt.content = content;
        }
        if let Some(category) = update.category {
            prompt.category = clean_category(Some(category));
        }
        if let Some(tags) = update.tags {
            prompt.tags = normalize_tags(tags);
        }
        if let Some(is_template) = update.is_template {
            prompt.is_template = is_template;
        }
        if let Some(is_public) = update.is_public {
            prompt.is_public = is_public;
        }
        prompt.updated_at = Utc::now();

        let updated = prompt.clone();
        self.save(&prompts)?;
        Ok(updated)
    }

    /// Remove a prompt. Its analyses stay in the history.
    pub fn delete(&self, id: Uuid) -> Result<(), PromptError> {
        let mut prompts = self.load()?;
        let before = prompts.len();
        prompts.retain(|p| p.id != id);
        if prompts.len() == before {
            return Err(PromptError::NotFound(id.to_string()));
        }
        self.save(&prompts)?;
        Ok(())
    }

    /// Newest first, filtered, then paged by `skip` and `limit`.
    pub fn list(&self, query: &PromptQuery) -> Result<PromptPage, StoreError> {
        let needle = query
            .text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<Prompt> = self
            .load()?
            .into_iter()
            .filter(|p| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| p.category.as_deref() == Some(c))
            })
            .filter(|p| {
                needle.as_deref().is_none_or(|n| {
                    p.content.to_lowercase().contains(n)
                        || p.title.as_deref().is_some_and(|t| t.to_lowercase().contains(n))
                })
            })
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len();
        let limit = query.limit.clamp(1, MAX_PAGE_LIMIT);
        let items = matches.into_iter().skip(query.skip).take(limit).collect();

        Ok(PromptPage {
            items,
            total,
            skip: query.skip,
            limit,
        })
    }

    /// Category names with prompt counts, most populated first.
    pub fn categories(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for p in self.load()? {
            let Some(category) = p.category else {
                continue;
            };
            match counts.iter_mut().find(|(c, _)| *c == category) {
                Some((_, n)) => *n += 1,
                None => counts.push((category, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }
}

fn clean_title(title: Option<String>) -> Result<Option<String>, PromptError> {
    let Some(title) = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(PromptError::TitleTooLong {
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(Some(title))
}

fn clean_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
