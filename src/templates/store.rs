//! JSON-file persistence for the template library.
//!
//! The whole library lives in one pretty-printed JSON array
//! (`~/.enhance/templates.json`). Every mutating call loads, edits, and
//! rewrites the file; the library is small and the process is short-lived.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::{
    NewTemplate, SearchPage, SearchQuery, SortField, SortOrder, Template, TemplateRating,
    TemplateUpdate,
};
use crate::config::EnhanceConfig;
use crate::error::{StoreError, TemplateError};

const TEMPLATES_FILE: &str = "templates.json";

#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &EnhanceConfig) -> Result<Self, StoreError> {
        let dir = config
            .general
            .data_dir_path()
            .ok_or(StoreError::NoDataDir)?;
        Ok(Self::at(dir.join(TEMPLATES_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -----------------------------------------------------------------------
    // File I/O
    // -----------------------------------------------------------------------

    /// All templates. A missing file is an empty library.
    pub fn load(&self) -> Result<Vec<Template>, StoreError> {
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

    fn save(&self, templates: &[Template]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(templates)?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Load, apply `edit` to the template with `id`, save, and return the
    /// edited copy.
    fn modify(
        &self,
        id: Uuid,
        edit: impl FnOnce(&mut Template) -> Result<(), TemplateError>,
    ) -> Result<Template, TemplateError> {
        let mut templates = self.load()?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;
        edit(template)?;
        let updated = template.clone();
        self.save(&templates)?;
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    pub fn create(&self, new: NewTemplate) -> Result<Template, TemplateError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if new.content.trim().is_empty() {
            return Err(TemplateError::EmptyContent);
        }

        let mut templates = self.load()?;
        if templates.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
            return Err(TemplateError::DuplicateName(name));
        }

        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            name,
            description: new.description,
            content: new.content,
            category: new.category.filter(|c| !c.trim().is_empty()),
            tags: normalize_tags(new.tags),
            usage_count: 0,
            rating: 0.0,
            rating_count: 0,
            ratings: Vec::new(),
            is_featured: new.is_featured,
            is_public: new.is_public.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        templates.push(template.clone());
        self.save(&templates)?;

        tracing::debug!(id = %template.id, name = %template.name, "template created");
        Ok(template)
    }

    pub fn get(&self, id: Uuid) -> Result<Template, TemplateError> {
        self.load()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// Look up by UUID, falling back to a case-insensitive name match.
    pub fn resolve(&self, id_or_name: &str) -> Result<Template, TemplateError> {
        if let Ok(id) = Uuid::parse_str(id_or_name) {
            return self.get(id);
        }
        self.load()?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(id_or_name.trim()))
            .ok_or_else(|| TemplateError::NotFound(id_or_name.to_string()))
    }

    pub fn update(&self, id: Uuid, update: TemplateUpdate) -> Result<Template, TemplateError> {
        if let Some(name) = &update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyName);
            }
            let clash = self
                .load()?
                .iter()
                .any(|t| t.id != id && t.name.eq_ignore_ascii_case(name));
            if clash {
                return Err(TemplateError::DuplicateName(name.to_string()));
            }
        }
        if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(TemplateError::EmptyContent);
        }

        self.modify(id, |t| {
            if let Some(name) = update.name {
                t.name = name.trim().to_string();
            }
            if let Some(description) = update.description {
                t.description = description;
            }
            if let Some(content) = update.content {
                t.content = content;
            }
            if let Some(category) = update.category {
                t.category = Some(category).filter(|c| !c.trim().is_empty());
            }
            if let Some(tags) = update.tags {
                t.tags = normalize_tags(tags);
            }
            if let Some(featured) = update.is_featured {
                t.is_featured = featured;
            }
            if let Some(public) = update.is_public {
                t.is_public = public;
            }
            t.updated_at = Utc::now();
            Ok(())
        })
    }

    pub fn delete(&self, id: Uuid) -> Result<(), TemplateError> {
        let mut templates = self.load()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Err(TemplateError::NotFound(id.to_string()));
        }
        self.save(&templates)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn search(&self, query: &SearchQuery) -> Result<SearchPage, StoreError> {
        let needle = query
            .text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<Template> = self
            .load()?
            .into_iter()
            .filter(|t| {
                needle.as_deref().is_none_or(|n| {
                    t.name.to_lowercase().contains(n)
                        || t.description.to_lowercase().contains(n)
                        || t.content.to_lowercase().contains(n)
                })
            })
            .filter(|t| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|c| t.category.as_deref() == Some(c))
            })
            .filter(|t| {
                query
                    .tags
                    .iter()
                    .all(|tag| t.tags.contains(&tag.trim().to_lowercase()))
            })
            .filter(|t| query.featured.is_none_or(|f| t.is_featured == f))
            .collect();

        sort_templates(&mut matches, query.sort_by, query.sort_order);

        let total = matches.len();
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let items = matches
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Ok(SearchPage { items, page, total })
    }

    /// Public templates by usage, then rating.
    pub fn popular(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        let mut list: Vec<Template> = self.load()?.into_iter().filter(|t| t.is_public).collect();
        list.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| b.rating.total_cmp(&a.rating))
        });
        list.truncate(limit);
        Ok(list)
    }

    /// Featured public templates, newest first.
    pub fn featured(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        let mut list: Vec<Template> = self
            .load()?
            .into_iter()
            .filter(|t| t.is_public && t.is_featured)
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list.truncate(limit);
        Ok(list)
    }

    /// Public templates, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        let mut list: Vec<Template> = self.load()?.into_iter().filter(|t| t.is_public).collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list.truncate(limit);
        Ok(list)
    }

    /// Category names with template counts, most populated first.
    pub fn categories(&self) -> Result<Vec<(String, usize)>, StoreError> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for t in self.load()? {
            let Some(category) = t.category else {
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

    // -----------------------------------------------------------------------
    // Usage and ratings
    // -----------------------------------------------------------------------

    pub fn record_use(&self, id: Uuid) -> Result<Template, TemplateError> {
        self.modify(id, |t| {
            t.usage_count += 1;
            Ok(())
        })
    }

    /// Add or replace `user`'s rating and recompute the mean.
    pub fn rate(
        &self,
        id: Uuid,
        user: &str,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Template, TemplateError> {
        if !(1..=5).contains(&rating) {
            return Err(TemplateError::InvalidRating(rating));
        }

        self.modify(id, |t| {
            let now = Utc::now();
            match t.ratings.iter_mut().find(|r| r.user == user) {
                Some(existing) => {
                    existing.rating = rating;
                    existing.comment = comment;
                    existing.updated_at = now;
                }
                None => t.ratings.push(TemplateRating {
                    user: user.to_string(),
                    rating,
                    comment,
                    created_at: now,
                    updated_at: now,
                }),
            }
            t.recompute_rating();
            Ok(())
        })
    }
}

pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn sort_templates(list: &mut [Template], field: SortField, order: SortOrder) {
    list.sort_by(|a, b| {
        let ord = match field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Rating => a.rating.total_cmp(&b.rating),
            SortField::UsageCount => a.usage_count.cmp(&b.usage_count),
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::at(dir.path().join(TEMPLATES_FILE));
        (dir, store)
    }

    fn new(name: &str, category: &str, tags: &[&str]) -> NewTemplate {
        NewTemplate {
            name: name.to_string(),
            description: format!("{name} description"),
            content: format!("{name}: {{{{topic}}}}"),
            category: Some(category.to_string()),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            ..NewTemplate::default()
        }
    }

    #[test]
    fn create_get_and_resolve() {
        let (_dir, store) = store();
        let t = store.create(new("Blog Outline", "writing", &["Blog", " seo ", "blog"])).unwrap();
        assert_eq!(t.tags, vec!["blog", "seo"]);
        assert!(t.is_public);
        assert_eq!(t.variables(), vec!["topic"]);

        assert_eq!(store.get(t.id).unwrap(), t);
        assert_eq!(store.resolve("blog outline").unwrap().id, t.id);
        assert_eq!(store.resolve(&t.id.to_string()).unwrap().id, t.id);
        assert!(matches!(store.resolve("nope"), Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn create_validates_input() {
        let (_dir, store) = store();
        assert!(matches!(store.create(new("  ", "x", &[])), Err(TemplateError::EmptyName)));

        let mut empty = new("A", "x", &[]);
        empty.content = "   ".to_string();
        assert!(matches!(store.create(empty), Err(TemplateError::EmptyContent)));

        store.create(new("A", "x", &[])).unwrap();
        assert!(matches!(store.create(new("a", "x", &[])), Err(TemplateError::DuplicateName(_))));
    }

    #[test]
    fn update_and_delete() {
        let (_dir, store) = store();
        let t = store.create(new("A", "x", &[])).unwrap();
        let other = store.create(new("B", "x", &[])).unwrap();

        let updated = store
            .update(
                t.id,
                TemplateUpdate {
                    description: Some("new".to_string()),
                    is_featured: Some(true),
                    ..TemplateUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.description, "new");
        assert!(updated.is_featured);
        assert!(updated.updated_at >= t.updated_at);

        let rename = TemplateUpdate {
            name: Some("b".to_string()),
            ..TemplateUpdate::default()
        };
        assert!(matches!(store.update(t.id, rename), Err(TemplateError::DuplicateName(_))));

        store.delete(other.id).unwrap();
        assert!(matches!(store.delete(other.id), Err(TemplateError::NotFound(_))));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn search_filters_sorts_and_paginates() {
        let (_dir, store) = store();
        let a = store.create(new("Alpha", "writing", &["blog", "seo"])).unwrap();
        let b = store.create(new("Beta", "writing", &["blog"])).unwrap();
        store.create(new("Gamma", "coding", &["rust"])).unwrap();
        store.record_use(b.id).unwrap();
        store.record_use(b.id).unwrap();
        store.record_use(a.id).unwrap();

        let page = store
            .search(&SearchQuery {
                category: Some("writing".to_string()),
                sort_by: SortField::UsageCount,
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].name, "Beta");

        let page = store
            .search(&SearchQuery {
                tags: vec!["blog".to_string(), "seo".to_string()],
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Alpha");

        let page = store
            .search(&SearchQuery {
                text: Some("GAMMA".to_string()),
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(page.total, 1);

        let page = store
            .search(&SearchQuery {
                sort_by: SortField::Name,
                sort_order: SortOrder::Asc,
                page: 2,
                page_size: 2,
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Gamma");
    }

    #[test]
    fn page_far_past_the_end_is_empty() {
        let (_dir, store) = store();
        store.create(new("Alpha", "writing", &[])).unwrap();

        let page = store
            .search(&SearchQuery {
                page: usize::MAX,
                page_size: 20,
                ..SearchQuery::default()
            })
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.page, usize::MAX);
        assert!(page.items.is_empty());
    }

    #[test]
    fn ratings_upsert_per_user() {
        let (_dir, store) = store();
        let t = store.create(new("A", "x", &[])).unwrap();

        store.rate(t.id, "ana", 5, None).unwrap();
        let rated = store.rate(t.id, "ben", 2, Some("meh".to_string())).unwrap();
        assert_eq!(rated.rating_count, 2);
        assert_eq!(rated.rating, 3.5);

        let rated = store.rate(t.id, "ben", 4, None).unwrap();
        assert_eq!(rated.rating_count, 2);
        assert_eq!(rated.rating, 4.5);

        assert!(matches!(store.rate(t.id, "ana", 0, None), Err(TemplateError::InvalidRating(0))));
        assert!(matches!(store.rate(t.id, "ana", 6, None), Err(TemplateError::InvalidRating(6))));
    }

    #[test]
    fn popular_featured_recent_and_categories() {
        let (_dir, store) = store();
        let a = store.create(new("A", "writing", &[])).unwrap();
        let b = store.create(new("B", "writing", &[])).unwrap();
        let mut hidden = new("C", "coding", &[]);
        hidden.is_public = Some(false);
        hidden.is_featured = true;
        store.create(hidden).unwrap();

        store.record_use(b.id).unwrap();
        store.rate(a.id, "u", 5, None).unwrap();
        store
            .update(a.id, TemplateUpdate { is_featured: Some(true), ..TemplateUpdate::default() })
            .unwrap();

        let popular = store.popular(10).unwrap();
        assert_eq!(popular.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["B", "A"]);

        let featured = store.featured(10).unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].name, "A");

        assert_eq!(store.recent(1).unwrap().len(), 1);

        let cats = store.categories().unwrap();
        assert_eq!(cats, vec![("writing".to_string(), 2), ("coding".to_string(), 1)]);
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let (_dir, store) = store();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Decode { .. })));
    }
}
