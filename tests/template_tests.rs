use std::collections::HashMap;

use enhance::error::TemplateError;
use enhance::templates::{self, NewTemplate, SearchQuery, SortField, SortOrder, TemplateStore};

fn new_template(name: &str, content: &str, tags: &[&str]) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        content: content.to_string(),
        category: Some("writing".to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..NewTemplate::default()
    }
}

#[test]
fn library_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("templates.json");

    let created = TemplateStore::at(&path)
        .create(new_template("Email", "Dear {{name}},", &["Mail", "mail", " formal "]))
        .unwrap();
    assert_eq!(created.tags, vec!["mail", "formal"]);

    let reopened = TemplateStore::at(&path);
    let loaded = reopened.resolve("EMAIL").unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.variables(), vec!["name"]);
}

#[test]
fn render_then_use_drives_popularity() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::at(dir.path().join("templates.json"));

    let review = store
        .create(new_template("Review", "Review this {{language}} code:\n{{code}}", &["code"]))
        .unwrap();
    store
        .create(new_template("Summary", "Summarize {{text}}", &["writing"]))
        .unwrap();

    let mut values = HashMap::new();
    values.insert("language".to_string(), "Rust".to_string());
    let err = review.render(&values).unwrap_err();
    assert!(matches!(err, TemplateError::MissingVariables(ref v) if v == &["code"]));

    values.insert("code".to_string(), "fn main() {}".to_string());
    let rendered = templates::render(&review.content, &values).unwrap();
    assert_eq!(rendered, "Review this Rust code:\nfn main() {}");

    store.record_use(review.id).unwrap();
    store.record_use(review.id).unwrap();

    let popular = store.popular(5).unwrap();
    assert_eq!(popular[0].name, "Review");
    assert_eq!(popular[0].usage_count, 2);
}

#[test]
fn search_by_tag_is_case_insensitive_and_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::at(dir.path().join("templates.json"));
    store.create(new_template("Beta", "b", &["shared"])).unwrap();
    store.create(new_template("Alpha", "a", &["shared"])).unwrap();
    store.create(new_template("Gamma", "g", &["other"])).unwrap();

    let page = store
        .search(&SearchQuery {
            tags: vec!["Shared".to_string()],
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
            ..SearchQuery::default()
        })
        .unwrap();

    assert_eq!(page.total, 2);
    let names: Vec<&str> = page.items.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta"]);
}

#[test]
fn ratings_average_across_users() {
    let dir = tempfile::tempdir().unwrap();
    let store = TemplateStore::at(dir.path().join("templates.json"));
    let t = store.create(new_template("Plan", "Plan {{goal}}", &[])).unwrap();

    store.rate(t.id, "ana", 5, None).unwrap();
    store.rate(t.id, "ben", 2, Some("too vague".to_string())).unwrap();
    let rated = store.rate(t.id, "ben", 3, None).unwrap();

    assert_eq!(rated.rating_count, 2);
    assert!((rated.rating - 4.0).abs() < 1e-9);
    assert!(matches!(
        store.rate(t.id, "ana", 0, None),
        Err(TemplateError::InvalidRating(0))
    ));
}
