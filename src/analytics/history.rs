use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzer::DetailedAnalysis;
use crate::config::EnhanceConfig;
use crate::error::StoreError;

const HISTORY_FILE: &str = "analysis-history.jsonl";

// ---------------------------------------------------------------------------
// Analysis record (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the analysis history (`~/.enhance/analysis-history.jsonl`).
///
/// One line per analysis run. The reporter groups these by day for trend
/// series and by prompt label for comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub timestamp: String,
    /// Label of the analyzed prompt (user-supplied name or a text excerpt).
    pub prompt: String,
    pub overall_score: u32,
    pub semantic_clarity: u32,
    pub structural_integrity: u32,
    pub logical_coherence: u32,
    #[serde(default)]
    pub specificity_score: u32,
    #[serde(default)]
    pub instruction_clarity: u32,
    #[serde(default)]
    pub context_completeness: u32,
    #[serde(default = "default_model")]
    pub model_used: String,
    /// Saved prompt this run analyzed, if it came from the prompt library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<Uuid>,
}

fn default_model() -> String {
    "rule-based".to_string()
}

impl AnalysisRecord {
    /// Build a record stamped with the current time.
    pub fn from_analysis(prompt: &str, analysis: &DetailedAnalysis) -> Self {
        let m = &analysis.metrics;
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339(),
            prompt: prompt.to_string(),
            overall_score: m.overall_score,
            semantic_clarity: m.semantic_clarity,
            structural_integrity: m.structural_integrity,
            logical_coherence: m.logical_coherence,
            specificity_score: m.specificity_score,
            instruction_clarity: m.instruction_clarity,
            context_completeness: m.context_completeness,
            model_used: analysis.model_used.clone(),
            prompt_id: None,
        }
    }

    pub fn with_prompt_id(mut self, id: Uuid) -> Self {
        self.prompt_id = Some(id);
        self
    }

    /// Look up a score dimension by its field name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        let v = match name {
            "overall_score" => self.overall_score,
            "semantic_clarity" => self.semantic_clarity,
            "structural_integrity" => self.structural_integrity,
            "logical_coherence" => self.logical_coherence,
            "specificity_score" => self.specificity_score,
            "instruction_clarity" => self.instruction_clarity,
            "context_completeness" => self.context_completeness,
            _ => return None,
        };
        Some(f64::from(v))
    }
}

/// Score dimensions that can be charted or compared.
pub const METRIC_NAMES: &[&str] = &[
    "overall_score",
    "semantic_clarity",
    "structural_integrity",
    "logical_coherence",
    "specificity_score",
    "instruction_clarity",
    "context_completeness",
];

/// Derive a short label from prompt text: first line, at most 40 chars.
pub fn prompt_label(text: &str) -> String {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if first.chars().count() <= 40 {
        first.to_string()
    } else {
        let cut: String = first.chars().take(39).collect();
        format!("{cut}…")
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Append-only JSONL store of analysis records.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store inside the configured data directory.
    pub fn from_config(config: &EnhanceConfig) -> Result<Self, StoreError> {
        let dir = config
            .general
            .data_dir_path()
            .ok_or(StoreError::NoDataDir)?;
        Ok(Self::at(dir.join(HISTORY_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file and parent directory as needed.
    pub fn append(&self, record: &AnalysisRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        writeln!(file, "{json}").map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!(id = %record.id, prompt = %record.prompt, "analysis recorded");
        Ok(())
    }

    /// Raw non-blank lines of the file, undecoded. A missing file has none.
    fn raw_lines(&self) -> Vec<Vec<u8>> {
        let Ok(file) = fs::File::open(&self.path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .split(b'\n')
            .map_while(Result::ok)
            .filter(|line| !line.trim_ascii().is_empty())
            .collect()
    }

    /// Read every record. Lines that are not valid UTF-8 JSON records are
    /// skipped; a missing file reads as empty.
    pub fn read_all(&self) -> Vec<AnalysisRecord> {
        self.raw_lines()
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| match serde_json::from_slice::<AnalysisRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(line = idx + 1, error = %e, "skipping malformed history line");
                    None
                }
            })
            .collect()
    }

    /// Records from the last `days` days, or all of them for `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<AnalysisRecord> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        // A window reaching past the representable range keeps everything.
        let Some(cutoff) = chrono::Duration::try_days(i64::from(days))
            .and_then(|window| Utc::now().checked_sub_signed(window))
        else {
            return entries;
        };

        entries
            .into_iter()
            .filter(|e| {
                chrono::DateTime::parse_from_rfc3339(&e.timestamp)
                    .map(|ts| ts >= cutoff)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<AnalysisRecord> {
        self.read_all().into_iter().find(|r| r.id == id)
    }

    /// Analyses of one saved prompt, oldest first.
    pub fn for_prompt(&self, prompt_id: Uuid) -> Vec<AnalysisRecord> {
        self.read_all()
            .into_iter()
            .filter(|r| r.prompt_id == Some(prompt_id))
            .collect()
    }

    /// Remove a record by id. Returns `false` if it was not present.
    ///
    /// Every other line is written back byte for byte, including lines
    /// that do not parse.
    pub fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let lines = self.raw_lines();
        let before = lines.len();
        let kept: Vec<Vec<u8>> = lines
            .into_iter()
            .filter(|line| line_id(line) != Some(id))
            .collect();
        if kept.len() == before {
            return Ok(false);
        }

        let mut body = Vec::new();
        for line in &kept {
            body.extend_from_slice(line);
            body.push(b'\n');
        }
        fs::write(&self.path, body).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(true)
    }
}

/// Id of a history line, if it carries one.
fn line_id(line: &[u8]) -> Option<Uuid> {
    #[derive(Deserialize)]
    struct IdOnly {
        id: Uuid,
    }

    serde_json::from_slice::<IdOnly>(line).ok().map(|r| r.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(prompt: &str, timestamp: &str, overall: u32) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            timestamp: timestamp.to_string(),
            prompt: prompt.to_string(),
            overall_score: overall,
            semantic_clarity: 70,
            structural_integrity: 60,
            logical_coherence: 72,
            specificity_score: 55,
            instruction_clarity: 63,
            context_completeness: 51,
            model_used: "rule-based".to_string(),
            prompt_id: None,
        }
    }

    #[test]
    fn append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at(dir.path().join("nested").join(HISTORY_FILE));

        let a = record("summarize", "2025-01-15T10:00:00+00:00", 64);
        let b = record("translate", "2025-01-16T10:00:00+00:00", 71);
        store.append(&a).unwrap();
        store.append(&b).unwrap();

        let all = store.read_all();
        assert_eq!(all, vec![a, b]);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at(dir.path().join("absent.jsonl"));
        assert!(store.read_all().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let good = record("ok", "2025-01-15T10:00:00+00:00", 50);
        let body = format!(
            "not json\n{}\n{{\"id\":\"x\"}}\n\n",
            serde_json::to_string(&good).unwrap()
        );
        fs::write(&path, body).unwrap();

        let all = HistoryStore::at(&path).read_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prompt, "ok");
    }

    #[test]
    fn read_since_days_filters_old_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at(dir.path().join(HISTORY_FILE));
        let recent = Utc::now().to_rfc3339();
        store.append(&record("old", "2001-01-01T00:00:00+00:00", 40)).unwrap();
        store.append(&record("new", &recent, 80)).unwrap();

        let filtered = store.read_since_days(Some(7));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].prompt, "new");
        assert_eq!(store.read_since_days(None).len(), 2);
    }

    #[test]
    fn huge_day_window_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at(dir.path().join(HISTORY_FILE));
        store.append(&record("old", "2001-01-01T00:00:00+00:00", 40)).unwrap();

        assert_eq!(store.read_since_days(Some(100_000_000)).len(), 1);
        assert_eq!(store.read_since_days(Some(u32::MAX)).len(), 1);
    }

    #[test]
    fn invalid_utf8_line_does_not_hide_later_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let a = record("a", "2025-01-15T10:00:00+00:00", 50);
        let b = record("b", "2025-01-15T11:00:00+00:00", 60);
        let c = record("c", "2025-01-15T12:00:00+00:00", 70);

        let mut body = Vec::new();
        body.extend_from_slice(serde_json::to_string(&a).unwrap().as_bytes());
        body.extend_from_slice(b"\n\xff\xfe garbage\n");
        for r in [&b, &c] {
            body.extend_from_slice(serde_json::to_string(r).unwrap().as_bytes());
            body.push(b'\n');
        }
        fs::write(&path, body).unwrap();

        let store = HistoryStore::at(&path);
        let prompts: Vec<String> = store.read_all().into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, ["a", "b", "c"]);

        assert!(store.delete(a.id).unwrap());
        let prompts: Vec<String> = store.read_all().into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, ["b", "c"]);

        // The unreadable line is preserved, not dropped by the rewrite.
        let raw = fs::read(&path).unwrap();
        assert!(raw.windows(2).any(|w| w == b"\xff\xfe"));
        assert_eq!(raw.split(|&byte| byte == b'\n').filter(|l| !l.is_empty()).count(), 3);
    }

    #[test]
    fn analyses_filter_by_saved_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at(dir.path().join(HISTORY_FILE));
        let saved = Uuid::new_v4();

        let first = record("saved", "2025-01-15T10:00:00+00:00", 50).with_prompt_id(saved);
        let adhoc = record("adhoc", "2025-01-15T11:00:00+00:00", 60);
        let second = record("saved", "2025-01-16T10:00:00+00:00", 70).with_prompt_id(saved);
        for r in [&first, &adhoc, &second] {
            store.append(r).unwrap();
        }

        assert_eq!(store.for_prompt(saved), vec![first, second]);
        assert!(store.for_prompt(Uuid::new_v4()).is_empty());

        // Unlinked records are written without the field.
        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.matches("prompt_id").count(), 2);
    }

    #[test]
    fn delete_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at(dir.path().join(HISTORY_FILE));
        let a = record("a", "2025-01-15T10:00:00+00:00", 50);
        let b = record("b", "2025-01-15T11:00:00+00:00", 60);
        store.append(&a).unwrap();
        store.append(&b).unwrap();

        assert!(store.delete(a.id).unwrap());
        assert!(!store.delete(a.id).unwrap());
        assert!(store.get(a.id).is_none());
        assert_eq!(store.get(b.id).unwrap().prompt, "b");
    }

    #[test]
    fn metric_lookup_by_name() {
        let r = record("x", "2025-01-15T10:00:00+00:00", 64);
        assert_eq!(r.metric("overall_score"), Some(64.0));
        assert_eq!(r.metric("logical_coherence"), Some(72.0));
        assert_eq!(r.metric("nonsense"), None);
        assert!(METRIC_NAMES.iter().all(|m| r.metric(m).is_some()));
    }

    #[test]
    fn prompt_label_truncates_first_line() {
        assert_eq!(prompt_label("\n  Write a haiku\nabout rust"), "Write a haiku");
        let long = "x".repeat(60);
        let label = prompt_label(&long);
        assert_eq!(label.chars().count(), 40);
        assert!(label.ends_with('…'));
    }
}
