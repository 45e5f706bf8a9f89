//! Side-by-side comparison and ranking of scored entities.
//!
//! An entity (typically a prompt) carries a map of metric name → value. The
//! ranking score is the mean over a fixed metric list, and the list itself
//! is summarised into best/worst metrics across all entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named entity with its metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntity {
    pub name: String,
    pub metrics: HashMap<String, f64>,
}

impl ComparisonEntity {
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        metrics: impl IntoIterator<Item = (K, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            metrics: metrics.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Mean over `metrics`. A missing metric contributes zero but still
    /// counts in the divisor. An empty metric list scores zero.
    pub fn avg_score(&self, metrics: &[String]) -> f64 {
        if metrics.is_empty() {
            return 0.0;
        }
        let total: f64 = metrics
            .iter()
            .map(|m| self.metrics.get(m).copied().unwrap_or(0.0))
            .sum();
        total / metrics.len() as f64
    }
}

/// One row of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    /// 1-based position.
    pub rank: usize,
    pub name: String,
    pub avg_score: f64,
    pub metrics: HashMap<String, f64>,
}

/// Cross-entity mean for a single metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: String,
    pub mean: f64,
}

/// Full comparison output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub ranking: Vec<RankedEntity>,
    pub metric_means: Vec<MetricSummary>,
    pub best_metric: Option<MetricSummary>,
    pub worst_metric: Option<MetricSummary>,
}

/// Rank entities by mean score (descending) and summarise each metric.
///
/// Equal scores keep their input order. When several metrics tie for best
/// or worst, the one listed first wins.
pub fn compare(entities: &[ComparisonEntity], metrics: &[String]) -> Comparison {
    let mut scored: Vec<(f64, &ComparisonEntity)> = entities
        .iter()
        .map(|e| (e.avg_score(metrics), e))
        .collect();

    // `sort_by` is stable, which is what keeps ties in insertion order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let ranking = scored
        .into_iter()
        .enumerate()
        .map(|(i, (avg_score, e))| RankedEntity {
            rank: i + 1,
            name: e.name.clone(),
            avg_score,
            metrics: e.metrics.clone(),
        })
        .collect();

    let metric_means = metric_means(entities, metrics);
    let best_metric = pick(&metric_means, |candidate, current| candidate > current);
    let worst_metric = pick(&metric_means, |candidate, current| candidate < current);

    Comparison {
        ranking,
        metric_means,
        best_metric,
        worst_metric,
    }
}

/// Per-metric mean across all entities, missing values counted as zero.
/// Empty when there are no entities.
pub fn metric_means(entities: &[ComparisonEntity], metrics: &[String]) -> Vec<MetricSummary> {
    if entities.is_empty() {
        return Vec::new();
    }
    metrics
        .iter()
        .map(|metric| {
            let total: f64 = entities
                .iter()
                .map(|e| e.metrics.get(metric).copied().unwrap_or(0.0))
                .sum();
            MetricSummary {
                metric: metric.clone(),
                mean: total / entities.len() as f64,
            }
        })
        .collect()
}

fn pick(summaries: &[MetricSummary], better: impl Fn(f64, f64) -> bool) -> Option<MetricSummary> {
    let mut iter = summaries.iter();
    let first = iter.next()?;
    let chosen = iter.fold(first, |current, candidate| {
        if better(candidate.mean, current.mean) {
            candidate
        } else {
            current
        }
    });
    Some(chosen.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_metric_counts_as_zero() {
        let b = ComparisonEntity::new("B", [("x", 50.0)]);
        assert_eq!(b.avg_score(&metrics(&["x", "y"])), 25.0);
    }

    #[test]
    fn ranking_is_descending() {
        let entities = vec![
            ComparisonEntity::new("B", [("x", 50.0)]),
            ComparisonEntity::new("A", [("x", 100.0), ("y", 100.0)]),
        ];
        let result = compare(&entities, &metrics(&["x", "y"]));
        assert_eq!(result.ranking[0].name, "A");
        assert_eq!(result.ranking[0].rank, 1);
        assert_eq!(result.ranking[0].avg_score, 100.0);
        assert_eq!(result.ranking[1].name, "B");
        assert_eq!(result.ranking[1].avg_score, 25.0);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let entities = vec![
            ComparisonEntity::new("first", [("x", 70.0)]),
            ComparisonEntity::new("second", [("x", 70.0)]),
            ComparisonEntity::new("third", [("x", 90.0)]),
        ];
        let result = compare(&entities, &metrics(&["x"]));
        let names: Vec<&str> = result.ranking.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn best_and_worst_metric_use_cross_entity_means() {
        let entities = vec![
            ComparisonEntity::new("A", [("x", 90.0), ("y", 40.0), ("z", 60.0)]),
            ComparisonEntity::new("B", [("x", 70.0), ("y", 50.0)]),
        ];
        let result = compare(&entities, &metrics(&["x", "y", "z"]));
        let best = result.best_metric.unwrap();
        let worst = result.worst_metric.unwrap();
        assert_eq!(best.metric, "x");
        assert_eq!(best.mean, 80.0);
        // z: (60 + 0) / 2 = 30, below y's 45.
        assert_eq!(worst.metric, "z");
        assert_eq!(worst.mean, 30.0);
    }

    #[test]
    fn tied_metrics_prefer_first_listed() {
        let entities = vec![ComparisonEntity::new("A", [("x", 50.0), ("y", 50.0)])];
        let result = compare(&entities, &metrics(&["x", "y"]));
        assert_eq!(result.best_metric.unwrap().metric, "x");
        assert_eq!(result.worst_metric.unwrap().metric, "x");
    }

    #[test]
    fn empty_inputs() {
        let result = compare(&[], &metrics(&["x"]));
        assert!(result.ranking.is_empty());
        assert!(result.best_metric.is_none());

        let e = ComparisonEntity::new("A", [("x", 10.0)]);
        assert_eq!(e.avg_score(&[]), 0.0);
        let result = compare(&[e], &[]);
        assert!(result.metric_means.is_empty());
        assert!(result.worst_metric.is_none());
    }
}
