//! Analytics reporter: aggregation over the analysis history.
//!
//! Turns raw [`AnalysisRecord`]s into:
//! - **Series**: daily per-metric means, ready for trend stats and forecasting
//! - **Trend reports**: stats, forecast, and rolling average for one metric
//! - **Comparisons**: one entity per prompt label, ranked by mean score
//! - **Summaries**: totals and extremes for `enhance history`

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::analytics::comparison::{self, Comparison, ComparisonEntity};
use crate::analytics::history::AnalysisRecord;
use crate::analytics::trend::{self, PredictionPoint, TrendDataPoint, TrendStats};
use crate::config::schema::TrendsConfig;

// ---------------------------------------------------------------------------
// Daily series
// ---------------------------------------------------------------------------

/// Mean value of `metric` per calendar day (`YYYY-MM-DD`), ascending.
///
/// Records with an unknown metric contribute nothing. Timestamps shorter
/// than a date are grouped under `"unknown"`, which sorts after any date.
pub fn daily_series(records: &[AnalysisRecord], metric: &str) -> Vec<TrendDataPoint> {
    let mut daily: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        let Some(value) = record.metric(metric) else {
            continue;
        };
        let date = record.timestamp.get(..10).unwrap_or("unknown").to_string();
        let slot = daily.entry(date).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    daily
        .into_iter()
        .map(|(date, (sum, count))| TrendDataPoint::new(date, sum / count as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Trend report
// ---------------------------------------------------------------------------

/// Everything the trends view needs for one metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub metric: String,
    pub series: Vec<TrendDataPoint>,
    pub stats: TrendStats,
    pub forecast: Vec<PredictionPoint>,
    pub rolling: Vec<TrendDataPoint>,
}

/// Build a trend report for `metric` from already-filtered records.
pub fn trend_report(
    records: &[AnalysisRecord],
    metric: &str,
    settings: &TrendsConfig,
) -> TrendReport {
    let series = daily_series(records, metric);
    let stats = trend::compute_stats(&series);
    let forecast = trend::forecast(&series, settings.forecast);
    let rolling = trend::rolling_average(&series, settings.rolling_window);

    tracing::debug!(
        metric,
        points = series.len(),
        predictions = forecast.len(),
        "trend report built"
    );

    TrendReport {
        metric: metric.to_string(),
        series,
        stats,
        forecast,
        rolling,
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Group records by prompt label; each metric is the mean over that
/// prompt's records. Entities keep first-seen order so ranking ties are
/// deterministic.
pub fn entities_from_history(records: &[AnalysisRecord], metrics: &[String]) -> Vec<ComparisonEntity> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&AnalysisRecord>> = HashMap::new();
    for record in records {
        let key = record.prompt.as_str();
        if !groups.contains_key(key) {
            order.push(key);
        }
        groups.entry(key).or_default().push(record);
    }

    order
        .into_iter()
        .map(|name| {
            let group = &groups[name];
            let values = metrics.iter().filter_map(|m| {
                let vals: Vec<f64> = group.iter().filter_map(|r| r.metric(m)).collect();
                if vals.is_empty() {
                    None
                } else {
                    Some((m.clone(), vals.iter().sum::<f64>() / vals.len() as f64))
                }
            });
            ComparisonEntity::new(name, values)
        })
        .collect()
}

/// Rank prompts in the history by their mean over `metrics`.
pub fn compare_history(records: &[AnalysisRecord], metrics: &[String]) -> Comparison {
    let entities = entities_from_history(records, metrics);
    comparison::compare(&entities, metrics)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Aggregate figures for `enhance history`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistorySummary {
    pub total_analyses: usize,
    pub distinct_prompts: usize,
    pub avg_overall: f64,
    pub best: Option<AnalysisRecord>,
    pub worst: Option<AnalysisRecord>,
    /// Number of analyses per `model_used`, most frequent first.
    pub models: Vec<(String, usize)>,
}

pub fn summarize(records: &[AnalysisRecord]) -> HistorySummary {
    if records.is_empty() {
        return HistorySummary::default();
    }

    let total = records.len();
    let avg_overall =
        records.iter().map(|r| f64::from(r.overall_score)).sum::<f64>() / total as f64;

    let best = records.iter().max_by_key(|r| r.overall_score).cloned();
    let worst = records.iter().min_by_key(|r| r.overall_score).cloned();

    let mut prompts: Vec<&str> = records.iter().map(|r| r.prompt.as_str()).collect();
    prompts.sort_unstable();
    prompts.dedup();

    let mut model_counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *model_counts.entry(&r.model_used).or_default() += 1;
    }
    let mut models: Vec<(String, usize)> = model_counts
        .into_iter()
        .map(|(m, c)| (m.to_string(), c))
        .collect();
    models.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    HistorySummary {
        total_analyses: total,
        distinct_prompts: prompts.len(),
        avg_overall,
        best,
        worst,
        models,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::trend::Trend;
    use uuid::Uuid;

    fn rec(prompt: &str, ts: &str, overall: u32, semantic: u32, model: &str) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            timestamp: ts.to_string(),
            prompt: prompt.to_string(),
            overall_score: overall,
            semantic_clarity: semantic,
            structural_integrity: 60,
            logical_coherence: 70,
            specificity_score: 50,
            instruction_clarity: 50,
            context_completeness: 50,
            model_used: model.to_string(),
            prompt_id: None,
        }
    }

    fn sample() -> Vec<AnalysisRecord> {
        vec![
            rec("alpha", "2025-01-15T10:00:00+00:00", 60, 70, "rule-based"),
            rec("alpha", "2025-01-15T12:00:00+00:00", 80, 90, "rule-based"),
            rec("beta", "2025-01-16T09:00:00+00:00", 50, 40, "llama3.2:3b"),
            rec("gamma", "2025-01-17T09:00:00+00:00", 90, 85, "rule-based"),
        ]
    }

    #[test]
    fn daily_series_averages_per_day() {
        let series = daily_series(&sample(), "overall_score");
        assert_eq!(series.len(), 3);
        assert_eq!(series[0], TrendDataPoint::new("2025-01-15", 70.0));
        assert_eq!(series[1], TrendDataPoint::new("2025-01-16", 50.0));
        assert_eq!(series[2], TrendDataPoint::new("2025-01-17", 90.0));
    }

    #[test]
    fn daily_series_unknown_metric_is_empty() {
        assert!(daily_series(&sample(), "bogus").is_empty());
    }

    #[test]
    fn trend_report_uses_settings() {
        let mut settings = TrendsConfig::default();
        settings.forecast = true;
        settings.rolling_window = 2;

        let report = trend_report(&sample(), "overall_score", &settings);
        assert_eq!(report.stats.current, 90.0);
        assert_eq!(report.stats.previous, 50.0);
        assert_eq!(report.stats.trend, Trend::Up);
        assert_eq!(report.forecast.len(), 3);
        assert_eq!(report.rolling.len(), 3);
        assert_eq!(report.rolling[1].value, 60.0);

        settings.forecast = false;
        let report = trend_report(&sample(), "overall_score", &settings);
        assert!(report.forecast.is_empty());
    }

    #[test]
    fn compare_history_groups_by_prompt() {
        let metrics = vec!["overall_score".to_string(), "semantic_clarity".to_string()];
        let result = compare_history(&sample(), &metrics);

        let names: Vec<&str> = result.ranking.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["gamma", "alpha", "beta"]);
        // alpha: overall mean 70, semantic mean 80
        assert_eq!(result.ranking[1].avg_score, 75.0);
    }

    #[test]
    fn summarize_counts_and_extremes() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_analyses, 4);
        assert_eq!(summary.distinct_prompts, 3);
        assert_eq!(summary.avg_overall, 70.0);
        assert_eq!(summary.best.unwrap().prompt, "gamma");
        assert_eq!(summary.worst.unwrap().prompt, "beta");
        assert_eq!(summary.models[0], ("rule-based".to_string(), 3));
    }

    #[test]
    fn summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_analyses, 0);
        assert!(summary.best.is_none());
    }
}
