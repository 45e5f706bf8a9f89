//! Trend statistics, rolling averages, and short-range forecasting.
//!
//! Everything here is pure: callers pass an ordered `&[TrendDataPoint]`
//! and get fresh values back. Nothing is cached between calls.

use chrono::{DateTime, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Percentage change above which a series counts as moving.
const STABLE_THRESHOLD_PCT: f64 = 5.0;

/// Number of most recent points fed into the regression.
const FORECAST_WINDOW: usize = 5;

/// Minimum history required before a forecast is attempted.
const FORECAST_MIN_POINTS: usize = 3;

/// Number of projected points.
const FORECAST_HORIZON: usize = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One historical measurement, e.g. a prompt's score on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDataPoint {
    /// ISO-8601 timestamp or calendar date.
    pub timestamp: String,
    pub value: f64,
}

impl TrendDataPoint {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// Direction of the most recent change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

impl Trend {
    /// Classify a percentage change. Anything within ±5% is stable.
    pub fn from_change_pct(change_pct: f64) -> Self {
        if change_pct.abs() > STABLE_THRESHOLD_PCT {
            if change_pct > 0.0 { Self::Up } else { Self::Down }
        } else {
            Self::Stable
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Summary statistics over a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStats {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
    pub max: f64,
    pub min: f64,
    pub avg: f64,
}

/// A synthetic point projected past the end of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    pub timestamp: String,
    pub value: f64,
    pub is_prediction: bool,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Compute summary statistics and the up/down/stable classification.
///
/// With fewer than two points every field is zero and the trend is stable.
/// `max`, `min` and `avg` cover the whole series, while `change` only looks
/// at the last two points.
pub fn compute_stats(points: &[TrendDataPoint]) -> TrendStats {
    let [.., prev, last] = points else {
        return TrendStats::default();
    };

    let current = last.value;
    let previous = prev.value;
    let change = current - previous;
    let change_percent = if previous == 0.0 {
        0.0
    } else {
        change / previous * 100.0
    };

    let max = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let avg = points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64;

    TrendStats {
        current,
        previous,
        change,
        change_percent,
        trend: Trend::from_change_pct(change_percent),
        max,
        min,
        avg,
    }
}

/// Trailing moving average. Each output point averages up to `window`
/// values ending at the same index, so the first few points use a shorter
/// window. A zero window is treated as one.
pub fn rolling_average(points: &[TrendDataPoint], window: usize) -> Vec<TrendDataPoint> {
    let window = window.max(1);
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &points[start..=i];
            let mean = slice.iter().map(|p| p.value).sum::<f64>() / slice.len() as f64;
            TrendDataPoint::new(point.timestamp.clone(), mean)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// Project the next three daily values from the most recent history.
///
/// Fits an ordinary least-squares line over the last five points (or all of
/// them, if fewer), using position `0..n` as the x axis. Projections are
/// clamped at zero and stamped one, two and three days after the last
/// observation. Returns an empty vector when disabled, when fewer than three
/// points exist, or when the last timestamp cannot be parsed.
pub fn forecast(points: &[TrendDataPoint], enabled: bool) -> Vec<PredictionPoint> {
    if !enabled || points.len() < FORECAST_MIN_POINTS {
        return Vec::new();
    }

    let window = &points[points.len().saturating_sub(FORECAST_WINDOW)..];
    let Some(last) = window.last() else {
        return Vec::new();
    };
    let Some(anchor) = TimestampAnchor::parse(&last.timestamp) else {
        tracing::debug!(timestamp = %last.timestamp, "unparseable timestamp, skipping forecast");
        return Vec::new();
    };

    let values: Vec<f64> = window.iter().map(|p| p.value).collect();
    let (slope, intercept) = linear_regression(&values);
    let n = values.len();

    (0..FORECAST_HORIZON)
        .map(|step| {
            let x = (n + step) as f64;
            PredictionPoint {
                timestamp: anchor.plus_days(step as i64 + 1),
                value: (slope * x + intercept).max(0.0),
                is_prediction: true,
            }
        })
        .collect()
}

/// Least-squares fit of `values[i]` against `i`. Returns `(slope, intercept)`.
fn linear_regression(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xx: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return (0.0, if n > 0.0 { sum_y / n } else { 0.0 });
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// The last observed timestamp, remembered in its original shape so that
/// projected points are rendered the same way.
enum TimestampAnchor {
    Date(NaiveDate),
    DateTime(DateTime<chrono::FixedOffset>),
}

impl TimestampAnchor {
    fn parse(raw: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::DateTime(dt));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(Self::Date)
    }

    fn plus_days(&self, days: i64) -> String {
        match self {
            Self::Date(d) => (*d + Duration::days(days)).format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => (*dt + Duration::days(days)).to_rfc3339(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<TrendDataPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TrendDataPoint::new(format!("2025-01-{:02}", i + 1), *v))
            .collect()
    }

    #[test]
    fn fewer_than_two_points_yields_defaults() {
        assert_eq!(compute_stats(&[]), TrendStats::default());
        let one = compute_stats(&series(&[42.0]));
        assert_eq!(one, TrendStats::default());
        assert_eq!(one.trend, Trend::Stable);
    }

    #[test]
    fn ten_percent_rise_is_up() {
        let stats = compute_stats(&series(&[100.0, 110.0]));
        assert_eq!(stats.current, 110.0);
        assert_eq!(stats.previous, 100.0);
        assert_eq!(stats.change, 10.0);
        assert!((stats.change_percent - 10.0).abs() < 1e-9);
        assert_eq!(stats.trend, Trend::Up);
    }

    #[test]
    fn two_percent_rise_is_stable() {
        let stats = compute_stats(&series(&[100.0, 102.0]));
        assert!((stats.change_percent - 2.0).abs() < 1e-9);
        assert_eq!(stats.trend, Trend::Stable);
    }

    #[test]
    fn drop_is_down() {
        let stats = compute_stats(&series(&[80.0, 60.0]));
        assert!((stats.change_percent + 25.0).abs() < 1e-9);
        assert_eq!(stats.trend, Trend::Down);
    }

    #[test]
    fn exactly_five_percent_is_stable() {
        assert_eq!(Trend::from_change_pct(5.0), Trend::Stable);
        assert_eq!(Trend::from_change_pct(-5.0), Trend::Stable);
        assert_eq!(Trend::from_change_pct(5.01), Trend::Up);
    }

    #[test]
    fn zero_previous_guards_percentage() {
        let stats = compute_stats(&series(&[0.0, 50.0]));
        assert_eq!(stats.change, 50.0);
        assert_eq!(stats.change_percent, 0.0);
        assert_eq!(stats.trend, Trend::Stable);
    }

    #[test]
    fn extremes_cover_whole_series() {
        let stats = compute_stats(&series(&[10.0, 30.0, 20.0]));
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.avg, 20.0);
        assert_eq!(stats.current, 20.0);
        assert_eq!(stats.previous, 30.0);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_string(&compute_stats(&series(&[1.0, 2.0]))).unwrap();
        assert!(json.contains("\"changePercent\":100.0"));
        assert!(json.contains("\"trend\":\"up\""));
    }

    #[test]
    fn forecast_needs_three_points() {
        assert!(forecast(&series(&[]), true).is_empty());
        assert!(forecast(&series(&[1.0, 2.0]), true).is_empty());
        assert_eq!(forecast(&series(&[1.0, 2.0, 3.0]), true).len(), 3);
    }

    #[test]
    fn forecast_respects_disabled_flag() {
        assert!(forecast(&series(&[1.0, 2.0, 3.0, 4.0]), false).is_empty());
    }

    #[test]
    fn forecast_continues_linear_increase() {
        let preds = forecast(&series(&[10.0, 20.0, 30.0, 40.0, 50.0]), true);
        assert_eq!(preds.len(), 3);
        let values: Vec<f64> = preds.iter().map(|p| p.value).collect();
        for (got, want) in values.iter().zip([60.0, 70.0, 80.0]) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
        assert!(preds.iter().all(|p| p.is_prediction && p.value >= 0.0));
        assert_eq!(preds[0].timestamp, "2025-01-06");
        assert_eq!(preds[2].timestamp, "2025-01-08");
    }

    #[test]
    fn forecast_uses_only_last_five_points() {
        // The early spike is outside the window and must not bend the line.
        let preds = forecast(&series(&[500.0, 1.0, 2.0, 3.0, 4.0, 5.0]), true);
        assert!((preds[0].value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_clamps_at_zero() {
        let preds = forecast(&series(&[30.0, 20.0, 10.0]), true);
        assert!((preds[0].value - 0.0).abs() < 1e-9);
        assert!(preds.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn forecast_keeps_rfc3339_shape() {
        let points = vec![
            TrendDataPoint::new("2025-03-01T12:00:00+00:00", 1.0),
            TrendDataPoint::new("2025-03-05T12:00:00+00:00", 2.0),
            TrendDataPoint::new("2025-03-09T12:00:00+00:00", 3.0),
        ];
        let preds = forecast(&points, true);
        // Daily cadence regardless of the 4-day sampling interval.
        assert_eq!(preds[0].timestamp, "2025-03-10T12:00:00+00:00");
        assert_eq!(preds[1].timestamp, "2025-03-11T12:00:00+00:00");
    }

    #[test]
    fn forecast_skips_unparseable_timestamps() {
        let points = vec![
            TrendDataPoint::new("a", 1.0),
            TrendDataPoint::new("b", 2.0),
            TrendDataPoint::new("not a date", 3.0),
        ];
        assert!(forecast(&points, true).is_empty());
    }

    #[test]
    fn prediction_serializes_flag() {
        let preds = forecast(&series(&[1.0, 2.0, 3.0]), true);
        let json = serde_json::to_string(&preds[0]).unwrap();
        assert!(json.contains("\"isPrediction\":true"));
    }

    #[test]
    fn rolling_average_uses_trailing_window() {
        let avg = rolling_average(&series(&[10.0, 20.0, 30.0, 40.0]), 2);
        let values: Vec<f64> = avg.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10.0, 15.0, 25.0, 35.0]);
        assert_eq!(avg[3].timestamp, "2025-01-04");
    }

    #[test]
    fn rolling_average_zero_window_is_identity() {
        let avg = rolling_average(&series(&[3.0, 6.0]), 0);
        assert_eq!(avg[1].value, 6.0);
    }

    #[test]
    fn regression_on_flat_series() {
        let (slope, intercept) = linear_regression(&[5.0, 5.0, 5.0]);
        assert_eq!(slope, 0.0);
        assert_eq!(intercept, 5.0);
    }
}
