//! CSV export of analysis scores.

use serde::{Deserialize, Serialize};

use crate::analytics::history::AnalysisRecord;

/// Header line. Column order is fixed.
pub const CSV_HEADER: &str = "time,overall_score,semantic_clarity,structural_integrity,logical_coherence";

/// One exported row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub time: String,
    pub overall_score: f64,
    pub semantic_clarity: f64,
    pub structural_integrity: f64,
    pub logical_coherence: f64,
}

impl From<&AnalysisRecord> for ExportRow {
    fn from(r: &AnalysisRecord) -> Self {
        Self {
            time: r.timestamp.clone(),
            overall_score: f64::from(r.overall_score),
            semantic_clarity: f64::from(r.semantic_clarity),
            structural_integrity: f64::from(r.structural_integrity),
            logical_coherence: f64::from(r.logical_coherence),
        }
    }
}

/// Serialize rows to CSV: header plus one line per row, `\n` separated,
/// no trailing newline.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for row in rows {
        lines.push(format!(
            "{},{},{},{},{}",
            escape_field(&row.time),
            row.overall_score,
            row.semantic_clarity,
            row.structural_integrity,
            row.logical_coherence,
        ));
    }
    lines.join("\n")
}

/// Convenience over history records.
pub fn records_to_csv(records: &[AnalysisRecord]) -> String {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    to_csv(&rows)
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: &str, overall: f64) -> ExportRow {
        ExportRow {
            time: time.to_string(),
            overall_score: overall,
            semantic_clarity: 70.0,
            structural_integrity: 80.0,
            logical_coherence: 75.5,
        }
    }

    #[test]
    fn two_rows_make_three_lines() {
        let csv = to_csv(&[row("2025-01-15", 72.0), row("2025-01-16", 81.0)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "2025-01-15,72,70,80,75.5");
        assert_eq!(lines[2], "2025-01-16,81,70,80,75.5");
    }

    #[test]
    fn every_line_has_five_fields() {
        let csv = to_csv(&[row("2025-01-15", 72.0)]);
        assert!(csv.lines().all(|l| l.split(',').count() == 5));
    }

    #[test]
    fn empty_export_is_header_only() {
        assert_eq!(to_csv(&[]), CSV_HEADER);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("plain"), "plain");
    }
}
