/// Cleanup and validation for model replies.
///
/// Local models often wrap JSON in markdown fences or add a sentence before
/// it. These helpers peel that off, parse what is left, and coerce the
/// fields the analyzer cares about into safe ranges.
use serde_json::Value;

use crate::error::LlmError;

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the reply as JSON, falling back to the outermost `{...}` or
/// `[...]` span when the model added prose around it.
pub fn extract_json(reply: &str) -> Result<Value, LlmError> {
    let text = strip_code_fences(reply);
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close))
            && start < end
            && let Ok(value) = serde_json::from_str::<Value>(&text[start..=end])
        {
            return Ok(value);
        }
    }

    Err(LlmError::InvalidJson(preview(text)))
}

/// Clamp a score to `0..=100` and round to the nearest integer.
pub fn clamp_score(raw: f64) -> u32 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u32
}

/// Read `key` from a scores object as a clamped integer. Strings holding a
/// number are accepted; anything else is `None`.
pub fn score_field(scores: &Value, key: &str) -> Option<u32> {
    let raw = match scores.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(clamp_score(raw))
}

/// Read `key` as a list of non-empty strings. Missing or mistyped fields
/// yield an empty list.
pub fn string_list(json: &Value, key: &str) -> Vec<String> {
    json.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// List items from a plain-text reply: lines starting with `-`, `*`, `•`
/// or a number, with the marker removed.
pub fn bullet_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(['-', '*', '•']) || line.starts_with(|c: char| c.is_ascii_digit()))
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '-' | '*' | '•' | '.' | ')' | ' '))
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        out.push('…');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
