//! One-line renderings of LiveStats data for debug output.

use serde_json::Value;

/// Describe an `extra_results` row, e.g. `KOM #1 Pogačar (10 pts) +4s`.
pub fn format_extra_row(row: &Value) -> String {
    let kind = match row.get("ertype").and_then(Value::as_i64) {
        Some(1) => "Sprint".to_string(),
        Some(2) => "KOM".to_string(),
        Some(3) => "Bonus".to_string(),
        Some(n) => format!("Type {n}"),
        None => "Type None".to_string(),
    };

    let mut parts = vec![kind];
    if let Some(rank) = row.get("rnk").and_then(Value::as_i64) {
        parts.push(format!("#{rank}"));
    }
    if let Some(name) = row.get("ridername").and_then(Value::as_str).filter(|n| !n.is_empty()) {
        parts.push(name.to_string());
    }
    if let Some(points) = row.get("pnt").and_then(Value::as_i64).filter(|p| *p != 0) {
        parts.push(format!("({points} pts)"));
    }
    if let Some(bonus) = row.get("bonis").and_then(Value::as_i64).filter(|b| *b != 0) {
        parts.push(format!("+{bonus}s"));
    }
    parts.join(" ")
}

/// Top-level keys of a data blob, sorted.
pub fn sorted_keys(data: &Value) -> Vec<String> {
    let mut keys: Vec<String> = data
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

/// Pretty JSON cut to at most `max` characters.
pub fn pretty_truncated(data: &Value, max: usize) -> String {
    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    pretty.chars().take(max).collect()
}
