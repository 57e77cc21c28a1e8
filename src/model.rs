//! Core data model.
//!
//! A snapshot is one poll's worth of LiveStats telemetry. A race record is
//! the persisted bookkeeping that keeps us from notifying twice.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Distance thresholds, checked in this order.
pub const KM_MARKERS: [f64; 3] = [100.0, 50.0, 10.0];

/// Status values that mean the race is under way.
pub const RUNNING_STATUSES: [&str; 3] = ["running", "live", "started"];

pub fn is_running_status(status: &str) -> bool {
    RUNNING_STATUSES.contains(&status)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Telemetry parsed from the embedded `var data = {...}` blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Lower-cased `race_status`, empty when absent.
    pub status: String,
    pub finished: bool,
    /// Kilometres remaining. `None` when missing or not a number.
    pub distance_to_go: Option<f64>,
    pub elapsed_seconds: u64,
    /// The raw blob, kept for debug dumps.
    pub data: Value,
}

impl Snapshot {
    pub fn from_data(data: Value) -> Self {
        let status = match data.get("race_status") {
            Some(Value::String(s)) => s.to_lowercase(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string().to_lowercase(),
        };
        let finished = data.get("finished").is_some_and(is_one) || status == "finished";
        let elapsed_seconds = data.get("sec_since_start").map_or(0, parse_seconds);
        let distance_to_go = data.get("kmtogo").and_then(parse_km);

        Self {
            status,
            finished,
            distance_to_go,
            elapsed_seconds,
            data,
        }
    }

    /// Under way, either by status or by a running clock on an unfinished race.
    pub fn is_started(&self) -> bool {
        is_running_status(&self.status) || (self.elapsed_seconds > 0 && !self.finished)
    }
}

fn is_one(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

fn parse_seconds(v: &Value) -> u64 {
    let secs = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    secs.map_or(0, |s| s.max(0) as u64)
}

fn parse_km(v: &Value) -> Option<f64> {
    let km = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    km.is_finite().then_some(km)
}

// ---------------------------------------------------------------------------
// Race record
// ---------------------------------------------------------------------------

/// Per-race notification bookkeeping, persisted in the state file.
///
/// Field names match the on-disk JSON so the file stays hand-editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceRecord {
    /// Status seen on the previous poll. `None` only before the first poll.
    pub last_status: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub notified_start: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub notified_finish: bool,
    /// Markers already announced. Only ever grows.
    #[serde(deserialize_with = "null_as_default")]
    pub notified_km_markers: Vec<f64>,
    #[serde(rename = "prev_kmtogo")]
    pub prev_distance_to_go: Option<f64>,
    /// Keys we don't know about survive a rewrite untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Hand-edited files may carry `null` where a flag or list belongs.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl RaceRecord {
    pub fn has_marker(&self, marker: f64) -> bool {
        self.notified_km_markers.contains(&marker)
    }

    /// Add a marker, keeping the list sorted ascending and free of duplicates.
    pub fn add_marker(&mut self, marker: f64) {
        if !self.has_marker(marker) {
            self.notified_km_markers.push(marker);
            self.notified_km_markers.sort_by(|a, b| a.total_cmp(b));
        }
    }

    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(status) = patch.last_status {
            self.last_status = status;
        }
        if let Some(start) = patch.notified_start {
            self.notified_start = start;
        }
        if let Some(finish) = patch.notified_finish {
            self.notified_finish = finish;
        }
        if let Some(markers) = patch.notified_km_markers {
            self.notified_km_markers = markers;
        }
        if let Some(prev) = patch.prev_distance_to_go {
            self.prev_distance_to_go = prev;
        }
    }
}

/// A partial update to a [`RaceRecord`]. `None` leaves a field alone;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub last_status: Option<Option<String>>,
    pub notified_start: Option<bool>,
    pub notified_finish: Option<bool>,
    pub notified_km_markers: Option<Vec<f64>>,
    pub prev_distance_to_go: Option<Option<f64>>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&RaceRecord> for RecordPatch {
    /// A patch that overwrites every tracked field.
    fn from(record: &RaceRecord) -> Self {
        Self {
            last_status: Some(record.last_status.clone()),
            notified_start: Some(record.notified_start),
            notified_finish: Some(record.notified_finish),
            notified_km_markers: Some(record.notified_km_markers.clone()),
            prev_distance_to_go: Some(record.prev_distance_to_go),
        }
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Which page a notification links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Live,
    Result,
}

/// Something worth pushing to the user's phone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    Started,
    KmToGo(f64),
    Finished,
    /// PCS has failed too many polls in a row.
    Unreachable,
    /// PCS answered again after failures.
    Recovered,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Started => "Race started".to_string(),
            Notice::KmToGo(km) => format!("{} km to go", *km as i64),
            Notice::Finished => "Finished".to_string(),
            Notice::Unreachable => "PCS server unreachable (will keep retrying)".to_string(),
            Notice::Recovered => "PCS reachable again".to_string(),
        }
    }

    pub fn link(&self) -> LinkKind {
        match self {
            Notice::Finished => LinkKind::Result,
            _ => LinkKind::Live,
        }
    }
}

/// Turn a live page URL into its result page by dropping a trailing `/live`.
pub fn result_url(live_url: &str) -> String {
    let trimmed = live_url.strip_suffix('/').unwrap_or(live_url);
    match trimmed.strip_suffix("/live") {
        Some(base) => base.to_string(),
        None => live_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_url_strips_live_suffix() {
        assert_eq!(
            result_url("https://x/race/a/2025/stage-1/live"),
            "https://x/race/a/2025/stage-1"
        );
        assert_eq!(result_url("https://x/race/a/2025/live/"), "https://x/race/a/2025");
        assert_eq!(result_url("https://x/race/a/2025"), "https://x/race/a/2025");
    }

    #[test]
    fn snapshot_parses_loose_types() {
        let snap = Snapshot::from_data(json!({
            "race_status": "RUNNING",
            "finished": "0",
            "kmtogo": "49.9",
            "sec_since_start": "120",
        }));
        assert_eq!(snap.status, "running");
        assert!(!snap.finished);
        assert_eq!(snap.distance_to_go, Some(49.9));
        assert_eq!(snap.elapsed_seconds, 120);
        assert!(snap.is_started());
    }

    #[test]
    fn snapshot_missing_fields_default() {
        let snap = Snapshot::from_data(json!({}));
        assert_eq!(snap.status, "");
        assert!(!snap.finished);
        assert_eq!(snap.distance_to_go, None);
        assert_eq!(snap.elapsed_seconds, 0);
        assert!(!snap.is_started());
    }

    #[test]
    fn finished_race_with_clock_is_not_started() {
        let snap = Snapshot::from_data(json!({"finished": 1, "sec_since_start": 3600}));
        assert!(snap.finished);
        assert!(!snap.is_started());
    }
}
