//! Pushover message shaping and debug formatting.

use pcs_pushover::format::{format_extra_row, pretty_truncated, sorted_keys};
use pcs_pushover::model::Notice;
use pcs_pushover::notify::{MAX_MESSAGE_CHARS, MAX_TITLE_CHARS, Message};
use serde_json::json;

#[test]
fn form_fields_truncate_to_pushover_limits() {
    let msg = Message::new("é".repeat(2000))
        .title("t".repeat(300))
        .url("https://pcs.test/race/x/live")
        .priority(1);
    let fields = msg.form_fields();

    let get = |k: &str| fields.iter().find(|(name, _)| *name == k).map(|(_, v)| v.clone());
    assert_eq!(get("message").unwrap().chars().count(), MAX_MESSAGE_CHARS);
    assert_eq!(get("title").unwrap().chars().count(), MAX_TITLE_CHARS);
    assert_eq!(get("url").as_deref(), Some("https://pcs.test/race/x/live"));
    assert_eq!(get("priority").as_deref(), Some("1"));
}

#[test]
fn empty_optional_fields_are_omitted() {
    let fields = Message::new("Finished").title("").priority(0).form_fields();
    assert_eq!(fields, vec![("message", "Finished".to_string())]);
}

#[test]
fn notice_messages() {
    assert_eq!(Notice::Started.message(), "Race started");
    assert_eq!(Notice::KmToGo(100.0).message(), "100 km to go");
    assert_eq!(Notice::KmToGo(10.0).message(), "10 km to go");
    assert_eq!(Notice::Finished.message(), "Finished");
    assert_eq!(Notice::Recovered.message(), "PCS reachable again");
}

#[test]
fn extra_rows_format_compactly() {
    let row = json!({"ertype": 2, "rnk": 1, "ridername": "Rider", "pnt": 5, "bonis": 2});
    assert_eq!(format_extra_row(&row), "KOM #1 Rider (5 pts) +2s");

    let row = json!({"ertype": 1, "rnk": 3, "ridername": "Sprinter", "pnt": 0});
    assert_eq!(format_extra_row(&row), "Sprint #3 Sprinter");

    let row = json!({"ertype": 9});
    assert_eq!(format_extra_row(&row), "Type 9");
}

#[test]
fn debug_helpers() {
    let data = json!({"kmtogo": 1, "finished": 0, "race_status": "running"});
    assert_eq!(sorted_keys(&data), vec!["finished", "kmtogo", "race_status"]);
    assert!(pretty_truncated(&data, 10).chars().count() <= 10);
}
