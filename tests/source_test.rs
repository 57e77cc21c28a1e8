//! Page scanning: LiveStats blob, page id, title, homepage links, race filter.

use pcs_pushover::discover::live_paths;
use pcs_pushover::error::FetchErrorKind;
use pcs_pushover::filters::{Classification, is_men_uwt_or_wc, race_base_from_path};
use pcs_pushover::source::html::{extract_data, extract_id, extract_title, strip_tags};

const LIVE_PAGE: &str = r#"<html><head><title>x</title></head><body>
<div class="page-title"><div class="main"><h1>Tour de France <span>Stage 1</span></h1></div></div>
<script>
  var id = 12345;
  var data = {"race_status":"running","kmtogo":49.9,"sec_since_start":3600,"finished":0,"extra_results":[]};
  var other = 1;
</script></body></html>"#;

#[test]
fn extracts_livestats_blob() {
    let data = extract_data(LIVE_PAGE).unwrap();
    assert_eq!(data["race_status"], "running");
    assert_eq!(data["kmtogo"], 49.9);
}

#[test]
fn extracts_blob_without_spaces() {
    let data = extract_data("<script>var data={\"a\":1};</script>").unwrap();
    assert_eq!(data["a"], 1);
}

#[test]
fn ignores_other_variables_named_like_data() {
    let page = "var database = {\"x\":1}; var data = {\"y\":2};";
    let data = extract_data(page).unwrap();
    assert_eq!(data["y"], 2);
}

#[test]
fn outage_page_is_unavailable() {
    let err = extract_data("<h1>We are experiencing technical difficulties</h1>").unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Unavailable);

    let err = extract_data("<p>This page is Temporarily Unavailable</p>").unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Unavailable);
}

#[test]
fn missing_blob_is_data_missing() {
    let err = extract_data("<h1>Page not found</h1>").unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::DataMissing);

    let err = extract_data("<h1>Race starts at 12:00</h1>").unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::DataMissing);
}

#[test]
fn broken_blob_is_transport() {
    let err = extract_data("var data = {not json};").unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::Transport);
}

#[test]
fn extracts_page_id() {
    assert_eq!(extract_id(LIVE_PAGE).as_deref(), Some("12345"));
    assert_eq!(extract_id("var id=7;").as_deref(), Some("7"));
    assert_eq!(extract_id("var id = abc;"), None);
    assert_eq!(extract_id("var identity = 5;"), None);
    assert_eq!(extract_id("<html></html>"), None);
}

#[test]
fn extracts_title() {
    assert_eq!(extract_title(LIVE_PAGE).as_deref(), Some("Tour de France Stage 1"));
    assert_eq!(extract_title("<p>no heading</p>"), None);
}

#[test]
fn headings_outside_page_title_are_not_titles() {
    assert_eq!(extract_title("<body><h1>Page not found</h1></body>"), None);
}

#[test]
fn strip_tags_collapses_whitespace_and_entities() {
    assert_eq!(strip_tags("<b>Paris&nbsp;-\n  Roubaix</b> &amp; more"), "Paris - Roubaix & more");
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[test]
fn homepage_links_are_normalized_and_deduplicated() {
    let page = r#"
        <a href="race/tour-de-france/2025/stage-5/live">TdF</a>
        <a class="x" href="https://www.procyclingstats.com/race/tour-de-france/2025/stage-5/live">TdF again</a>
        <a href='/race/paris-roubaix/2025/result/live'>PR</a>
        <a href="rider/tadej-pogacar">not live</a>
        <a href="news/live-blog/live">not a race</a>
        <abbr href="race/x/2025/live">not an anchor</abbr>
    "#;
    assert_eq!(
        live_paths(page),
        vec![
            "race/tour-de-france/2025/stage-5/live",
            "race/paris-roubaix/2025/result/live",
        ]
    );
}

#[test]
fn empty_homepage_has_no_paths() {
    assert!(live_paths("").is_empty());
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn race_base_normalization() {
    assert_eq!(
        race_base_from_path("https://www.procyclingstats.com/race/tour-de-france/2024/stage-1/live").as_deref(),
        Some("race/tour-de-france/2024")
    );
    assert_eq!(
        race_base_from_path("race/paris-roubaix/2025/result/live").as_deref(),
        Some("race/paris-roubaix/2025")
    );
    assert_eq!(
        race_base_from_path("race/world-championship/2025").as_deref(),
        Some("race/world-championship/2025")
    );
    assert_eq!(
        race_base_from_path("/race/giro-d-italia/2025/stage-12/result").as_deref(),
        Some("race/giro-d-italia/2025")
    );
    assert_eq!(race_base_from_path("race/solo").as_deref(), Some("race/solo"));
    assert_eq!(race_base_from_path("rider/tadej-pogacar"), None);
    assert_eq!(race_base_from_path(""), None);
}

#[test]
fn mens_worldtour_and_worlds_pass() {
    assert!(is_men_uwt_or_wc(Some("UCI Worldtour"), Some("Men Elite")));
    assert!(is_men_uwt_or_wc(Some("World Championships"), Some("ME - Men Elite")));
    assert!(!is_men_uwt_or_wc(Some("UCI Worldtour"), Some("Women Elite")));
    assert!(!is_men_uwt_or_wc(Some("UCI ProSeries"), Some("Men Elite")));
    assert!(!is_men_uwt_or_wc(None, None));
}

#[test]
fn classification_from_race_page() {
    let page = r#"<ul class="infolist">
        <li><div class="title ">Category: </div><div class=" value" >Men Elite</div></li>
        <li><div class="title ">UCI Tour:</div><div class=" value" ><a href="circuits/x">UCI Worldtour</a></div></li>
    </ul>"#;
    let c = Classification::from_html(page);
    assert_eq!(c.category.as_deref(), Some("Men Elite"));
    assert_eq!(c.uci_tour.as_deref(), Some("UCI Worldtour"));
    assert!(c.is_men_uwt_or_wc());
}
