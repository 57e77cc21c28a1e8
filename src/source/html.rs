//! Plain-text scanning of PCS pages.
//!
//! The pages we read are stable enough that a handful of substring scans
//! beat pulling in a DOM. All searches are ASCII case-insensitive; the
//! lower-cased copy has the same byte offsets as the original.

use serde_json::Value;

use crate::error::FetchError;

/// Extract and parse the `var data = {...};` blob.
///
/// When the blob is missing, the page text decides the error kind.
pub fn extract_data(html: &str) -> Result<Value, FetchError> {
    let Some(blob) = data_blob(html) else {
        return Err(classify_missing(html));
    };
    serde_json::from_str(blob)
        .map_err(|e| FetchError::Transport(format!("LiveStats data is not valid JSON: {e}")))
}

fn data_blob(html: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(start) = assignment_after(html, "data", from) {
        if html[start..].starts_with('{') {
            let end = html[start..].find("};")? + start;
            return Some(&html[start..=end]);
        }
        from = start;
    }
    None
}

fn classify_missing(html: &str) -> FetchError {
    let lower = html.to_ascii_lowercase();
    if lower.contains("temporarily unavailable") || lower.contains("technical difficulties") {
        return FetchError::Unavailable(
            "PCS page temporarily unavailable (technical difficulties)".to_string(),
        );
    }
    if lower.contains("page not found") || lower.contains("404") {
        return FetchError::DataMissing("LiveStats page not found (check URL)".to_string());
    }
    FetchError::DataMissing(
        "LiveStats data not found in page. The race may not be live yet, or the page layout changed."
            .to_string(),
    )
}

/// The numeric page id from `var id = 12345;`.
pub fn extract_id(html: &str) -> Option<String> {
    let mut from = 0;
    while let Some(start) = assignment_after(html, "id", from) {
        let digits = html[start..]
            .find(|c: char| !c.is_ascii_digit())
            .map_or(&html[start..], |n| &html[start..start + n]);
        if !digits.is_empty() && html[start + digits.len()..].starts_with(';') {
            return Some(digits.to_string());
        }
        from = start;
    }
    None
}

/// Find `var <name> =` at or after `from`; returns the offset of the first
/// non-space character after the `=`.
fn assignment_after(html: &str, name: &str, from: usize) -> Option<usize> {
    let bytes = html.as_bytes();
    let mut pos = from;
    loop {
        let at = html.get(pos..)?.find("var")? + pos;
        pos = at + 3;

        let mut i = skip_ws(bytes, pos);
        if i == pos || !html[i..].starts_with(name) {
            continue;
        }
        i += name.len();
        if bytes.get(i).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_') {
            continue;
        }
        i = skip_ws(bytes, i);
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        return Some(skip_ws(bytes, i + 1));
    }
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

/// The race title: the `<h1>` under `.page-title`.
pub fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let from = lower.find("page-title")?;
    let title = tag_inner(html, &lower, "<h1", "</h1>", from)?;
    let text = strip_tags(title);
    (!text.is_empty()).then_some(text)
}

fn tag_inner<'a>(html: &'a str, lower: &str, open: &str, close: &str, from: usize) -> Option<&'a str> {
    let start = lower.get(from..)?.find(open)? + from;
    let body = lower[start..].find('>')? + start + 1;
    let end = lower[body..].find(close)? + body;
    Some(&html[body..end])
}

/// Drop markup and collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    decode_entities(&out)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#039;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Value of a `Label: value` pair in a PCS info list, e.g. `UCI Tour:`.
pub fn info_value(html: &str, label: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let at = lower.find(&label.to_ascii_lowercase())? + label.len();
    // The label sits in its own div; the value is the next div.
    let label_end = lower[at..].find("</div>")? + at;
    let value = tag_inner(html, &lower, "<div", "</div>", label_end)?;
    let text = strip_tags(value);
    (!text.is_empty()).then_some(text)
}

/// Every anchor `href` on the page, in document order.
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let bytes = html.as_bytes();
    let mut hrefs = Vec::new();
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find("<a") {
        let start = pos + rel;
        pos = start + 2;
        if !bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            continue;
        }
        let Some(tag_len) = lower[pos..].find('>') else {
            break;
        };
        let tag_end = pos + tag_len;
        if let Some(href) = href_in(&html[pos..tag_end], &lower[pos..tag_end]) {
            hrefs.push(decode_entities(href));
        }
        pos = tag_end;
    }
    hrefs
}

fn href_in<'a>(tag: &'a str, lower: &str) -> Option<&'a str> {
    let at = lower.find("href")?;
    let bytes = tag.as_bytes();
    let mut i = skip_ws(bytes, at + 4);
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i = skip_ws(bytes, i + 1);
    match bytes.get(i)? {
        quote @ (b'"' | b'\'') => {
            let end = tag[i + 1..].find(*quote as char)? + i + 1;
            Some(&tag[i + 1..end])
        }
        _ => {
            let end = tag[i..]
                .find(|c: char| c.is_ascii_whitespace())
                .map_or(tag.len(), |n| n + i);
            Some(&tag[i..end])
        }
    }
}
