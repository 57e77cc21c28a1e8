//! Race classification for auto mode's optional Men's WorldTour filter.

use crate::source::html;

/// Normalize a PCS race or live URL/path to `race/<name>/<year>`.
///
/// `https://www.procyclingstats.com/race/tour-de-france/2024/stage-1/live`
/// becomes `race/tour-de-france/2024`. Returns `None` for anything that is
/// not a race path.
pub fn race_base_from_path(url_or_path: &str) -> Option<String> {
    let mut path = strip_origin(url_or_path).trim_start_matches('/');
    if !path.starts_with("race/") {
        return None;
    }

    path = strip_live_suffix(path);
    path = strip_stage(path);

    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() >= 3 {
        return Some(parts[..3].join("/"));
    }
    (!path.is_empty()).then(|| path.to_string())
}

fn strip_origin(s: &str) -> &str {
    let Some(rest) = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
    else {
        return s;
    };
    match rest.find('/') {
        Some(slash) if slash > 0 => &rest[slash + 1..],
        _ => s,
    }
}

fn strip_live_suffix(path: &str) -> &str {
    let p = path.strip_suffix('/').unwrap_or(path);
    let Some(p) = p.strip_suffix("/live") else {
        return path;
    };
    p.strip_suffix("/result").unwrap_or(p)
}

/// Drop a `/stage-<n>` segment and everything after it.
fn strip_stage(path: &str) -> &str {
    let mut from = 0;
    while let Some(rel) = path[from..].find("/stage-") {
        let at = from + rel;
        let rest = &path[at + "/stage-".len()..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && (rest.len() == digits || rest.as_bytes()[digits] == b'/') {
            return &path[..at];
        }
        from = at + 1;
    }
    path
}

/// UCI tour and category as listed on a race overview page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub uci_tour: Option<String>,
    pub category: Option<String>,
}

impl Classification {
    /// Read the "UCI Tour" and "Category" rows of a race overview page.
    pub fn from_html(page: &str) -> Self {
        Self {
            uci_tour: html::info_value(page, "UCI Tour:"),
            category: html::info_value(page, "Category:"),
        }
    }

    pub fn is_men_uwt_or_wc(&self) -> bool {
        is_men_uwt_or_wc(self.uci_tour.as_deref(), self.category.as_deref())
    }
}

/// True for Men's WorldTour races and World Championships.
pub fn is_men_uwt_or_wc(uci_tour: Option<&str>, category: Option<&str>) -> bool {
    let tour = uci_tour.unwrap_or_default().to_lowercase();
    let cat = category.unwrap_or_default().to_lowercase();

    let is_men = cat.contains("men") && !cat.contains("women");
    let is_uwt = tour.contains("worldtour");
    let is_wc = tour.contains("world") && tour.contains("champ");
    is_men && (is_uwt || is_wc)
}
