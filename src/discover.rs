//! Discovery of live races from the PCS homepage.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::filters::Classification;
use crate::source::{PcsClient, html};

#[async_trait]
pub trait Discovery: Send + Sync {
    /// Relative paths of live trackers, de-duplicated in page order.
    /// Empty on any failure.
    async fn list_live_event_paths(&self) -> Vec<String>;

    /// Classify a race by its base path (`race/<name>/<year>`).
    async fn classify(&self, _base_path: &str) -> Classification {
        Classification::default()
    }
}

pub struct PcsHomepage {
    client: PcsClient,
}

impl PcsHomepage {
    pub fn new(client: PcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Discovery for PcsHomepage {
    async fn list_live_event_paths(&self) -> Vec<String> {
        let url = self.client.resolve_url("");
        match self.client.get_text(&url).await {
            Ok((_, body)) => {
                let paths = live_paths(&body);
                debug!(found = paths.len(), "discovery pass");
                paths
            }
            Err(e) => {
                warn!(error = %e, "discovery failed");
                Vec::new()
            }
        }
    }

    async fn classify(&self, base_path: &str) -> Classification {
        let url = self.client.resolve_url(base_path);
        match self.client.get_text(&url).await {
            Ok((status, body)) if status < 400 => Classification::from_html(&body),
            Ok((status, _)) => {
                warn!(race = base_path, status, "classification page unavailable");
                Classification::default()
            }
            Err(e) => {
                warn!(race = base_path, error = %e, "classification failed");
                Classification::default()
            }
        }
    }
}

/// Live tracker links on a page, as relative `race/...` paths.
pub fn live_paths(page: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for href in html::anchor_hrefs(page) {
        if !href.contains("/live") {
            continue;
        }
        let path = href
            .rsplit("procyclingstats.com/")
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');
        if path.starts_with("race/") && path.contains("/live") && !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }
    paths
}
