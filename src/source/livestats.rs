//! HTTP adapter for PCS LiveStats pages.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{LiveSource, SourceFactory, html};
use crate::config::Settings;
use crate::error::{FetchError, Result};
use crate::model::Snapshot;

const USER_AGENT: &str = concat!("pcs-pushover/", env!("CARGO_PKG_VERSION"));
const FALLBACK_TITLE: &str = "PCS LiveStats";

/// Shared HTTP client for everything we read from PCS.
#[derive(Clone)]
pub struct PcsClient {
    http: reqwest::Client,
    settings: Settings,
}

impl PcsClient {
    pub fn new(settings: Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn resolve_url(&self, reference: &str) -> String {
        self.settings.resolve_url(reference)
    }

    /// GET a page, returning the status and body whatever the status is.
    pub async fn get_text(&self, url: &str) -> std::result::Result<(u16, String), reqwest::Error> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(url, status, bytes = body.len(), "fetched");
        Ok((status, body))
    }
}

/// One tracked LiveStats page.
pub struct LiveStatsPage {
    client: PcsClient,
    url: String,
    last_html: Option<String>,
}

impl LiveStatsPage {
    pub fn new(client: PcsClient, reference: &str) -> Self {
        let url = client.resolve_url(reference);
        Self {
            client,
            url,
            last_html: None,
        }
    }
}

#[async_trait]
impl LiveSource for LiveStatsPage {
    async fn fetch(&mut self) -> std::result::Result<Snapshot, FetchError> {
        let (status, body) = self.client.get_text(&self.url).await?;
        let parsed = html::extract_data(&body);
        self.last_html = Some(body);

        match parsed {
            Ok(data) => Ok(Snapshot::from_data(data)),
            Err(e) if status < 400 => Err(e),
            // The outage banner is more telling than the status code.
            Err(e @ FetchError::Unavailable(_)) => Err(e),
            Err(_) if status >= 500 => Err(FetchError::Unavailable(format!(
                "PCS answered HTTP {status}"
            ))),
            Err(_) if status == 404 => Err(FetchError::DataMissing(
                "LiveStats page not found (check URL)".to_string(),
            )),
            Err(_) => Err(FetchError::Transport(format!("PCS answered HTTP {status}"))),
        }
    }

    fn last_content(&self) -> Option<&str> {
        self.last_html.as_deref()
    }

    fn extract_identity(&self, content: &str) -> Option<String> {
        html::extract_id(content)
    }

    fn display_title(&self) -> String {
        self.last_html
            .as_deref()
            .and_then(html::extract_title)
            .unwrap_or_else(|| FALLBACK_TITLE.to_string())
    }

    fn current_url(&self) -> &str {
        &self.url
    }
}

/// Opens [`LiveStatsPage`]s that share one HTTP client.
pub struct LiveStatsFactory {
    client: PcsClient,
}

impl LiveStatsFactory {
    pub fn new(client: PcsClient) -> Self {
        Self { client }
    }
}

impl SourceFactory for LiveStatsFactory {
    fn open(&self, reference: &str) -> Box<dyn LiveSource> {
        Box::new(LiveStatsPage::new(self.client.clone(), reference))
    }
}
