//! Where snapshots come from.
//!
//! A [`LiveSource`] is one tracked LiveStats page. The watcher only talks to
//! this trait; [`livestats`] is the PCS adapter, and tests plug in fakes.

pub mod html;
pub mod livestats;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::Snapshot;

pub use livestats::{LiveStatsFactory, LiveStatsPage, PcsClient};

#[async_trait]
pub trait LiveSource: Send {
    /// Fetch the page and parse its snapshot.
    async fn fetch(&mut self) -> Result<Snapshot, FetchError>;

    /// Raw content of the last fetch, if any.
    fn last_content(&self) -> Option<&str>;

    /// Stable race id embedded in raw page content.
    fn extract_identity(&self, content: &str) -> Option<String>;

    /// Human-facing race name for notification titles.
    fn display_title(&self) -> String;

    /// Canonical URL of the live page.
    fn current_url(&self) -> &str;

    /// Identity from the last fetch.
    fn identity(&self) -> Option<String> {
        self.last_content()
            .and_then(|content| self.extract_identity(content))
    }
}

/// Opens a [`LiveSource`] for a page reference (relative path or URL).
pub trait SourceFactory: Send + Sync {
    fn open(&self, reference: &str) -> Box<dyn LiveSource>;
}
