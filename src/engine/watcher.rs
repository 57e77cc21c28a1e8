//! The polling loop: fetch each tracked race, feed the transition rules or
//! the health tracker, push whatever comes out.
//!
//! Single-threaded by construction. Races are polled one after another and
//! the only suspension point that honours shutdown is the sleep between
//! rounds, so a state write is never cut in half.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{Instrument, debug, error, info, warn};

use super::health::{AlertPolicy, SourceHealth};
use super::transition::evaluate;
use crate::config::Settings;
use crate::discover::Discovery;
use crate::error::{FetchError, FetchErrorKind, Result};
use crate::filters::race_base_from_path;
use crate::format::sorted_keys;
use crate::model::{LinkKind, Notice, RecordPatch, Snapshot, result_url};
use crate::notify::{Message, Notifier};
use crate::source::{LiveSource, SourceFactory};
use crate::storage::StateStore;
use crate::telemetry::{race_span, record_notice};

/// Loop tunables.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    pub discovery_interval: Duration,
    pub alerts: AlertPolicy,
    /// Stop after one round.
    pub once: bool,
    /// Log the keys of every data blob.
    pub debug: bool,
    pub men_worldtour_only: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for WatchConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            discovery_interval: settings.discovery_interval(),
            alerts: AlertPolicy::from(&settings.alerts),
            once: false,
            debug: false,
            men_worldtour_only: settings.men_worldtour_only,
        }
    }
}

/// A race being watched.
pub struct TrackedRace {
    pub key: String,
    pub title: String,
    source: Box<dyn LiveSource>,
    health: SourceHealth,
}

impl TrackedRace {
    /// First fetch of a race. The caller decides whether failure is fatal.
    ///
    /// The race key is the page id, or `reference` when the page has none.
    pub async fn open(
        mut source: Box<dyn LiveSource>,
        reference: &str,
    ) -> std::result::Result<(Self, Snapshot), FetchError> {
        let snapshot = source.fetch().await?;
        let key = source.identity().unwrap_or_else(|| reference.to_string());
        let title = source.display_title();
        let race = Self {
            key,
            title,
            source,
            health: SourceHealth::new(),
        };
        Ok((race, snapshot))
    }

    pub fn url(&self) -> &str {
        self.source.current_url()
    }

    pub fn health(&self) -> &SourceHealth {
        &self.health
    }
}

/// What one poll of one race did.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Fetched; these are the notices that fired, health alerts included.
    Updated(Vec<Notice>),
    /// Fetch failed; an `Unreachable` notice is included when one was due.
    Failed(FetchErrorKind, Vec<Notice>),
}

/// Cloneable handle that stops a running [`Watcher`] at its next sleep.
#[derive(Clone, Default)]
pub struct ShutdownHandle(Arc<Notify>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.notify_one();
    }
}

pub struct Watcher {
    store: StateStore,
    notifier: Option<Box<dyn Notifier>>,
    config: WatchConfig,
    shutdown: ShutdownHandle,
}

impl Watcher {
    /// `notifier: None` runs in dry mode: notices are logged, not delivered.
    pub fn new(store: StateStore, notifier: Option<Box<dyn Notifier>>, config: WatchConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            shutdown: ShutdownHandle::default(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the transition rules on one snapshot, push what fires, persist.
    ///
    /// The record is written exactly once, after all notices went out.
    pub async fn handle(&mut self, race: &TrackedRace, snapshot: &Snapshot) -> Result<Vec<Notice>> {
        if self.config.debug {
            info!(race = %race.key, keys = %sorted_keys(&snapshot.data).join(", "), "data keys");
        }

        let previous = self.store.get_or_init(&race.key);
        let transition = evaluate(snapshot, &previous);
        for notice in &transition.notices {
            self.push(race, *notice).await;
        }
        self.store
            .apply_patch(&race.key, RecordPatch::from(&transition.record))?;
        Ok(transition.notices)
    }

    /// Fetch once and route the result.
    pub async fn poll(&mut self, race: &mut TrackedRace) -> PollOutcome {
        let span = race_span(&race.key, &race.title);
        self.poll_inner(race).instrument(span).await
    }

    async fn poll_inner(&mut self, race: &mut TrackedRace) -> PollOutcome {
        match race.source.fetch().await {
            Ok(snapshot) => {
                let mut fired = Vec::new();
                if let Some(notice) = race.health.record_success(&self.config.alerts) {
                    self.push(race, notice).await;
                    fired.push(notice);
                }
                match self.handle(race, &snapshot).await {
                    Ok(notices) => fired.extend(notices),
                    Err(e) => error!(error = %e, "failed to persist race state"),
                }
                PollOutcome::Updated(fired)
            }
            Err(e) => {
                warn!(error = %e, failures = race.health.consecutive_failures() + 1, "fetch error, will retry");
                let mut fired = Vec::new();
                if let Some(notice) = race.health.record_failure(&self.config.alerts, Utc::now()) {
                    self.push(race, notice).await;
                    fired.push(notice);
                }
                PollOutcome::Failed(e.kind(), fired)
            }
        }
    }

    /// Deliver one notice. Delivery failures are logged and swallowed.
    async fn push(&self, race: &TrackedRace, notice: Notice) {
        let url = match notice.link() {
            LinkKind::Live => race.url().to_string(),
            LinkKind::Result => result_url(race.url()),
        };
        let message = Message::new(notice.message())
            .title(race.title.clone())
            .url(url);

        let delivered = match &self.notifier {
            Some(notifier) => match notifier.send(&message).await {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %e, notice = %message.message, "pushover error");
                    false
                }
            },
            None => false,
        };
        record_notice(&tracing::Span::current(), &notice, delivered);
    }

    /// Sleep for `interval`. Returns `false` if shutdown was requested.
    async fn pause(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.0.notified() => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }

    /// Watch one race until shutdown, starting from its first snapshot.
    ///
    /// Errors from the first snapshot's state write are returned; later
    /// failures are logged and counted.
    pub async fn run_single(&mut self, mut race: TrackedRace, first: Snapshot) -> Result<()> {
        info!(race = %race.key, title = %race.title, "tracking");
        let span = race_span(&race.key, &race.title);
        self.handle(&race, &first).instrument(span).await?;
        if self.config.once {
            return Ok(());
        }

        while self.pause(self.config.poll_interval).await {
            self.poll(&mut race).await;
        }
        info!("shutting down");
        Ok(())
    }

    /// Discover live races periodically and watch all of them until shutdown.
    pub async fn run_auto(&mut self, discovery: &dyn Discovery, factory: &dyn SourceFactory) {
        let mut races: Vec<TrackedRace> = Vec::new();
        let mut accepted: HashMap<String, bool> = HashMap::new();
        let mut last_discovery: Option<Instant> = None;

        loop {
            if last_discovery.is_none_or(|at| at.elapsed() >= self.config.discovery_interval) {
                last_discovery = Some(Instant::now());
                self.discover(discovery, factory, &mut races, &mut accepted)
                    .await;
            }

            for race in races.iter_mut() {
                self.poll(race).await;
            }

            if self.config.once || !self.pause(self.config.poll_interval).await {
                break;
            }
        }
        info!(tracked = races.len(), "shutting down");
    }

    async fn discover(
        &mut self,
        discovery: &dyn Discovery,
        factory: &dyn SourceFactory,
        races: &mut Vec<TrackedRace>,
        accepted: &mut HashMap<String, bool>,
    ) {
        for path in discovery.list_live_event_paths().await {
            if self.config.men_worldtour_only && !passes_filter(discovery, &path, accepted).await {
                continue;
            }

            let source = factory.open(&path);
            let reference = source.current_url().to_string();
            if races.iter().any(|r| r.url() == reference) {
                continue;
            }
            let race = match TrackedRace::open(source, &reference).await {
                Ok((race, _)) => race,
                Err(e) => {
                    debug!(path, error = %e, "skipping discovered race");
                    continue;
                }
            };
            if races.iter().any(|r| r.key == race.key) {
                continue;
            }

            // The record exists from discovery on; the discovery snapshot
            // itself is not evaluated.
            self.store.get_or_init(&race.key);
            if let Err(e) = self.store.apply_patch(&race.key, RecordPatch::default()) {
                error!(race = %race.key, error = %e, "failed to persist race state");
            }
            info!(race = %race.key, title = %race.title, "tracking");
            races.push(race);
        }
    }
}

/// Men's WorldTour / World Championship check, cached per base path.
async fn passes_filter(
    discovery: &dyn Discovery,
    path: &str,
    accepted: &mut HashMap<String, bool>,
) -> bool {
    let Some(base) = race_base_from_path(path) else {
        return false;
    };
    if let Some(ok) = accepted.get(&base) {
        return *ok;
    }
    let classification = discovery.classify(&base).await;
    let ok = classification.is_men_uwt_or_wc();
    debug!(race = %base, ?classification, ok, "classified");
    accepted.insert(base, ok);
    ok
}
