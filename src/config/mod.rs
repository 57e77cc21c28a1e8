//! Typed configuration: credentials from the environment, tunables from TOML.
//!
//! Credentials load once at startup and are wrapped in `SecretString` so they
//! never reach the logs. Everything else lives in [`Settings`], which has a
//! default for every key; CLI flags are layered on top by the binary.

pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shortest poll interval we will hammer PCS with.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
pub const MIN_DISCOVERY_INTERVAL_SECS: u64 = 30;

pub const DEFAULT_BASE_URL: &str = "https://www.procyclingstats.com/";
pub const DEFAULT_PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug)]
pub struct Config {
    pub pushover_token: Option<SecretString>,
    pub pushover_user: Option<SecretString>,
    pub log_level: String,
}

impl Config {
    /// Load credentials from environment variables.
    ///
    /// Call `dotenvy::dotenv().ok()` first to pick up a local `.env`.
    /// Missing Pushover credentials are not an error here; the watcher
    /// falls back to dry mode.
    pub fn from_env() -> Self {
        Self {
            pushover_token: optional_secret("PUSHOVER_TOKEN"),
            pushover_user: optional_secret("PUSHOVER_USER"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Replace env credentials with explicit overrides (CLI flags).
    pub fn with_overrides(mut self, token: Option<String>, user: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.pushover_token = Some(SecretString::from(token));
        }
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            self.pushover_user = Some(SecretString::from(user));
        }
        self
    }
}

fn optional_secret(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// Runtime tunables, loadable from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub state_path: PathBuf,
    pub poll_interval_secs: u64,
    pub discovery_interval_secs: u64,
    pub base_url: String,
    pub pushover_api_url: String,
    /// Auto mode only tracks Men's WorldTour and World Championship races.
    pub men_worldtour_only: bool,
    pub alerts: AlertSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(".cache/state.json"),
            poll_interval_secs: 30,
            discovery_interval_secs: 120,
            base_url: DEFAULT_BASE_URL.to_string(),
            pushover_api_url: DEFAULT_PUSHOVER_API_URL.to_string(),
            men_worldtour_only: false,
            alerts: AlertSettings::default(),
        }
    }
}

/// `[alerts]` table: when to tell the user PCS is down.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub enabled: bool,
    pub recovery: bool,
    pub threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            recovery: true,
            threshold: 3,
            cooldown_secs: 600,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read settings {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("bad settings {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(
            self.discovery_interval_secs
                .max(MIN_DISCOVERY_INTERVAL_SECS),
        )
    }

    /// Resolve a relative `race/...` reference against the base URL.
    pub fn resolve_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            reference.trim_start_matches('/')
        )
    }
}
