//! Upstream health tracking: consecutive fetch failures per race and when to
//! tell the user PCS is down or back.
//!
//! In memory only. A restart starts every race healthy.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::AlertSettings;
use crate::model::Notice;

/// When to raise "unreachable" and "reachable again" notices.
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    pub enabled: bool,
    pub recovery: bool,
    /// Consecutive failures before alerting. Never below 1.
    pub threshold: u32,
    /// Minimum gap between repeated "unreachable" alerts within one outage.
    pub cooldown: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::from(&AlertSettings::default())
    }
}

impl From<&AlertSettings> for AlertPolicy {
    fn from(settings: &AlertSettings) -> Self {
        Self {
            enabled: settings.enabled,
            recovery: settings.recovery,
            threshold: settings.threshold.max(1),
            cooldown: Duration::from_secs(settings.cooldown_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    /// Failing, but not yet at the alert threshold.
    Degrading,
    /// At or past the threshold.
    Down,
}

#[derive(Debug, Clone, Default)]
pub struct SourceHealth {
    consecutive_failures: u32,
    last_alert: Option<DateTime<Utc>>,
}

impl SourceHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_alert(&self) -> Option<DateTime<Utc>> {
        self.last_alert
    }

    pub fn state(&self, policy: &AlertPolicy) -> HealthState {
        match self.consecutive_failures {
            0 => HealthState::Healthy,
            n if n < policy.threshold.max(1) => HealthState::Degrading,
            _ => HealthState::Down,
        }
    }

    /// Count a failed fetch. Returns [`Notice::Unreachable`] when an alert is due.
    pub fn record_failure(&mut self, policy: &AlertPolicy, now: DateTime<Utc>) -> Option<Notice> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if !policy.enabled || self.state(policy) != HealthState::Down {
            return None;
        }
        let due = match self.last_alert {
            None => true,
            Some(at) => now
                .signed_duration_since(at)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= policy.cooldown),
        };
        if !due {
            return None;
        }
        self.last_alert = Some(now);
        Some(Notice::Unreachable)
    }

    /// Count a successful fetch. Returns [`Notice::Recovered`] after any failures
    /// when recovery alerts are on.
    pub fn record_success(&mut self, policy: &AlertPolicy) -> Option<Notice> {
        let was_failing = self.consecutive_failures > 0;
        self.consecutive_failures = 0;
        self.last_alert = None;
        (was_failing && policy.recovery).then_some(Notice::Recovered)
    }
}
