//! pcs-pushover CLI: watch one race or auto-discover live races.

use clap::Parser;
use pcs_pushover::config::{Config, Settings};
use pcs_pushover::discover::PcsHomepage;
use pcs_pushover::engine::{TrackedRace, WatchConfig, Watcher};
use pcs_pushover::error::FetchErrorKind;
use pcs_pushover::format::{format_extra_row, pretty_truncated};
use pcs_pushover::notify::{Notifier, PushoverNotifier};
use pcs_pushover::source::{LiveStatsFactory, PcsClient, SourceFactory};
use pcs_pushover::storage::StateStore;
use pcs_pushover::telemetry::{TelemetryConfig, init_telemetry};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "pcs-pushover",
    about = "PCS LiveStats → Pushover notifier (start, 100/50/10 km, finish)"
)]
struct Cli {
    /// PCS LiveStats page (relative like race/.../live or absolute URL)
    #[arg(long)]
    race: Option<String>,
    /// Auto-discover and track live races from the PCS homepage
    #[arg(long)]
    auto: bool,
    /// Polling interval in seconds [default: 30, minimum 5]
    #[arg(long)]
    interval: Option<u64>,
    /// Discovery refresh interval in seconds [default: 120, minimum 30]
    #[arg(long)]
    discovery_interval: Option<u64>,
    /// Override PUSHOVER_TOKEN env var
    #[arg(long)]
    pushover_token: Option<String>,
    /// Override PUSHOVER_USER env var
    #[arg(long)]
    pushover_user: Option<String>,
    /// Run once and exit
    #[arg(long)]
    once: bool,
    /// Print parsed data keys (and with --once, the data itself)
    #[arg(long)]
    debug: bool,
    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// State file [default: .cache/state.json]
    #[arg(long)]
    state: Option<PathBuf>,
    /// Auto mode: only track Men's WorldTour and World Championship races
    #[arg(long)]
    men_worldtour_only: bool,
    /// Alert when PCS becomes unreachable (default: enabled)
    #[arg(long, overrides_with = "no_server_alerts")]
    server_alerts: bool,
    #[arg(long, hide = true)]
    no_server_alerts: bool,
    /// Alert when PCS becomes reachable again (default: enabled)
    #[arg(long, overrides_with = "no_server_recovery_alerts")]
    server_recovery_alerts: bool,
    #[arg(long, hide = true)]
    no_server_recovery_alerts: bool,
    /// Consecutive failures before alerting that PCS is down [default: 3]
    #[arg(long)]
    server_alert_threshold: Option<u32>,
    /// Cooldown in seconds between repeated server-down alerts [default: 600]
    #[arg(long)]
    server_alert_cooldown: Option<u64>,
}

impl Cli {
    /// Layer flags over file settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(secs) = self.interval {
            settings.poll_interval_secs = secs;
        }
        if let Some(secs) = self.discovery_interval {
            settings.discovery_interval_secs = secs;
        }
        if let Some(path) = &self.state {
            settings.state_path = path.clone();
        }
        if self.men_worldtour_only {
            settings.men_worldtour_only = true;
        }
        if let Some(on) = flag(self.server_alerts, self.no_server_alerts) {
            settings.alerts.enabled = on;
        }
        if let Some(on) = flag(self.server_recovery_alerts, self.no_server_recovery_alerts) {
            settings.alerts.recovery = on;
        }
        if let Some(threshold) = self.server_alert_threshold {
            settings.alerts.threshold = threshold;
        }
        if let Some(secs) = self.server_alert_cooldown {
            settings.alerts.cooldown_secs = secs;
        }
    }
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (_, true) => Some(false),
        (true, _) => Some(true),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::from_env().with_overrides(cli.pushover_token.clone(), cli.pushover_user.clone());
    init_telemetry(TelemetryConfig {
        log_level: config.log_level.clone(),
    })?;

    if !cli.auto && cli.race.is_none() {
        eprintln!("Error: either provide --race or use --auto");
        return Ok(ExitCode::from(2));
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);

    let notifier = build_notifier(config, &settings);
    let watch = WatchConfig {
        once: cli.once,
        debug: cli.debug,
        ..WatchConfig::from(&settings)
    };
    let mut watcher = Watcher::new(StateStore::open(&settings.state_path), notifier, watch);

    let shutdown = watcher.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        shutdown.shutdown();
    });

    let client = PcsClient::new(settings.clone())?;
    let factory = LiveStatsFactory::new(client.clone());

    let Some(reference) = cli.race.as_deref().filter(|_| !cli.auto) else {
        let discovery = PcsHomepage::new(client);
        watcher.run_auto(&discovery, &factory).await;
        return Ok(ExitCode::SUCCESS);
    };

    let (race, first) = match TrackedRace::open(factory.open(reference), reference).await {
        Ok(opened) => opened,
        Err(e) => {
            let hint = match e.kind() {
                FetchErrorKind::Unavailable => "PCS may be down. Please try again shortly.",
                FetchErrorKind::DataMissing => "Is the race live and URL ending with /live?",
                FetchErrorKind::Transport => "Network or unexpected error.",
            };
            error!(error = %e, "failed to load LiveStats");
            eprintln!("Failed to load LiveStats: {e} ({hint})");
            return Ok(ExitCode::from(2));
        }
    };

    if cli.once && cli.debug {
        println!("{}", pretty_truncated(&first.data, 2000));
        if let Some(rows) = first.data.get("extra_results").and_then(|v| v.as_array()) {
            for row in rows {
                println!("{}", format_extra_row(row));
            }
        }
    }

    watcher.run_single(race, first).await?;
    Ok(ExitCode::SUCCESS)
}

fn build_notifier(config: Config, settings: &Settings) -> Option<Box<dyn Notifier>> {
    let (Some(token), Some(user)) = (config.pushover_token, config.pushover_user) else {
        warn!("Pushover not configured (set PUSHOVER_TOKEN and PUSHOVER_USER), running in dry mode");
        return None;
    };
    match PushoverNotifier::new(settings.pushover_api_url.clone(), token, user) {
        Ok(notifier) => {
            info!("pushover configured");
            Some(Box::new(notifier))
        }
        Err(e) => {
            warn!(error = %e, "Pushover client unavailable, running in dry mode");
            None
        }
    }
}
