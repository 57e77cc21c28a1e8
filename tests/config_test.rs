use pcs_pushover::config::{Config, Settings};
use pcs_pushover::engine::{AlertPolicy, WatchConfig};
use secrecy::ExposeSecret;
use std::time::Duration;

#[test]
fn config_from_env_reads_credentials_and_overrides_win() {
    unsafe {
        std::env::set_var("PUSHOVER_TOKEN", "env-token");
        std::env::set_var("PUSHOVER_USER", "env-user");
    }

    let config = Config::from_env();
    assert_eq!(config.pushover_token.as_ref().unwrap().expose_secret(), "env-token");
    assert!(!config.log_level.is_empty());

    let config = config.with_overrides(Some("cli-token".to_string()), None);
    assert_eq!(config.pushover_token.as_ref().unwrap().expose_secret(), "cli-token");
    assert_eq!(config.pushover_user.as_ref().unwrap().expose_secret(), "env-user");

    unsafe {
        std::env::remove_var("PUSHOVER_TOKEN");
        std::env::remove_var("PUSHOVER_USER");
    }
}

#[test]
fn defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.state_path, std::path::PathBuf::from(".cache/state.json"));
    assert_eq!(s.poll_interval(), Duration::from_secs(30));
    assert_eq!(s.discovery_interval(), Duration::from_secs(120));
    assert!(s.alerts.enabled && s.alerts.recovery);
    assert_eq!(s.alerts.threshold, 3);
    assert_eq!(s.alerts.cooldown_secs, 600);
    assert!(!s.men_worldtour_only);
}

#[test]
fn toml_overrides_and_clamps() {
    let s = Settings::from_toml(
        r#"
        state_path = "/var/lib/pcs/state.json"
        poll_interval_secs = 1
        discovery_interval_secs = 10

        [alerts]
        threshold = 0
        cooldown_secs = 60
        recovery = false
        "#,
    )
    .unwrap();

    assert_eq!(s.state_path, std::path::PathBuf::from("/var/lib/pcs/state.json"));
    assert_eq!(s.poll_interval(), Duration::from_secs(5));
    assert_eq!(s.discovery_interval(), Duration::from_secs(30));
    assert!(s.alerts.enabled);

    let policy = AlertPolicy::from(&s.alerts);
    assert_eq!(policy.threshold, 1);
    assert_eq!(policy.cooldown, Duration::from_secs(60));
    assert!(!policy.recovery);

    let watch = WatchConfig::from(&s);
    assert_eq!(watch.poll_interval, Duration::from_secs(5));
    assert!(!watch.once);
}

#[test]
fn unknown_settings_file_is_an_error() {
    let path = std::env::temp_dir()
        .join(uuid::Uuid::new_v4().to_string())
        .join("missing.toml");
    assert!(Settings::load(Some(path.as_path())).is_err());
    assert!(Settings::load(None).is_ok());
}

#[test]
fn relative_references_resolve_against_base_url() {
    let s = Settings::default();
    assert_eq!(
        s.resolve_url("race/tour-de-france/2025/stage-1/live"),
        "https://www.procyclingstats.com/race/tour-de-france/2025/stage-1/live"
    );
    assert_eq!(s.resolve_url("https://example.test/live"), "https://example.test/live");
    assert_eq!(s.resolve_url(""), "https://www.procyclingstats.com/");
}
