//! Configuration types

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::common::errors::{FantasyError, Result};
use crate::common::types::{Platform, PlayerId};

/// Main application configuration
///
/// Built once per invocation and passed by reference to each component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Yahoo-specific configuration
    #[serde(default)]
    pub yahoo: YahooConfig,
    /// Leagues keyed by the name used on the command line
    #[serde(default)]
    pub leagues: HashMap<String, LeagueConfig>,
    /// Timing of the scheduled run
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Retry and compensation bounds
    #[serde(default)]
    pub retry: RetrySettings,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Look up a league by name, ignoring case
    pub fn league(&self, name: &str) -> Result<&LeagueConfig> {
        self.leagues
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, league)| league)
            .ok_or_else(|| FantasyError::Configuration(format!("Unknown league: {}", name)))
    }
}

/// Yahoo platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooConfig {
    /// Base URL of the fantasy web pages (add/drop/waiver forms)
    #[serde(default = "default_yahoo_fantasy_url")]
    pub fantasy_url: String,
    /// Base URL of the fantasy JSON API
    #[serde(default = "default_yahoo_api_url")]
    pub api_url: String,
    /// Base URL of the OAuth2 token service
    #[serde(default = "default_yahoo_oauth_url")]
    pub oauth_url: String,
    /// Game key or code used in league/team keys
    #[serde(default = "default_yahoo_game_key")]
    pub game_key: String,
    /// Browser session cookie for the web forms
    #[serde(default)]
    pub cookie: Option<String>,
    /// Anti-forgery crumb that accompanies form posts
    #[serde(default)]
    pub crumb: Option<String>,
    /// OAuth2 client id
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Long-lived OAuth2 refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            fantasy_url: default_yahoo_fantasy_url(),
            api_url: default_yahoo_api_url(),
            oauth_url: default_yahoo_oauth_url(),
            game_key: default_yahoo_game_key(),
            cookie: None,
            crumb: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
        }
    }
}

impl YahooConfig {
    /// Collect the session material, failing on anything missing
    pub fn credentials(&self) -> Result<SessionCredentials> {
        fn require(value: &Option<String>, name: &str) -> Result<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| FantasyError::Configuration(format!("yahoo.{} is not set", name)))
        }

        Ok(SessionCredentials {
            cookie: require(&self.cookie, "cookie")?,
            crumb: require(&self.crumb, "crumb")?,
            client_id: require(&self.client_id, "client_id")?,
            client_secret: require(&self.client_secret, "client_secret")?,
            refresh_token: require(&self.refresh_token, "refresh_token")?,
        })
    }
}

fn default_yahoo_fantasy_url() -> String {
    "https://hockey.fantasysports.yahoo.com/hockey".to_string()
}

fn default_yahoo_api_url() -> String {
    "https://fantasysports.yahooapis.com/fantasy/v2".to_string()
}

fn default_yahoo_oauth_url() -> String {
    "https://api.login.yahoo.com/oauth2".to_string()
}

fn default_yahoo_game_key() -> String {
    "nhl".to_string()
}

/// One league the operator manages a team in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    /// Platform league id
    pub id: String,
    /// Display name of the league
    #[serde(default)]
    pub name: Option<String>,
    /// Team id within the league
    pub team_id: u32,
    /// Team display name
    #[serde(default)]
    pub team_name: Option<String>,
    /// Platform hosting the league
    #[serde(default = "default_platform")]
    pub platform: Platform,
    /// Players that must appear on the team page for the session to count
    /// as logged in to the right team
    #[serde(default)]
    pub locked_players: Vec<PlayerId>,
}

fn default_platform() -> Platform {
    Platform::Yahoo
}

/// Scheduler timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Daily roster-lock boundary in local time (HH:MM)
    #[serde(default = "default_lock_time")]
    pub lock_time: String,
    /// Seconds before the target to refresh credentials
    #[serde(default = "default_preflight_lead")]
    pub preflight_lead_seconds: u64,
    /// Longest single sleep before the wall clock is re-read
    #[serde(default = "default_sleep_slice")]
    pub max_sleep_slice_seconds: u64,
    /// Wake this many milliseconds before the target
    #[serde(default = "default_early_wake")]
    pub early_wake_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            lock_time: default_lock_time(),
            preflight_lead_seconds: default_preflight_lead(),
            max_sleep_slice_seconds: default_sleep_slice(),
            early_wake_ms: default_early_wake(),
        }
    }
}

impl SchedulerSettings {
    /// Parse `lock_time` as a wall-clock time
    pub fn lock_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.lock_time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(self.lock_time.trim(), "%H:%M:%S"))
            .map_err(|e| {
                FantasyError::Configuration(format!(
                    "Invalid scheduler.lock_time '{}': {}",
                    self.lock_time, e
                ))
            })
    }

    pub fn preflight_lead(&self) -> Duration {
        Duration::from_secs(self.preflight_lead_seconds)
    }

    pub fn max_sleep_slice(&self) -> Duration {
        Duration::from_secs(self.max_sleep_slice_seconds.max(1))
    }

    pub fn early_wake(&self) -> Duration {
        Duration::from_millis(self.early_wake_ms)
    }
}

fn default_lock_time() -> String {
    "00:00".to_string()
}

fn default_preflight_lead() -> u64 {
    120
}

fn default_sleep_slice() -> u64 {
    60
}

fn default_early_wake() -> u64 {
    300
}

/// Retry and compensation bounds for the executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum submissions before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Maximum wall-clock seconds spent retrying transient failures
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_seconds: u64,
    /// Delay between transient retries in milliseconds
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
    /// Wait after cancelling an unintended waiver claim
    #[serde(default = "default_waiver_cooldown")]
    pub waiver_cooldown_minutes: u64,
    /// Maximum waiver-claim cancellations
    #[serde(default = "default_max_compensations")]
    pub max_compensations: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_elapsed_seconds: default_max_elapsed(),
            backoff_ms: default_backoff(),
            waiver_cooldown_minutes: default_waiver_cooldown(),
            max_compensations: default_max_compensations(),
        }
    }
}

fn default_max_attempts() -> u32 {
    300
}

fn default_max_elapsed() -> u64 {
    300
}

fn default_backoff() -> u64 {
    100
}

fn default_waiver_cooldown() -> u64 {
    30
}

fn default_max_compensations() -> u32 {
    3
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format ("pretty" or "json")
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Credential material for an authenticated Yahoo session
#[derive(Clone)]
pub struct SessionCredentials {
    pub cookie: String,
    pub crumb: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("cookie", &"<redacted>")
            .field("crumb", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league(id: &str) -> LeagueConfig {
        LeagueConfig {
            id: id.to_string(),
            name: None,
            team_id: 1,
            team_name: None,
            platform: Platform::Yahoo,
            locked_players: vec![],
        }
    }

    #[test]
    fn test_league_lookup_ignores_case() {
        let mut config = AppConfig {
            yahoo: YahooConfig::default(),
            leagues: HashMap::new(),
            scheduler: SchedulerSettings::default(),
            retry: RetrySettings::default(),
            settings: AppSettings::default(),
        };
        config.leagues.insert("KKUPFL".to_string(), league("88127"));

        assert_eq!(config.league("kkupfl").unwrap().id, "88127");
        assert!(matches!(
            config.league("nope"),
            Err(FantasyError::Configuration(_))
        ));
    }

    #[test]
    fn test_lock_time_parsing() {
        let settings = SchedulerSettings::default();
        assert_eq!(
            settings.lock_time().unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );

        let bad = SchedulerSettings {
            lock_time: "25:99".to_string(),
            ..Default::default()
        };
        assert!(bad.lock_time().is_err());
    }

    #[test]
    fn test_credentials_require_every_field() {
        let mut yahoo = YahooConfig {
            cookie: Some("c".into()),
            crumb: Some("k".into()),
            client_id: Some("id".into()),
            client_secret: Some("hunter2".into()),
            refresh_token: None,
            ..YahooConfig::default()
        };
        assert!(yahoo.credentials().is_err());

        yahoo.refresh_token = Some("rt".into());
        let creds = yahoo.credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_retry_defaults() {
        let retry = RetrySettings::default();
        assert_eq!(retry.max_compensations, 3);
        assert_eq!(retry.waiver_cooldown_minutes, 30);
        assert_eq!(retry.backoff_ms, 100);
    }

    #[test]
    fn test_scheduler_wakes_early_by_default() {
        let scheduler = SchedulerSettings::default();
        assert_eq!(scheduler.early_wake(), Duration::from_millis(300));

        let parsed: SchedulerSettings = serde_json::from_str(r#"{"lock_time": "03:00"}"#).unwrap();
        assert_eq!(parsed.early_wake_ms, 300);
        assert_eq!(parsed.preflight_lead_seconds, 120);
    }
}
