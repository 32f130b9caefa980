use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub system: SystemConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub strategies: StrategiesConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    pub dry_run: bool,
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_recovery_delay_ms")]
    pub recovery_delay_ms: u64,
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn recovery_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_delay_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            recovery_delay_ms: default_recovery_delay_ms(),
            task_timeout_ms: default_task_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub base_url: String,
    #[serde(default = "default_sport")]
    pub sport: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_url(),
            sport: default_sport(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StrategiesConfig {
    #[serde(default)]
    pub third_quarter: ThirdQuarterConfig,
    #[serde(default)]
    pub fourth_quarter: FourthQuarterConfig,
}

/// Scoring-pace rule, evaluated while the event is in its 3rd period.
#[derive(Debug, Clone, Deserialize)]
pub struct ThirdQuarterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_min_points")]
    pub min_points: u32,
    #[serde(default = "default_third_quarter_line")]
    pub line: f64,
}

impl Default for ThirdQuarterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_points: default_min_points(),
            line: default_third_quarter_line(),
        }
    }
}

/// Close-game rule, evaluated while the event is in its 4th period.
#[derive(Debug, Clone, Deserialize)]
pub struct FourthQuarterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_diff")]
    pub max_diff: u32,
    #[serde(default = "default_fourth_quarter_line")]
    pub line: f64,
}

impl Default for FourthQuarterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_diff: default_max_diff(),
            line: default_fourth_quarter_line(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_enabled")]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: true,
            csv_log_path: default_csv_log_path(),
        }
    }
}

fn default_poll_interval_ms() -> u64 { 1_000 }
fn default_recovery_delay_ms() -> u64 { 5_000 }
fn default_task_timeout_ms() -> u64 { 15_000 }
fn default_feed_url() -> String { "https://api.sofascore.com/api/v1".to_string() }
fn default_sport() -> String { "basketball".to_string() }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_enabled() -> bool { true }
fn default_min_points() -> u32 { 12 }
fn default_third_quarter_line() -> f64 { 37.5 }
fn default_max_diff() -> u32 { 7 }
fn default_fourth_quarter_line() -> f64 { 39.5 }
fn default_csv_log_path() -> String { "matches.log".to_string() }

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub bot_token: Option<String>,
    pub telegram_api_url: String,
    pub autostart_chat_id: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            bot_token: std::env::var("BOT_TOKEN").ok().filter(|t| !t.is_empty()),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            autostart_chat_id: std::env::var("AUTOSTART_CHAT_ID").ok().filter(|c| !c.is_empty()),
        })
    }
}
