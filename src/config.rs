use serde::Deserialize;

use crate::events::DEFAULT_TOPIC;
use crate::scheduler::{DEFAULT_DAILY_SCHEDULE, DEFAULT_MONTHLY_SCHEDULE, parse_schedule};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Six-field cron, local time.
    #[serde(default = "default_daily_schedule")]
    pub daily_report_schedule: String,
    #[serde(default = "default_monthly_schedule")]
    pub monthly_report_schedule: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            daily_report_schedule: default_daily_schedule(),
            monthly_report_schedule: default_monthly_schedule(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    60_000
}

fn default_daily_schedule() -> String {
    DEFAULT_DAILY_SCHEDULE.to_string()
}

fn default_monthly_schedule() -> String {
    DEFAULT_MONTHLY_SCHEDULE.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerConfig {
    /// Daemon address; unset means the local endpoint (or DOCKER_HOST).
    pub host: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Events buffered per /ws/events subscriber before a slow client starts lagging.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_timeout_ms")]
    pub webhook_timeout_ms: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            broadcast_capacity: default_broadcast_capacity(),
            webhook_url: None,
            webhook_timeout_ms: default_webhook_timeout_ms(),
        }
    }
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_broadcast_capacity() -> usize {
    256
}

fn default_webhook_timeout_ms() -> u64 {
    5_000
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.monitoring.poll_interval_ms > 0,
            "monitoring.poll_interval_ms must be > 0, got {}",
            self.monitoring.poll_interval_ms
        );
        parse_schedule(&self.monitoring.daily_report_schedule)
            .map_err(|e| anyhow::anyhow!("monitoring.daily_report_schedule: {}", e))?;
        parse_schedule(&self.monitoring.monthly_report_schedule)
            .map_err(|e| anyhow::anyhow!("monitoring.monthly_report_schedule: {}", e))?;
        anyhow::ensure!(
            !self.events.topic.is_empty(),
            "events.topic must be non-empty"
        );
        anyhow::ensure!(
            self.events.broadcast_capacity > 0,
            "events.broadcast_capacity must be > 0, got {}",
            self.events.broadcast_capacity
        );
        if let Some(url) = &self.events.webhook_url {
            anyhow::ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "events.webhook_url must be an http(s) URL, got {:?}",
                url
            );
            anyhow::ensure!(
                self.events.webhook_timeout_ms > 0,
                "events.webhook_timeout_ms must be > 0, got {}",
                self.events.webhook_timeout_ms
            );
        }
        Ok(())
    }
}
