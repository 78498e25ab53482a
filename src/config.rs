//! Configuration for the news relay service
//!
//! Loaded once from the environment (and an optional `.env` file) and passed
//! explicitly into every component constructor.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Database
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    // Feed
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    // Text generation provider
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,
    #[serde(default = "default_source_char_limit")]
    pub source_char_limit: usize,

    // Messaging
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
    #[serde(default = "default_notify_translated_only")]
    pub notify_translated_only: bool,

    // HTTP surface
    pub translate_secret: Option<String>,
    #[serde(default = "default_site_base_url")]
    pub site_base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    // Scheduling
    #[serde(default = "default_tick_interval")]
    pub tick_interval: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://news-relay.db?mode=rwc".to_string()
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_feed_url() -> String {
    "https://politepol.com/fd/C8llp5gJot31.json".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_openai_temperature() -> f32 {
    1.0
}

fn default_target_language() -> String {
    "Persian".to_string()
}

fn default_content_char_limit() -> usize {
    3000
}

fn default_source_char_limit() -> usize {
    12_000
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_notify_translated_only() -> bool {
    true
}

fn default_site_base_url() -> String {
    "https://8log.ir".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_listen_addr() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_tick_interval() -> String {
    "15m".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            database_max_connections: default_database_max_connections(),
            feed_url: default_feed_url(),
            openai_api_key: None,
            openai_base_url: default_openai_base_url(),
            openai_model: default_openai_model(),
            openai_temperature: default_openai_temperature(),
            target_language: default_target_language(),
            content_char_limit: default_content_char_limit(),
            source_char_limit: default_source_char_limit(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_base: default_telegram_api_base(),
            notify_translated_only: default_notify_translated_only(),
            translate_secret: None,
            site_base_url: default_site_base_url(),
            page_size: default_page_size(),
            listen_addr: default_listen_addr(),
            metrics_enabled: default_metrics_enabled(),
            tick_interval: default_tick_interval(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(invalid("page_size must be greater than zero"));
        }
        if self.content_char_limit == 0 || self.source_char_limit == 0 {
            return Err(invalid("character limits must be greater than zero"));
        }
        if self.database_max_connections == 0 {
            return Err(invalid("database_max_connections must be greater than zero"));
        }
        self.tick_period()?;
        Ok(())
    }

    /// Period of the scheduled ingest → enrich → notify cycle
    pub fn tick_period(&self) -> Result<Duration> {
        let period = humantime::parse_duration(self.tick_interval.trim()).map_err(|e| {
            invalid(&format!("tick_interval {:?}: {}", self.tick_interval, e))
        })?;
        if period.is_zero() {
            return Err(invalid("tick_interval must be non-zero"));
        }
        Ok(period)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn has_provider(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn has_messaging(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}

fn invalid(message: &str) -> PipelineError {
    PipelineError::Config(config::ConfigError::Message(message.to_string()))
}
