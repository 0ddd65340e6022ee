//! Configuration infrastructure
//!
//! All request identity, crawl pacing, and storage settings come from one
//! serde-backed config file; nothing is read from ambient globals. The
//! manager creates a default file on first run and loads it thereafter.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

/// Built-in defaults, kept in one place.
pub mod defaults {
    pub const BASE_URL: &str = "https://boardgamegeek.com";
    pub const TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;
    pub const START_PAGE: u32 = 1;
    pub const REQUEST_DELAY_MS: u64 = 500;
    pub const RETRY_MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 500;
    pub const LOG_LEVEL: &str = "info";
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Crawl pacing and enumeration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page to request.
    pub start_page: u32,

    /// Optional cap on pages walked in one run; `None` walks to the first
    /// empty page.
    pub max_pages: Option<u32>,

    /// Courtesy delay between item requests in milliseconds.
    pub request_delay_ms: u64,

    /// Attempts per item before it lands in the deferred retry set.
    pub retry_max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub retry_delay_ms: u64,

    /// Skip identifiers already stored instead of re-fetching them. Off by
    /// default: re-fetching is the refresh mechanism.
    pub skip_existing: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_page: defaults::START_PAGE,
            max_pages: None,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            retry_max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
            skip_existing: false,
        }
    }
}

/// Remote catalog endpoints and request identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    /// Session cookies, name -> value. Supplied by the operator; never
    /// hardcoded.
    pub cookies: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            user_agent: concat!("boardgame-keep/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: defaults::TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            cookies: HashMap::new(),
        }
    }
}

/// SQLite location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database file path; defaults under the user data directory.
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn database_url(&self) -> Result<String> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .context("Failed to get user data directory")?
                .join("boardgame-keep")
                .join("catalog.db"),
        };
        Ok(format!("sqlite:{}", path.display()))
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: true,
            file_output: false,
        }
    }
}

/// Loads and saves the configuration file.
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    pub fn get_config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("boardgame-keep"))
    }

    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    /// Load the config, writing defaults on first run.
    pub async fn initialize_on_first_run(&self) -> Result<AppConfig> {
        let config_dir = self
            .config_path
            .parent()
            .context("Failed to get config directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .await
                .context("Failed to create config directory")?;
        }

        if self.config_path.exists() {
            self.load_config().await
        } else {
            info!("First run detected, writing default configuration");
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            Ok(default_config)
        }
    }

    pub async fn load_config(&self) -> Result<AppConfig> {
        let contents = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", self.config_path))
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, contents)
            .await
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;
        Ok(())
    }
}
