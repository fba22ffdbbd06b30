use chronos_planning::{SyncMode, WeekWrap};
use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Structured JSON output instead of the console format
    #[serde(default)]
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    /// Identity signed in by the CLI
    #[serde(default)]
    pub id: Option<String>,
    /// IANA zone used to compute local calendar dates
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: None,
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Synchronization mode per period type
#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "live")]
    pub daily: SyncMode,
    #[serde(default = "once")]
    pub weekly: SyncMode,
    #[serde(default = "once")]
    pub monthly: SyncMode,
    #[serde(default = "once")]
    pub annual: SyncMode,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            daily: live(),
            weekly: once(),
            monthly: once(),
            annual: once(),
        }
    }
}

fn live() -> SyncMode {
    SyncMode::Live
}

fn once() -> SyncMode {
    SyncMode::Once
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PlanningConfig {
    #[serde(default)]
    pub week_wrap: WeekWrap,
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (CHRONOS__DATABASE__URL, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("database.url", "sqlite:chronos.db")?
            .set_default("database.max_connections", 5)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Optional, ignored when missing
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("CHRONOS")
                .separator("__")
                .try_parsing(true),
        );

        // Legacy variables without prefix
        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }
        if let Ok(user) = env::var("CHRONOS_USER") {
            builder = builder.set_override("user.id", user)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if !chronos_shared::is_known_timezone(&self.user.timezone) {
            return Err(format!("Unknown time zone: {}", self.user.timezone));
        }
        if self.user.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err("User id must not be empty".to_string());
        }
        Ok(())
    }
}
