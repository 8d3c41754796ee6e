//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/surf-api/config.toml`).
//! Every section and field has a default, so a partial file is valid. A
//! missing file is created with the defaults on first load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::metrics::{AggregatorConfig, DashboardConfig};
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::{LastPageLink, Paginator, MAX_PAGE_SIZE};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SURF_API_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// `$SURF_API_CONFIG` or `~/.config/surf-api/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("surf-api")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
    pub metrics: MetricsConfig,
    pub cache: CacheConfig,
    pub external: ExternalConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Grace period for in-flight work on shutdown, seconds
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub surf_url: String,
    pub bhop_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            surf_url: "sqlite://./surf.db?mode=rwc".to_string(),
            bhop_url: "sqlite://./bhop.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 8,
        }
    }
}

impl DatabaseSection {
    fn with_url(&self, url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }

    pub fn surf(&self) -> DatabaseConfig {
        self.with_url(&self.surf_url)
    }

    pub fn bhop(&self) -> DatabaseConfig {
        self.with_url(&self.bhop_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error (or a full `EnvFilter` directive)
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub last_page_link: LastPageLink,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: MAX_PAGE_SIZE,
            last_page_link: LastPageLink::PageZero,
        }
    }
}

impl PaginationConfig {
    pub fn paginator(&self) -> Paginator {
        Paginator::new()
            .with_max_page_size(self.max_page_size)
            .with_default_page_size(self.default_page_size)
            .with_last_page_link(self.last_page_link)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub slow_request_threshold_ms: f64,
    pub slowest_capacity: usize,
    pub histogram_capacity: usize,
    pub apdex_threshold_ms: f64,
    pub publish_interval_secs: u64,
    pub rotate_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            slow_request_threshold_ms: 100.0,
            slowest_capacity: 5,
            histogram_capacity: 10_000,
            apdex_threshold_ms: 200.0,
            publish_interval_secs: 60,
            rotate_interval_secs: 3600,
        }
    }
}

impl MetricsConfig {
    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            slow_request_threshold_ms: self.slow_request_threshold_ms,
            slowest_capacity: self.slowest_capacity,
            histogram_capacity: self.histogram_capacity,
            apdex_threshold_ms: self.apdex_threshold_ms,
        }
    }

    pub fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            publish_interval_secs: self.publish_interval_secs,
            rotate_interval_secs: self.rotate_interval_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            max_entries: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    /// Disable all player enrichment lookups
    pub enabled: bool,
    /// Steam Web API key; without it profile lookups are skipped
    pub steam_api_key: Option<String>,
    pub timeout_secs: u64,
    pub steam_api_base: String,
    pub country_api_base: String,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            steam_api_key: None,
            timeout_secs: 5,
            steam_api_base: "https://api.steampowered.com".to_string(),
            country_api_base: "https://api.country.is".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` allows any
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl AppConfig {
    /// Load from `path`, writing the defaults there when the file is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, raw).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.max_page_size == 0 || self.pagination.max_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "pagination.max_page_size must be within 1..={}",
                MAX_PAGE_SIZE
            )));
        }
        if self.pagination.default_page_size == 0
            || self.pagination.default_page_size > self.pagination.max_page_size
        {
            return Err(ConfigError::Invalid(
                "pagination.default_page_size must be within 1..=max_page_size".to_string(),
            ));
        }
        if self.metrics.slowest_capacity == 0 || self.metrics.histogram_capacity == 0 {
            return Err(ConfigError::Invalid(
                "metrics capacities must be positive".to_string(),
            ));
        }
        if !(self.metrics.apdex_threshold_ms.is_finite() && self.metrics.apdex_threshold_ms > 0.0) {
            return Err(ConfigError::Invalid(
                "metrics.apdex_threshold_ms must be a positive number".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be \"text\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [pagination]
            last_page_link = "first_page"

            [external]
            steam_api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.pagination.last_page_link, LastPageLink::FirstPage);
        assert_eq!(config.pagination.max_page_size, 100);
        assert_eq!(config.external.steam_api_key.as_deref(), Some("abc"));
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            AppConfig::from_toml("[pagination]\nmax_page_size = 500"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[metrics]\napdex_threshold_ms = -10.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[logging]\nformat = \"xml\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[server]\nport = \"eighty\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let dir = std::env::temp_dir().join(format!("surf-api-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let created = AppConfig::load(&path).unwrap();
        assert_eq!(created, AppConfig::default());
        assert!(path.exists());

        let mut changed = created.clone();
        changed.server.port = 4000;
        changed.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().server.port, 4000);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn database_section_builds_per_mode_configs() {
        let section = DatabaseSection::default();
        assert!(section.surf().url.contains("surf.db"));
        assert!(section.bhop().url.contains("bhop.db"));
        assert_eq!(section.bhop().max_connections, 10);
    }
}
