//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::TimeoutTier;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Host suffixes of platforms that suspend idle instances
    #[serde(default = "default_cold_start_hosts")]
    pub cold_start_hosts: Vec<String>,

    #[serde(default = "default_interactive_timeout")]
    pub interactive_timeout_secs: u64,

    #[serde(default = "default_standard_timeout")]
    pub standard_timeout_secs: u64,

    #[serde(default = "default_extended_timeout")]
    pub extended_timeout_secs: u64,

    /// Timeout for slow calls against a cold-start-prone origin
    #[serde(default = "default_cold_start_timeout")]
    pub cold_start_timeout_secs: u64,

    /// Timeout for the same slow calls against any other origin
    #[serde(default = "default_slow_call_timeout")]
    pub slow_call_timeout_secs: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_cold_start_hosts() -> Vec<String> {
    vec!["onrender.com".to_string()]
}

fn default_interactive_timeout() -> u64 {
    10
}

fn default_standard_timeout() -> u64 {
    30
}

fn default_extended_timeout() -> u64 {
    60
}

fn default_cold_start_timeout() -> u64 {
    240
}

fn default_slow_call_timeout() -> u64 {
    90
}

fn default_probe_timeout() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cold_start_hosts: default_cold_start_hosts(),
            interactive_timeout_secs: default_interactive_timeout(),
            standard_timeout_secs: default_standard_timeout(),
            extended_timeout_secs: default_extended_timeout(),
            cold_start_timeout_secs: default_cold_start_timeout(),
            slow_call_timeout_secs: default_slow_call_timeout(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ApiConfig {
    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Whether the configured origin is hosted on a sleep-on-idle platform
    pub fn is_cold_start_origin(&self) -> bool {
        let host = self
            .base_url()
            .split("://")
            .nth(1)
            .unwrap_or(self.base_url())
            .split(|c: char| c == '/' || c == ':')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        self.cold_start_hosts
            .iter()
            .any(|suffix| !suffix.is_empty() && host.ends_with(&suffix.to_lowercase()))
    }

    /// Resolve a timeout tier to a concrete deadline
    pub fn timeout_for(&self, tier: TimeoutTier) -> Duration {
        let secs = match tier {
            TimeoutTier::Interactive => self.interactive_timeout_secs,
            TimeoutTier::Standard => self.standard_timeout_secs,
            TimeoutTier::Extended => self.extended_timeout_secs,
            TimeoutTier::ColdStart if self.is_cold_start_origin() => self.cold_start_timeout_secs,
            TimeoutTier::ColdStart => self.slow_call_timeout_secs,
            TimeoutTier::Probe => self.probe_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total network attempts per logical operation, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Attempt n waits n times this step before retrying
    #[serde(default = "default_backoff_step")]
    pub backoff_step_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_backoff_step() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step(),
        }
    }
}

/// Local session persistence configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Session file path. Defaults to the platform data directory.
    pub file: Option<String>,
}

impl SessionConfig {
    /// Resolve the session file location
    pub fn path(&self) -> PathBuf {
        match &self.file {
            Some(file) => PathBuf::from(file),
            None => dirs::data_local_dir()
                .map(|p| p.join("claimsight").join("session.json"))
                .unwrap_or_else(|| PathBuf::from("./claimsight_session.json")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("claimsight").join("config.toml")),
            Some(PathBuf::from("./claimsight.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(url) = var("CLAIMSIGHT_API_URL") {
            self.api.base_url = url;
        }
        if let Some(hosts) = var("CLAIMSIGHT_COLD_START_HOSTS") {
            self.api.cold_start_hosts = hosts
                .split(',')
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect();
        }

        // Retry overrides
        if let Some(attempts) = var("CLAIMSIGHT_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.retry.max_attempts = n;
            }
        }
        if let Some(step) = var("CLAIMSIGHT_BACKOFF_MS") {
            if let Ok(ms) = step.parse() {
                self.retry.backoff_step_ms = ms;
            }
        }

        // Session overrides
        if let Some(file) = var("CLAIMSIGHT_SESSION_FILE") {
            self.session.file = Some(file);
        }

        // Logging overrides
        if let Some(level) = var("CLAIMSIGHT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CLAIMSIGHT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Claimsight Configuration
#
# Environment variables override these settings:
# - CLAIMSIGHT_API_URL
# - CLAIMSIGHT_COLD_START_HOSTS (comma-separated)
# - CLAIMSIGHT_MAX_ATTEMPTS
# - CLAIMSIGHT_BACKOFF_MS
# - CLAIMSIGHT_SESSION_FILE
# - CLAIMSIGHT_LOG_LEVEL
# - CLAIMSIGHT_LOG_FORMAT

[api]
# Backend base URL
base_url = "http://localhost:8001"

# Hosts that suspend idle instances; slow calls against them get a
# wake-up probe and the cold-start timeout
cold_start_hosts = ["onrender.com"]

# Timeouts in seconds
interactive_timeout_secs = 10
standard_timeout_secs = 30
extended_timeout_secs = 60
cold_start_timeout_secs = 240
slow_call_timeout_secs = 90
probe_timeout_secs = 15

[retry]
# Network attempts per operation, including the first one
max_attempts = 4

# Attempt n waits n * backoff_step_ms before retrying
backoff_step_ms = 5000

[session]
# Where the login session is kept between runs
# file = "~/.local/share/claimsight/session.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
