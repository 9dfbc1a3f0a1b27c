//! Configuration management for the DTS client
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! config file, `DTS_*` environment variables, and finally CLI flags (applied
//! by the caller). The API key is never stored here; see [`crate::auth`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::ClientConfig;
use crate::constants::{api, config as paths, env as env_constants, http, logging, polling};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Which DTS to talk to, and as whom
    pub server: ServerConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Status polling for `transfer status --watch`
    pub poll: PollConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server location and default requester identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server root URL
    pub url: String,
    /// Optional port appended to the URL
    pub port: Option<u16>,
    /// ORCID used when a command does not pass one
    pub orcid: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: api::DEFAULT_SERVER.to_string(),
            port: None,
            orcid: None,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: Some(http::TCP_KEEPALIVE.as_secs()),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
        }
    }
}

/// Polling configuration for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Milliseconds between status polls
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: polling::DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

impl PollConfig {
    /// Poll interval, never shorter than the CLI minimum
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms).max(polling::MIN_INTERVAL)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no -v/-q flag is given
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
            colored_output: true,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path });
            }
        }

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `DTS_SERVER`, `DTS_PORT` and `DTS_ORCID`
    ///
    /// `lookup` abstracts the environment so the precedence rules can be tested.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env_constants::SERVER).filter(|v| !v.trim().is_empty()) {
            debug!("Server overridden by {}", env_constants::SERVER);
            self.server.url = url;
        }
        if let Some(port) = lookup(env_constants::PORT).filter(|v| !v.trim().is_empty()) {
            let parsed = port.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                field: env_constants::PORT.to_string(),
                value: port.clone(),
                reason: e.to_string(),
            })?;
            self.server.port = Some(parsed);
        }
        if let Some(orcid) = lookup(env_constants::ORCID).filter(|v| !v.trim().is_empty()) {
            self.server.orcid = Some(orcid);
        }
        Ok(())
    }

    /// Rejects settings that could never work
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "server.url".to_string(),
            });
        }
        if self.client.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Request timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Initialize configuration on first run
    ///
    /// Creates a default config file if none exists and returns its path
    pub async fn initialize_first_run() -> ConfigResult<PathBuf> {
        let config_path = Self::get_default_config_path()?;

        if config_path.exists() {
            return Ok(config_path);
        }

        info!("Creating default configuration file...");
        Self::write_default(&config_path).await?;
        Ok(config_path)
    }

    /// Writes the commented default configuration to `path`
    pub async fn write_default(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::Io {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Renders the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let search_paths = vec![
            Some(PathBuf::from(format!("./{}", paths::LOCAL_FILE))),
            Self::get_default_config_path().ok(),
            #[cfg(unix)]
            Some(PathBuf::from(paths::SYSTEM_FILE)),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::Io {
            path: PathBuf::from("~"),
            reason: "Could not determine user config directory".to_string(),
        })?;

        Ok(config_dir.join(paths::APP_DIR).join(paths::FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# DTS Client Configuration
# This file was generated by `dts config init`.
# The API key is not stored here; set {api_key_env} or run `dts auth setup`.

[server]
# DTS server root
url = "{server}"
# port = 443
# ORCID used when a command does not pass --orcid
# orcid = "0000-0000-0000-0000"

[client]
# HTTP client settings
tcp_keepalive_secs = {keepalive}
tcp_nodelay = true
pool_idle_timeout_secs = {idle}
pool_max_per_host = {pool}
request_timeout_secs = {request}
connect_timeout_secs = {connect}

[poll]
# Milliseconds between status polls in `dts transfer status --watch`
interval_ms = {interval}

[logging]
level = "{level}"  # error, warn, info, debug, trace
colored_output = true
"#,
            api_key_env = env_constants::API_KEY,
            server = api::DEFAULT_SERVER,
            keepalive = http::TCP_KEEPALIVE.as_secs(),
            idle = http::POOL_IDLE_TIMEOUT.as_secs(),
            pool = http::POOL_MAX_PER_HOST,
            request = http::DEFAULT_TIMEOUT.as_secs(),
            connect = http::CONNECT_TIMEOUT.as_secs(),
            interval = polling::DEFAULT_INTERVAL.as_millis(),
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}
