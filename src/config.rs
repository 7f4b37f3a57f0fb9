//! Configuration module for EPGMUX.

use serde::Deserialize;
use std::path::Path;

use crate::{EpgmuxError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// File name of the served artifact, also used as its route path.
    #[serde(default = "default_artifact_filename")]
    pub artifact_filename: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_artifact_filename() -> String {
    "merged_epg.xml.gz".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            artifact_filename: default_artifact_filename(),
        }
    }
}

/// Guide feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// Feed source URLs, merged in this order.
    #[serde(default = "default_feed_urls")]
    pub urls: Vec<String>,
    /// Interval between update cycles in seconds.
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    /// Total request timeout per feed in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum compressed feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_feed_urls() -> Vec<String> {
    [
        "https://epgshare01.online/epgshare01/epg_ripper_US2.xml.gz",
        "https://epgshare01.online/epgshare01/epg_ripper_US_LOCALS1.xml.gz",
        "https://epgshare01.online/epgshare01/epg_ripper_US_SPORTS1.xml.gz",
        "https://epgshare01.online/epgshare01/epg_ripper_CA2.xml.gz",
        "https://epgshare01.online/epgshare01/epg_ripper_PLEX1.xml.gz",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_update_interval() -> u64 {
    86400 // daily
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    100 * 1024 * 1024 // 100MB
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
            update_interval_secs: default_update_interval(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file. Logging is console-only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Guide feed configuration.
    #[serde(default)]
    pub feeds: FeedsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(EpgmuxError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EpgmuxError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `PORT`: Override the listening port (hosting platform contract)
    /// - `EPGMUX_FEED_URLS`: Comma-separated feed URLs
    /// - `EPGMUX_UPDATE_INTERVAL_SECS`: Update cycle interval in seconds
    /// - `EPGMUX_LOG_LEVEL`: Log level
    ///
    /// Empty or unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(urls) = std::env::var("EPGMUX_FEED_URLS") {
            if !urls.is_empty() {
                self.feeds.urls = urls
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
        }

        if let Ok(interval) = std::env::var("EPGMUX_UPDATE_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse() {
                self.feeds.update_interval_secs = interval;
            }
        }

        if let Ok(level) = std::env::var("EPGMUX_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - A feed URL does not parse or uses a scheme other than http/https
    /// - The update interval or fetch timeout is zero
    /// - The artifact file name is empty or contains characters unsuitable
    ///   for a route path
    ///
    /// An empty feed URL list is legal; cycles then publish an empty guide.
    pub fn validate(&self) -> Result<()> {
        for url in &self.feeds.urls {
            let parsed = url::Url::parse(url)
                .map_err(|e| EpgmuxError::Validation(format!("invalid feed URL {url}: {e}")))?;
            match parsed.scheme() {
                "http" | "https" => {}
                scheme => {
                    return Err(EpgmuxError::Validation(format!(
                        "unsupported feed URL scheme: {scheme}"
                    )));
                }
            }
        }

        if self.feeds.update_interval_secs == 0 {
            return Err(EpgmuxError::Validation(
                "update_interval_secs must be nonzero".to_string(),
            ));
        }

        if self.feeds.timeout_secs == 0 || self.feeds.connect_timeout_secs == 0 {
            return Err(EpgmuxError::Validation(
                "feed timeouts must be nonzero".to_string(),
            ));
        }

        let filename = &self.server.artifact_filename;
        if filename.is_empty()
            || !filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(EpgmuxError::Validation(format!(
                "artifact_filename must be a plain file name, got {filename:?}"
            )));
        }

        Ok(())
    }
}
