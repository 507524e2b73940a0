//! Relay configuration with validation.
//!
//! Sources, later wins: built-in defaults, an optional TOML file named by
//! `FLASH_CONFIG`, then individual `FLASH_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "FLASH_CONFIG";

/// Main relay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Queue store configuration
    pub store: StoreConfig,
}

impl RelayConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    /// Parse TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `FLASH_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FLASH_HTTP_HOST") {
            self.http.host = parse_env("FLASH_HTTP_HOST", &host)?;
        }
        if let Some(port) = lookup("FLASH_HTTP_PORT") {
            self.http.port = parse_env("FLASH_HTTP_PORT", &port)?;
        }
        if let Some(namespace) = lookup("FLASH_NAMESPACE") {
            self.http.namespace = namespace;
        }
        if let Some(backend) = lookup("FLASH_STORE_BACKEND") {
            self.store.backend = parse_env("FLASH_STORE_BACKEND", &backend)?;
        }
        if let Some(url) = lookup("FLASH_REDIS_URL") {
            self.store.url = url;
        }
        if let Some(secs) = lookup("FLASH_RETENTION_SECS") {
            self.store.retention = Duration::from_secs(parse_env("FLASH_RETENTION_SECS", &secs)?);
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port cannot be 0".into()));
        }

        validate_prefix("http.namespace", &self.http.namespace)?;
        validate_prefix("http.health_prefix", &self.http.health_prefix)?;
        if self.http.namespace == self.http.health_prefix {
            return Err(ConfigError::Invalid(
                "http.namespace and http.health_prefix must differ".into(),
            ));
        }

        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit("max_body_bytes cannot be 0".into()));
        }

        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("request_timeout cannot be 0".into()));
        }
        if self.store.connect_timeout.is_zero() || self.store.response_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "store timeouts cannot be 0; an unbounded backend call stalls the pool".into(),
            ));
        }

        if self.store.retention < Duration::from_secs(1) {
            return Err(ConfigError::Invalid("store.retention must be at least 1s".into()));
        }

        if self.store.drain_connections == 0 {
            return Err(ConfigError::InvalidLimit("store.drain_connections cannot be 0".into()));
        }

        if self.store.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("store.retry.max_attempts cannot be 0".into()));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 5770)
    pub port: u16,
    /// Route prefix for the flash endpoints
    pub namespace: String,
    /// Route prefix for liveness/readiness checks
    pub health_prefix: String,
    /// Max request body size in bytes
    pub max_body_bytes: usize,
    /// Whole-request time budget
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5770,
            namespace: "/api/v1/user".to_string(),
            health_prefix: "/health".to_string(),
            max_body_bytes: 64 * 1024,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Which store adapter to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Queue store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Adapter to use
    pub backend: StoreBackend,
    /// Redis connection URL
    pub url: String,
    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Per-command response timeout
    #[serde(with = "humantime_serde")]
    pub response_timeout: Duration,
    /// Queue time-to-live, refreshed on every enqueue
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
    /// Optimistic drain retry budget
    pub retry: RetryPolicy,
    /// Upper bound on connections reserved for drains (Redis only)
    pub drain_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: "redis://127.0.0.1:6379/0".to_string(),
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(2),
            retention: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            drain_connections: 4,
        }
    }
}

/// Bounded retry for the optimistic drain.
///
/// Attempt `n` (1-based) that loses the race waits `backoff * n` before the
/// next attempt. After `max_attempts` losses the drain fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_millis(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after losing attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file: {0}")]
    Io(String),
    /// Config file is not valid TOML for this schema
    #[error("cannot parse config: {0}")]
    Parse(String),
    /// Environment override has the wrong shape
    #[error("invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
    })
}

fn validate_prefix(field: &str, prefix: &str) -> Result<(), ConfigError> {
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        return Err(ConfigError::Invalid(format!(
            "{} must start with '/' and not end with '/': {:?}",
            field, prefix
        )));
    }
    Ok(())
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
