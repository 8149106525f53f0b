//! REST Generator Configuration
//!
//! Process-wide defaults for generated resources: mount prefix, listen
//! address, paging limits, cache TTLs and coercion policy. Individual
//! resources may tighten these at registration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coerce::CoercionPolicy;
use crate::query::{PageLimits, ABSOLUTE_MAX_PAGE, ABSOLUTE_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Path prefix all resources are mounted under (default: "/api/v1")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty disables the CORS layer
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub paging: PagingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Reject malformed numeric/boolean input instead of binding zero
    #[serde(default)]
    pub strict_coercion: bool,
}

fn default_prefix() -> String {
    "/api/v1".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            paging: PagingConfig::default(),
            cache: CacheConfig::default(),
            strict_coercion: false,
        }
    }
}

impl RestConfig {
    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn coercion_policy(&self) -> CoercionPolicy {
        if self.strict_coercion {
            CoercionPolicy::Strict
        } else {
            CoercionPolicy::Lenient
        }
    }

    /// Prefix normalized to a leading slash and no trailing slash
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

/// Paging limits applied to list requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_max_page")]
    pub max_page: u64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
}

fn default_max_page() -> u64 {
    ABSOLUTE_MAX_PAGE
}

fn default_max_page_size() -> u64 {
    ABSOLUTE_MAX_PAGE_SIZE
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            max_page: default_max_page(),
            max_page_size: default_max_page_size(),
            default_page_size: default_page_size(),
        }
    }
}

impl PagingConfig {
    /// Limits clamped to the absolute caps
    pub fn limits(&self) -> PageLimits {
        PageLimits::new(self.max_page, self.max_page_size, self.default_page_size)
    }
}

/// Cache TTLs and invalidation timing. A TTL of zero disables that cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub list_ttl_secs: u64,

    #[serde(default)]
    pub single_ttl_secs: u64,

    /// Delay before the second post-write delete (default: 500ms)
    #[serde(default = "default_double_delete_delay_ms")]
    pub double_delete_delay_ms: u64,
}

fn default_double_delete_delay_ms() -> u64 {
    500
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl_secs: 0,
            single_ttl_secs: 0,
            double_delete_delay_ms: default_double_delete_delay_ms(),
        }
    }
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Option<Duration> {
        ttl(self.list_ttl_secs)
    }

    pub fn single_ttl(&self) -> Option<Duration> {
        ttl(self.single_ttl_secs)
    }

    pub fn double_delete_delay(&self) -> Duration {
        Duration::from_millis(self.double_delete_delay_ms)
    }
}

fn ttl(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
