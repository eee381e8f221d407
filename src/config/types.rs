//! Configuration types for rbac-gate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::util::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Authorization core settings
    pub authz: AuthzConfig,

    /// How callers are identified
    pub identity: IdentityConfig,

    /// Where the policy graph comes from
    pub policy: PolicyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 20380,
        }
    }
}

/// Authorization core configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Leading path segments that mark a resource request (`/api/v1/...`)
    pub api_prefixes: Vec<String>,

    /// Prefixes followed by an API group and version (`/apis/<group>/<version>/...`)
    pub grouped_prefixes: Vec<String>,

    /// Upper bound for a single policy store lookup
    pub store_timeout_ms: u64,

    /// Grant cache in front of the role resolver
    pub cache: CacheConfig,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            api_prefixes: vec!["api".to_string()],
            grouped_prefixes: Vec::new(),
            store_timeout_ms: 500,
            cache: CacheConfig::default(),
        }
    }
}

impl AuthzConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Grant cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable caching of resolved role sets
    pub enabled: bool,

    /// Maximum age of a cached entry
    pub ttl_secs: u64,

    /// Maximum number of cached principals
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30,
            max_entries: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Identity extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Bearer tokens mapped to user ids
    #[default]
    Token,
    /// Trust a header set by an authenticating proxy
    Header,
}

/// Identity provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub mode: IdentityMode,

    /// Header carrying the user id in `header` mode
    pub header: String,

    /// User id → bearer token, for `token` mode
    pub tokens: HashMap<String, SecretString>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Token,
            header: "x-remote-user".to_string(),
            tokens: HashMap::new(),
        }
    }
}

/// Policy source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Policy snapshot file (TOML or JSON) loaded at startup
    pub file: Option<String>,

    /// Seed the built-in resources and system groups
    pub bootstrap: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            file: None,
            bootstrap: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.authz.api_prefixes, vec!["api"]);
        assert_eq!(config.authz.store_timeout(), Duration::from_millis(500));
        assert!(config.authz.cache.enabled);
        assert_eq!(config.identity.mode, IdentityMode::Token);
        assert!(config.policy.bootstrap);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_identity_mode() {
        let mode: IdentityMode = serde_json::from_str(r#""header""#).unwrap();
        assert_eq!(mode, IdentityMode::Header);

        let mode: IdentityMode = serde_json::from_str(r#""token""#).unwrap();
        assert_eq!(mode, IdentityMode::Token);
    }

    #[test]
    fn test_deserialize_log_format() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
