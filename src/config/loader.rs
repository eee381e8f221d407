//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (RBAC_GATE__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "rbac-gate.toml",
    ".rbac-gate.toml",
    "~/.config/rbac-gate/config.toml",
    "/etc/rbac-gate/config.toml",
];

static PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g. RBAC_GATE__SERVER__PORT, RBAC_GATE__AUTHZ__API_PREFIXES=api,apis
    builder = builder.add_source(
        Environment::with_prefix("RBAC_GATE")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("authz.api_prefixes")
            .with_list_parse_key("authz.grouped_prefixes")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.authz.api_prefixes.is_empty() && config.authz.grouped_prefixes.is_empty() {
        return Err(ConfigError::Missing {
            field: "authz.api_prefixes".to_string(),
        });
    }

    for prefix in config
        .authz
        .api_prefixes
        .iter()
        .chain(&config.authz.grouped_prefixes)
    {
        if !PREFIX_REGEX.is_match(prefix) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "API prefix '{}' must be a single path segment without '/'",
                    prefix
                ),
            });
        }
    }

    if config.authz.store_timeout_ms == 0 {
        return Err(ConfigError::Invalid {
            message: "authz.store_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.authz.cache.enabled {
        if config.authz.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "authz.cache.ttl_secs must be greater than 0".to_string(),
            });
        }
        if config.authz.cache.max_entries == 0 {
            return Err(ConfigError::Invalid {
                message: "authz.cache.max_entries must be greater than 0".to_string(),
            });
        }
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.identity.header.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "identity.header".to_string(),
        });
    }

    Ok(())
}
