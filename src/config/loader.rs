//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the process
/// environment, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-provided values onto `config`.
///
/// `lookup` abstracts the environment so the mapping can be tested without
/// touching process state. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("STORAGE_BUCKET") {
        config.storage.bucket = v;
    }
    if let Some(v) = get("STORAGE_ENDPOINT") {
        config.storage.endpoint = v;
    }
    if let Some(v) = get("STORAGE_REGION") {
        config.storage.region = v;
    }
    if let Some(v) = get("STORAGE_ACCESS_KEY_ID") {
        config.storage.access_key_id = v;
    }
    if let Some(v) = get("STORAGE_SECRET_ACCESS_KEY") {
        config.storage.secret_access_key = v;
    }
    if let Some(v) = get("STORAGE_VIRTUAL_HOSTED") {
        config.storage.virtual_hosted = is_truthy(&v);
    }
    if let Some(v) = get("CDN_ZONE_ID") {
        config.cdn.zone_id = Some(v);
    }
    if let Some(v) = get("CDN_API_TOKEN") {
        config.cdn.api_token = Some(v);
    }
    if let Some(v) = get("CDN_API_BASE") {
        config.cdn.api_base = v;
    }
    if let Some(v) = get("PURGE_SECRET") {
        config.cdn.purge_secret = Some(v);
    }
    if let Some(v) = get("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = v;
    }
    if let Some(v) = get("DISABLE_HTTPS_REDIRECT") {
        config.security.disable_https_redirect = is_truthy(&v);
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
