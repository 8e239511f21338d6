//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject partial storage credentials before the server starts
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, StorageConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or empty.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A field is present but unusable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Validated, immutable object-storage credentials and addressing.
///
/// Only constructible through [`OriginConfig::from_storage`], so holding
/// one means every credential field is present.
#[derive(Clone)]
pub struct OriginConfig {
    pub bucket: String,
    pub endpoint: Url,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub virtual_hosted: bool,
}

impl OriginConfig {
    /// Build origin credentials, collecting every missing or invalid field.
    pub fn from_storage(storage: &StorageConfig) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let required = [
            ("storage.bucket", &storage.bucket),
            ("storage.endpoint", &storage.endpoint),
            ("storage.region", &storage.region),
            ("storage.access_key_id", &storage.access_key_id),
            ("storage.secret_access_key", &storage.secret_access_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::Missing(field));
            }
        }

        let endpoint = if storage.endpoint.trim().is_empty() {
            None
        } else {
            match parse_endpoint(storage.endpoint.trim()) {
                Ok(url) => Some(url),
                Err(reason) => {
                    errors.push(ValidationError::Invalid {
                        field: "storage.endpoint",
                        reason,
                    });
                    None
                }
            }
        };

        match endpoint {
            Some(endpoint) if errors.is_empty() => Ok(Self {
                bucket: storage.bucket.trim().to_string(),
                endpoint,
                region: storage.region.trim().to_string(),
                access_key_id: storage.access_key_id.trim().to_string(),
                secret_access_key: storage.secret_access_key.clone(),
                virtual_hosted: storage.virtual_hosted,
            }),
            _ => Err(errors),
        }
    }
}

impl std::fmt::Debug for OriginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint.as_str())
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("endpoint has no host".to_string());
    }
    if url.path() != "/" || url.query().is_some() {
        return Err("endpoint must not carry a path or query".to_string());
    }
    Ok(url)
}

/// Validate the whole configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(mut storage_errors) = OriginConfig::from_storage(&config.storage) {
        errors.append(&mut storage_errors);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Invalid {
            field: "listener.bind_address",
            reason: format!("`{}` is not a socket address", config.listener.bind_address),
        });
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::Invalid {
            field: "listener.max_body_size",
            reason: "must be greater than zero".to_string(),
        });
    }

    let timeouts = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::Invalid {
                field,
                reason: "must be greater than zero".to_string(),
            });
        }
    }

    if let Err(e) = Url::parse(&config.cdn.api_base) {
        errors.push(ValidationError::Invalid {
            field: "cdn.api_base",
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
