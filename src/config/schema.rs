//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Object-storage origin the proxy fronts.
    pub storage: StorageConfig,

    /// CDN management API used for purges.
    pub cdn: CdnConfig,

    /// Cross-origin access policy.
    pub cors: CorsConfig,

    /// Security settings.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum inbound request body in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// Object-storage origin settings. Every field except `virtual_hosted`
/// is required; validation rejects partial credentials.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket name.
    pub bucket: String,

    /// Endpoint base URL (e.g., "https://<account>.r2.cloudflarestorage.com").
    pub endpoint: String,

    /// Signing region.
    pub region: String,

    /// Access key id.
    pub access_key_id: String,

    /// Secret access key.
    pub secret_access_key: String,

    /// Address the bucket as a subdomain of the endpoint instead of a path prefix.
    pub virtual_hosted: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: String::new(),
            region: "auto".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            virtual_hosted: false,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .field("virtual_hosted", &self.virtual_hosted)
            .finish()
    }
}

/// CDN management API configuration.
///
/// Missing zone id or token does not prevent startup; purge requests fail
/// with 500 until both are set.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CdnConfig {
    /// Zone identifier.
    pub zone_id: Option<String>,

    /// API bearer token.
    pub api_token: Option<String>,

    /// API base URL.
    pub api_base: String,

    /// Shared secret purge callers must present. `None` accepts any caller.
    pub purge_secret: Option<String>,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            zone_id: None,
            api_token: None,
            api_base: "https://api.cloudflare.com/client/v4".to_string(),
            purge_secret: None,
        }
    }
}

impl std::fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnConfig")
            .field("zone_id", &self.zone_id)
            .field("api_token", &self.api_token.as_deref().map(redacted))
            .field("api_base", &self.api_base)
            .field("purge_secret", &self.purge_secret.as_deref().map(redacted))
            .finish()
    }
}

/// Cross-origin access policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Comma-separated domain list; each entry also matches its subdomains.
    pub allowed_origins: String,
}

/// Security settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Serve plain-HTTP requests instead of redirecting them to HTTPS.
    pub disable_https_redirect: bool,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request deadline for the inbound side, in seconds.
    pub request_secs: u64,

    /// Deadline for a single outbound call (storage or CDN API), in seconds.
    pub upstream_secs: u64,

    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
            connect_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}
