//! Cache invalidation.
//!
//! # Data Flow
//! ```text
//! POST /.purge
//!     → method, content type, JSON body
//!     → CDN configuration present
//!     → token (when a purge secret is configured)
//!     → url / headers (request.rs)
//!     → POST <api_base>/zones/<zone>/purge_cache
//!     → API status and body relayed to the caller
//! ```
//!
//! Each step fails closed; later steps never run after a rejection.

pub mod request;

use std::time::Duration;

use axum::http::{header, HeaderMap, Method, StatusCode};
use serde_json::{json, Value};

use crate::config::{CdnConfig, TimeoutConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::observability::metrics;

pub use request::{PurgeFile, PurgePayload, PurgeRequest};

/// Path of the purge endpoint on the proxy.
pub const PURGE_PATH: &str = "/.purge";

/// Validates purge requests and forwards them to the CDN API.
pub struct PurgeOrchestrator {
    http: reqwest::Client,
    config: CdnConfig,
    timeout_secs: u64,
}

impl PurgeOrchestrator {
    pub fn new(config: CdnConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()?;

        Ok(Self {
            http,
            config,
            timeout_secs: timeouts.upstream_secs,
        })
    }

    /// Zone purge endpoint.
    pub fn endpoint(&self, zone_id: &str) -> String {
        format!(
            "{}/zones/{}/purge_cache",
            self.config.api_base.trim_end_matches('/'),
            zone_id
        )
    }

    /// Run one purge request through the full state machine.
    ///
    /// Returns the status and JSON body for the caller on success; every
    /// rejection or API failure is a [`ProxyError`].
    pub async fn handle(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &[u8],
    ) -> ProxyResult<(StatusCode, Value)> {
        let result = self.process(method, headers, body).await;

        let outcome = match &result {
            Ok(_) => "purged",
            Err(ProxyError::Upstream { .. }) | Err(ProxyError::Timeout(_)) => "failed",
            Err(_) => "rejected",
        };
        metrics::record_purge(outcome);

        result
    }

    async fn process(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &[u8],
    ) -> ProxyResult<(StatusCode, Value)> {
        if method != Method::POST {
            return Err(ProxyError::method_not_allowed("Method not allowed. Use POST."));
        }

        if !declares_json(headers) {
            return Err(ProxyError::bad_request(
                "Content-Type must be application/json",
            ));
        }

        let fields = request::parse_body(body)?;

        let (zone_id, api_token) = match (
            non_empty(self.config.zone_id.as_deref()),
            non_empty(self.config.api_token.as_deref()),
        ) {
            (Some(zone_id), Some(api_token)) => (zone_id, api_token),
            _ => {
                return Err(ProxyError::Configuration(
                    "cdn.zone_id and cdn.api_token are required for purge".to_string(),
                ))
            }
        };

        let secret = non_empty(self.config.purge_secret.as_deref());
        if !request::token_authorized(secret, request::token_field(&fields)) {
            tracing::warn!("Purge rejected: token mismatch");
            return Err(ProxyError::Authorization);
        }

        let purge = PurgeRequest::from_body(&fields)?;
        self.send(zone_id, api_token, &purge).await
    }

    async fn send(
        &self,
        zone_id: &str,
        api_token: &str,
        purge: &PurgeRequest,
    ) -> ProxyResult<(StatusCode, Value)> {
        let payload = purge.payload();
        let endpoint = self.endpoint(zone_id);

        tracing::info!(url = %purge.raw_url, endpoint = %endpoint, "Sending purge request");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProxyError::Timeout(self.timeout_secs)
                } else {
                    ProxyError::Upstream {
                        status: StatusCode::BAD_GATEWAY,
                        message: "Purge API unreachable".to_string(),
                        details: Some(Value::String(e.to_string())),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(ProxyError::from)?;
        let result = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        if status.is_success() {
            tracing::info!(url = %purge.raw_url, status = status.as_u16(), "Cache purged");
            Ok((
                status,
                json!({
                    "success": true,
                    "message": "Cache purged",
                    "url": purge.raw_url,
                    "result": result,
                }),
            ))
        } else {
            tracing::warn!(url = %purge.raw_url, status = status.as_u16(), "Purge API rejected request");
            Err(ProxyError::Upstream {
                status,
                message: "Purge request failed".to_string(),
                details: Some(result),
            })
        }
    }
}

/// Whether the request declares a JSON body.
fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
