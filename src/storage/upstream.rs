//! Outbound request construction and execution against object storage.
//!
//! # Responsibilities
//! - Map the client path and query onto the bucket URL, verbatim
//! - Copy inbound headers minus the purge-blocking and hop-by-hop sets
//! - Pin `Host` to the storage endpoint and merge the signing headers last
//! - Execute with a bounded timeout; no retries

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use url::Url;

use crate::config::{OriginConfig, TimeoutConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::http::request::IncomingRequest;
use crate::security::headers::{is_purge_blocking, strip_hop_by_hop};
use crate::storage::signing::{self, host_header};

/// A fully assembled, signed request to the storage origin.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Storage URL for a client path and raw query.
///
/// Path-style: `<endpoint>/<bucket><path>`; virtual-hosted:
/// `<scheme>://<bucket>.<host><path>`. The path is expected to be
/// percent-encoded already and is not encoded again.
pub fn target_url(origin: &OriginConfig, path: &str, query: Option<&str>) -> ProxyResult<Url> {
    let mut url = origin.endpoint.clone();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    if origin.virtual_hosted {
        let host = url.host_str().unwrap_or_default().to_string();
        url.set_host(Some(&format!("{}.{}", origin.bucket, host)))
            .map_err(|e| ProxyError::Configuration(format!("invalid bucket host: {e}")))?;
        url.set_path(&path);
    } else {
        url.set_path(&format!("/{}{}", origin.bucket, path));
    }

    url.set_query(query.filter(|q| !q.is_empty()));
    Ok(url)
}

/// Assemble and sign the outbound request for `incoming`.
pub fn build_upstream_request(
    incoming: &IncomingRequest,
    origin: &OriginConfig,
) -> ProxyResult<UpstreamRequest> {
    let url = target_url(origin, incoming.path(), incoming.query())?;

    let mut headers = HeaderMap::with_capacity(incoming.headers.len() + 3);
    for (name, value) in incoming.headers.iter() {
        if !is_purge_blocking(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    strip_hop_by_hop(&mut headers);

    let host = HeaderValue::from_str(&host_header(&url))
        .map_err(|e| ProxyError::Configuration(format!("invalid storage host: {e}")))?;
    headers.insert(header::HOST, host);

    let forwards_body = incoming.method != Method::GET && incoming.method != Method::HEAD;
    let body = forwards_body.then(|| incoming.body.clone());
    if !forwards_body {
        // Framing must describe the body actually sent
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::CONTENT_TYPE);
    }

    let signed = signing::sign(
        &incoming.method,
        &url,
        body.as_deref().unwrap_or_default(),
        origin,
    );
    signed.apply(&mut headers)?;

    Ok(UpstreamRequest {
        method: incoming.method.clone(),
        url,
        headers,
        body,
    })
}

/// HTTP client for the storage origin.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    origin: Arc<OriginConfig>,
    timeout_secs: u64,
}

impl StorageClient {
    /// Create a client with pooled connections and bounded timeouts.
    pub fn new(origin: Arc<OriginConfig>, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            origin,
            timeout_secs: timeouts.upstream_secs,
        })
    }

    pub fn origin(&self) -> &OriginConfig {
        &self.origin
    }

    /// Build, sign, and send the request. Any upstream status is a success
    /// here; only transport failures are errors.
    pub async fn fetch(&self, incoming: &IncomingRequest) -> ProxyResult<reqwest::Response> {
        let upstream = build_upstream_request(incoming, &self.origin)?;

        tracing::debug!(
            method = %upstream.method,
            url = %upstream.url,
            "Forwarding to storage"
        );

        let mut request = self
            .http
            .request(upstream.method, upstream.url)
            .headers(upstream.headers);
        if let Some(body) = upstream.body {
            request = request.body(body);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProxyError::Timeout(self.timeout_secs)
            } else {
                ProxyError::from(e)
            }
        })
    }
}
