//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Reconstruct the client-facing absolute URL from forwarding headers
//! - Carry method, URL, headers, and body as one immutable value
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is read only after the HTTPS-upgrade decision

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::error::{ProxyError, ProxyResult};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Host used when the request names none.
const FALLBACK_HOST: &str = "localhost";

/// A client request as the proxy core sees it. Immutable once built.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IncomingRequest {
    /// Percent-encoded path, as received.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Raw query string, as received.
    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// The `Origin` request header.
    pub fn origin(&self) -> Option<&HeaderValue> {
        self.headers.get(header::ORIGIN)
    }
}

/// Build an [`IncomingRequest`] by draining the body, up to `limit` bytes.
pub async fn read_incoming(
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Body,
    limit: usize,
) -> ProxyResult<IncomingRequest> {
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| ProxyError::ClientRequest {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: format!("Request body could not be read: {e}"),
        })?;

    Ok(IncomingRequest {
        method,
        url,
        headers,
        body,
    })
}

/// First comma-separated element of a header, trimmed.
fn first_value<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Reconstruct the absolute URL the client addressed.
///
/// Scheme comes from `x-forwarded-proto` (else `http`); host from
/// `x-forwarded-host`, then `Host`, then the URI authority.
pub fn reconstruct_url(uri: &Uri, headers: &HeaderMap) -> ProxyResult<Url> {
    let scheme = match first_value(headers, &X_FORWARDED_PROTO).map(str::to_ascii_lowercase) {
        Some(proto) if proto == "https" => "https",
        _ => "http",
    };

    let host = first_value(headers, &X_FORWARDED_HOST)
        .or_else(|| first_value(headers, &header::HOST))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or(FALLBACK_HOST);

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Url::parse(&format!("{scheme}://{host}{path_and_query}"))
        .map_err(|e| ProxyError::bad_request(format!("Invalid request target: {e}")))
}

/// The URL with its scheme upgraded to `https`.
pub fn upgraded_url(url: &Url) -> Url {
    let mut upgraded = url.clone();
    // http → https is always a permitted scheme change
    let _ = upgraded.set_scheme("https");
    upgraded
}

/// Request id generator producing UUID v4 values.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request id header value, or `unknown`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
