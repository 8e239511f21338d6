//! Client-facing response policy.
//!
//! Derives, from the request path, the request's `Origin`, and the upstream
//! status, everything the proxy changes on a storage response before it
//! reaches the client: content type, CORS, caching, and stripped headers.

pub mod mime;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};

use crate::cors::{self, AllowedOriginSet, CorsGrant};
use crate::security::headers::strip_purge_blocking;

/// Cache policy for successful (and all non-negative) responses.
pub const CACHE_CONTROL_DEFAULT: &str = "public, max-age=60, s-maxage=31536000, must-revalidate";

/// Cache policy for 403/404: long at the edge, short for browsers.
pub const CACHE_CONTROL_NEGATIVE: &str = "public, max-age=300, s-maxage=31536000, immutable";

/// Headers that defeat the cache-control override.
const CACHE_DEFEATING_HEADERS: [&str; 3] = ["vary", "pragma", "expires"];

/// Prefix shared by every CORS response header.
const CORS_HEADER_PREFIX: &str = "access-control-";

/// Cache-Control value for an upstream status.
pub fn cache_control_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => CACHE_CONTROL_NEGATIVE,
        _ => CACHE_CONTROL_DEFAULT,
    }
}

/// The derived policy for one response. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePolicy {
    pub content_type: Option<&'static str>,
    pub cors: Option<CorsGrant>,
    pub cache_control: &'static str,
}

impl ResponsePolicy {
    /// Derive the policy for a response to `method path` with the given
    /// request `Origin` and upstream status.
    pub fn derive(
        method: &Method,
        path: &str,
        origin: Option<&HeaderValue>,
        status: StatusCode,
        allowed: &AllowedOriginSet,
    ) -> Self {
        Self {
            content_type: mime::content_type_for(path),
            cors: cors::decide(method, path, origin, allowed),
            cache_control: cache_control_for(status),
        }
    }

    /// Rewrite an upstream header map into the client-facing one.
    ///
    /// Removal runs first so nothing stripped can be reintroduced, and the
    /// CORS headers present afterwards are exactly those of the decision.
    pub fn apply(&self, headers: &mut HeaderMap) {
        strip_purge_blocking(headers);
        for name in CACHE_DEFEATING_HEADERS {
            headers.remove(name);
        }
        strip_cors(headers);

        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

        if let Some(grant) = &self.cors {
            grant.apply(headers);
        }

        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(self.cache_control),
        );
    }
}

/// Remove every `Access-Control-*` header the origin sent.
fn strip_cors(headers: &mut HeaderMap) {
    let names: Vec<_> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(CORS_HEADER_PREFIX))
        .cloned()
        .collect();
    for name in names {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::headers::PURGE_BLOCKING_HEADERS;

    fn allowed() -> AllowedOriginSet {
        AllowedOriginSet::parse("allowed.example")
    }

    #[test]
    fn test_cache_control_by_status() {
        assert_eq!(cache_control_for(StatusCode::OK), CACHE_CONTROL_DEFAULT);
        assert_eq!(cache_control_for(StatusCode::PARTIAL_CONTENT), CACHE_CONTROL_DEFAULT);
        assert_eq!(cache_control_for(StatusCode::INTERNAL_SERVER_ERROR), CACHE_CONTROL_DEFAULT);
        assert_eq!(cache_control_for(StatusCode::NOT_FOUND), CACHE_CONTROL_NEGATIVE);
        assert_eq!(cache_control_for(StatusCode::FORBIDDEN), CACHE_CONTROL_NEGATIVE);
    }

    #[test]
    fn test_video_with_allowed_origin() {
        let origin = HeaderValue::from_static("https://allowed.example");
        let policy = ResponsePolicy::derive(
            &Method::GET,
            "/video.mp4",
            Some(&origin),
            StatusCode::OK,
            &allowed(),
        );

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        policy.apply(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://allowed.example");
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert!(headers[header::CACHE_CONTROL]
            .to_str()
            .unwrap()
            .contains("s-maxage=31536000"));
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    }

    #[test]
    fn test_unknown_extension_keeps_origin_content_type() {
        let policy = ResponsePolicy::derive(&Method::GET, "/blob", None, StatusCode::OK, &allowed());
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-custom"));
        policy.apply(&mut headers);
        assert_eq!(headers[header::CONTENT_TYPE], "application/x-custom");
    }

    #[test]
    fn test_blocked_and_cache_defeating_headers_are_removed() {
        let policy = ResponsePolicy::derive(&Method::GET, "/a.css", None, StatusCode::OK, &allowed());
        let mut headers = HeaderMap::new();
        for name in PURGE_BLOCKING_HEADERS {
            headers.insert(name, HeaderValue::from_static("leak"));
        }
        headers.insert("vary", HeaderValue::from_static("Origin"));
        headers.insert("pragma", HeaderValue::from_static("no-cache"));
        headers.insert("expires", HeaderValue::from_static("0"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"v1\""));

        policy.apply(&mut headers);

        for name in PURGE_BLOCKING_HEADERS {
            assert!(headers.get(name).is_none(), "{} leaked", name);
        }
        assert!(headers.get("vary").is_none());
        assert!(headers.get("pragma").is_none());
        assert!(headers.get("expires").is_none());
        assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL_DEFAULT);
        assert_eq!(headers[header::ETAG], "\"v1\"");
    }

    #[test]
    fn test_denied_origin_drops_upstream_cors_headers() {
        let origin = HeaderValue::from_static("https://other.example");
        let policy =
            ResponsePolicy::derive(&Method::GET, "/a.png", Some(&origin), StatusCode::OK, &allowed());
        assert!(policy.cors.is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("ETag"));
        headers.insert(header::ETAG, HeaderValue::from_static("\"abc\""));
        policy.apply(&mut headers);

        assert!(headers.keys().all(|name| !name.as_str().starts_with("access-control-")));
        assert_eq!(headers[header::ETAG], "\"abc\"");
    }

    #[test]
    fn test_granted_origin_replaces_upstream_cors_headers() {
        let origin = HeaderValue::from_static("https://allowed.example");
        let policy =
            ResponsePolicy::derive(&Method::GET, "/v.mp4", Some(&origin), StatusCode::OK, &allowed());
        assert!(policy.cors.is_some());

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        policy.apply(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://allowed.example");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[test]
    fn test_negative_result_policy() {
        let policy =
            ResponsePolicy::derive(&Method::GET, "/missing.js", None, StatusCode::NOT_FOUND, &allowed());
        let mut headers = HeaderMap::new();
        policy.apply(&mut headers);
        assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL_NEGATIVE);
    }
}
