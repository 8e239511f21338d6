//! Header sanitization shared by the request and response paths.
//!
//! # Responsibilities
//! - Define the purge-blocking header set
//! - Strip hop-by-hop headers from relayed responses
//!
//! # Design Decisions
//! - The CDN's single-file purge keys on a canonical header set; any of the
//!   purge-blocking headers reaching storage, or reaching the client from
//!   storage, yields cache entries a purge-by-URL cannot reach
//! - Both directions filter against the same constant

use axum::http::{HeaderMap, HeaderName};

/// Headers that must never cross the proxy in either direction.
pub const PURGE_BLOCKING_HEADERS: [&str; 7] = [
    "x-forwarded-host",
    "x-host",
    "x-forwarded-scheme",
    "x-original-url",
    "x-rewrite-url",
    "forwarded",
    "origin",
];

/// Connection-scoped headers that are not relayed.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
];

/// Case-insensitive membership in the purge-blocking set.
pub fn is_purge_blocking(name: &HeaderName) -> bool {
    // HeaderName is always stored lower-cased
    PURGE_BLOCKING_HEADERS.contains(&name.as_str())
}

/// Remove every purge-blocking header (all values) from `headers`.
pub fn strip_purge_blocking(headers: &mut HeaderMap) {
    for name in PURGE_BLOCKING_HEADERS {
        headers.remove(name);
    }
}

/// Remove hop-by-hop headers from `headers`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}
