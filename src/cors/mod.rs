//! Cross-origin access decisions.
//!
//! One pure function, [`decide`], answers "does this request get CORS
//! headers, and which origin do they name". The preflight handler and the
//! final-response policy both call it, so the two paths cannot drift.
//!
//! # Decision order (first match wins)
//! ```text
//! 1. font asset (woff, woff2, ttf, otf, eot)    → Access-Control-Allow-Origin: *
//! 2. Origin matches an allowed domain            → echo the Origin value
//! 3. Origin absent or "null", GET/HEAD/OPTIONS   → *
//! 4. anything else                               → no CORS headers
//! ```

pub mod matcher;

use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::policy::mime::extension;

pub use matcher::{AllowedOriginSet, DomainPattern};

pub const ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Range";
pub const MAX_AGE_SECS: u32 = 86_400;

const FONT_EXTENSIONS: [&str; 5] = ["woff", "woff2", "ttf", "otf", "eot"];

/// Which origin a granted response is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowOrigin {
    /// `*`
    Any,
    /// The request's own `Origin` value, echoed back.
    Exact(HeaderValue),
}

/// A positive CORS decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsGrant {
    pub allow_origin: AllowOrigin,
}

impl CorsGrant {
    fn any() -> Self {
        Self {
            allow_origin: AllowOrigin::Any,
        }
    }

    /// Write the grant into a response header map, replacing any CORS
    /// headers already present.
    pub fn apply(&self, headers: &mut HeaderMap) {
        let origin = match &self.allow_origin {
            AllowOrigin::Any => HeaderValue::from_static("*"),
            AllowOrigin::Exact(value) => value.clone(),
        };
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECS));
    }
}

/// Whether the path names a web font.
pub fn is_font_path(path: &str) -> bool {
    extension(path)
        .map(|ext| FONT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Decide whether and how to grant cross-origin access.
pub fn decide(
    method: &Method,
    path: &str,
    origin: Option<&HeaderValue>,
    allowed: &AllowedOriginSet,
) -> Option<CorsGrant> {
    if is_font_path(path) {
        return Some(CorsGrant::any());
    }

    if let Some(value) = origin {
        if let Ok(origin_str) = value.to_str() {
            if allowed.allows(origin_str) {
                return Some(CorsGrant {
                    allow_origin: AllowOrigin::Exact(value.clone()),
                });
            }
        }
    }

    let opaque_origin = match origin {
        None => true,
        Some(value) => value.as_bytes() == b"null",
    };
    let safe_method = *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS;

    if opaque_origin && safe_method {
        return Some(CorsGrant::any());
    }

    None
}
