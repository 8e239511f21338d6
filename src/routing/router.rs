//! Request classification.

use axum::http::Method;

use crate::purge::PURGE_PATH;

/// Where a request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `OPTIONS` on any path.
    Preflight,
    /// The purge endpoint, any other method.
    Purge,
    /// Everything else goes to storage.
    Proxy,
}

impl Route {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Preflight => "preflight",
            Route::Purge => "purge",
            Route::Proxy => "proxy",
        }
    }
}

/// Classify a request by method and path.
pub fn classify(method: &Method, path: &str) -> Route {
    if method == Method::OPTIONS {
        Route::Preflight
    } else if path == PURGE_PATH {
        Route::Purge
    } else {
        Route::Proxy
    }
}
