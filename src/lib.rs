//! Edge proxy between a CDN and an S3-compatible object store.
//!
//! Signs and forwards requests to the bucket, rewrites responses for CDN
//! caching and cross-origin access, and relays cache purge requests to the
//! CDN management API.

pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod purge;
pub mod routing;
pub mod security;
pub mod storage;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
