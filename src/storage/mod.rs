//! Object-storage origin subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest
//!     → upstream.rs (target URL, sanitized headers, Host pinning)
//!     → signing.rs (content hash, canonical request, authorization)
//!     → upstream.rs (send with timeout)
//!     → reqwest::Response (streamed back by http/response.rs)
//! ```

pub mod signing;
pub mod upstream;

pub use signing::SigningResult;
pub use upstream::{build_upstream_request, StorageClient, UpstreamRequest};
