//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (classify)
//!     → Preflight | Purge | Proxy
//! ```
//!
//! Classification is fixed and ordered: the first rule that matches wins.

pub mod router;

pub use router::{classify, Route};
