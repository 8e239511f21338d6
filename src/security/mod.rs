//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (drop purge-blocking and hop-by-hop headers)
//!     → storage
//! Storage response:
//!     → headers.rs (drop hop-by-hop headers)
//!     → policy (drop purge-blocking headers)
//!     → client
//! ```
//!
//! Both directions filter against the same header set.

pub mod headers;
