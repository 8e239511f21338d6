//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (absolute URL, request id, body)
//!     → [routing: preflight | purge | proxy]
//!     → response.rs (policy applied, body streamed)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{IncomingRequest, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
