//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overlay)
//!     → validation.rs (semantic checks, OriginConfig construction)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Partial storage credentials are fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CdnConfig, CorsConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, SecurityConfig,
    StorageConfig, TimeoutConfig,
};
pub use validation::{OriginConfig, ValidationError};
