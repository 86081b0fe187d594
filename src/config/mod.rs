//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NetConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_overrides, load_config, ConfigError, Endpoint};
pub use schema::{
    AcceptorConfig, ConnectorConfig, FileServerConfig, LoggingConfig, NetConfig, StreamConfig,
};
