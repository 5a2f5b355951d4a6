//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AdapterConfig (validated, immutable)
//!     → routes handed to the registrar, options to the adapter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes are registered exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdapterConfig, ListenerConfig, ObservabilityConfig, OptionsConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
