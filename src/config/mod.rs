//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! compiled-in defaults  or  config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (command-line flags override)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, resolve, ConfigError};
pub use schema::{
    ConversionConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServiceConfig,
    StaticFilesConfig, TimeoutConfig,
};
