//! Configuration library for cinelog.
//!
//! Settings are composed from built-in defaults, an optional TOML file and
//! `CINELOG_*` environment variables (highest precedence), then checked by
//! the guard rails in [`validation`] before the server starts.

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AddonConfig, CinemetaConfig, Config, ConfigMetadata, CorsConfig, LogFormat,
    LoggingConfig, ServerConfig,
};
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, CorsAllowLists, parse_cors_allow_lists,
};
