//! Configuration system for Homebase tool services.
//!
//! Provides TOML-based configuration with:
//! - Per-service launch entries (`[services.finance]`, `[services.catalog]`, ...)
//! - Built-in defaults for the finance, catalog and location services
//! - Config file layering (XDG user config + project-local overrides)
//! - `${VAR}` / `${VAR:-default}` expansion so credentials stay in the environment

pub mod discovery;
pub mod error;
pub mod expand;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_from,
    load_config_with_options, log_dir, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use expand::{expand_env, expand_with};
pub use types::*;
