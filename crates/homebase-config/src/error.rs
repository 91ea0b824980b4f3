//! Errors raised while loading, expanding or saving configuration.

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A config file exists but could not be read (or was named explicitly and is missing).
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An enabled service entry lacks a setting it cannot run without.
    #[error("{context} has no '{field}'")]
    MissingField { field: String, context: String },

    /// A `${VAR}` reference with no value and no default.
    #[error("environment variable '{var}' is not set (referenced by {context})")]
    UnresolvedVar { var: String, context: String },

    #[error("bad variable reference in {context}: {message}")]
    InvalidReference { context: String, message: String },
}
