//! Finding config files and stacking them over the built-in services.
//!
//! Layers, lowest precedence first: built-in services, the user file
//! (`<config dir>/config.toml`), then `./homebase.toml`. An explicit
//! `--config <path>` replaces both files.

use std::path::{Path, PathBuf};

use crate::{ConfigError, HomebaseConfig, Result};

/// Looked up in the working directory.
const PROJECT_CONFIG_FILE: &str = "homebase.toml";

/// Looked up in the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

const APP_NAME: &str = "homebase";

const CONFIG_DIR_ENV: &str = "HOMEBASE_CONFIG_DIR";

/// A file that discovery looked at.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// False when missing or unparseable.
    pub loaded: bool,
}

/// The merged config plus how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: HomebaseConfig,
    /// Lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Skipped layers and literal credentials, for the caller to log.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Files that contributed to the config.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover the user and project files and merge them over the built-ins.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// [`load_config`] with the user config directory pinned.
///
/// `config_dir` wins over `HOMEBASE_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = HomebaseConfig::builtin();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // user layer
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    // project layer
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    check_plaintext_secrets(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load built-in defaults overlaid with exactly one file.
///
/// Unlike discovery, a missing or malformed file is an error.
pub fn load_config_from(path: &Path) -> Result<LoadedConfig> {
    let mut config = HomebaseConfig::builtin();
    config.merge(load_config_file(path)?);

    let mut warnings = Vec::new();
    check_plaintext_secrets(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings,
    })
}

/// Parse one file on its own, without the built-ins.
pub fn load_config_file(path: &Path) -> Result<HomebaseConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    HomebaseConfig::from_toml(&contents)
}

/// Write `config` as TOML, creating parent directories.
pub fn save_config(config: &HomebaseConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// `HOMEBASE_CONFIG_DIR` when set and non-empty, else the platform
/// config directory joined with `homebase`.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Directory for log files: the configured one, else `<config dir>/logs`.
pub fn log_dir(config: &HomebaseConfig) -> Option<PathBuf> {
    config
        .logging
        .as_ref()
        .and_then(|l| l.directory.clone())
        .or_else(|| xdg_config_dir().map(|d| d.join("logs")))
}

/// Merge `path` into `config` if it exists. Parse failures become warnings.
fn load_layer(config: &mut HomebaseConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            tracing::debug!(path = %path.display(), "loaded config layer");
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

fn looks_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    ["token", "key", "secret", "password"]
        .iter()
        .any(|s| key.contains(s))
}

/// Warn about credentials written literally instead of as `${VAR}`.
fn check_plaintext_secrets(config: &HomebaseConfig, warnings: &mut Vec<String>) {
    for (name, entry) in &config.services {
        let in_args = entry.args.iter().flatten().any(|arg| {
            arg.split_once('=')
                .is_some_and(|(k, v)| looks_secret(k) && !v.is_empty() && !v.contains("${"))
        });
        let in_env = entry
            .env
            .iter()
            .any(|(k, v)| looks_secret(k) && !v.is_empty() && !v.contains("${"));

        if in_args || in_env {
            warnings.push(format!(
                "[services.{}] contains a plaintext credential. \
                 Consider a ${{VAR}} reference and an environment variable instead.",
                name
            ));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
