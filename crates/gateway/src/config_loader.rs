//! Layered configuration loading: TOML file, overridden by the
//! environment variables named in the external-interfaces section.
//! Grounded on the teacher's `run_server()` config-loading preamble and
//! `orc_domain::config`'s nested-struct convention.

use std::path::Path;

use orc_domain::Config;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "./orchestrator.toml";
pub const CONFIG_PATH_ENV_VAR: &str = "ORC_CONFIG";

/// Resolves the config file path: explicit CLI flag, else `ORC_CONFIG`,
/// else the compiled-in default.
pub fn resolve_config_path(explicit: Option<&Path>) -> std::path::PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(from_env) = std::env::var(CONFIG_PATH_ENV_VAR) {
        return std::path::PathBuf::from(from_env);
    }
    std::path::PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Loads the config: a missing file falls back to compiled defaults (this
/// is a development convenience, not a fail-fast condition — only a
/// present-but-unparsable file is an error), then overlays environment
/// variables.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config> {
    let path = resolve_config_path(explicit_path);
    let mut config = match std::fs::read_to_string(&path) {
        Ok(contents) => toml::from_str(&contents)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file found, using defaults");
            Config::default()
        }
        Err(err) => return Err(err.into()),
    };
    config.apply_env_overrides();
    Ok(config)
}
