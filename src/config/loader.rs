// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Config file looked up in the working root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Sitedag.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the effective configuration for a run.
///
/// - `explicit = Some(path)`: the file must exist and be valid.
/// - `explicit = None`: `<root>/Sitedag.toml` is used when present, otherwise
///   the built-in defaults.
pub fn load_or_default(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let candidate: PathBuf = root.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        debug!(path = ?candidate, "loading config file");
        load_and_validate(&candidate)
    } else {
        debug!(path = ?candidate, "no config file; using defaults");
        ConfigFile::try_from(RawConfigFile::default())
    }
}
