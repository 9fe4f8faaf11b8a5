//! Generic TOML configuration loading, parameterized over any
//! `Serialize + DeserializeOwned` config struct so the Agent, Zone and
//! Runner can all share it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read or parse config file: {0}")]
    Load(String),
    #[error("failed to serialize config: {0}")]
    Dump(String),
}

/// Loads a TOML config file into `T`. Callers typically fall back to
/// `T::default()` when no `--config` path was given on the command line.
pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    serdeconv::from_toml_file(path).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Serializes `T` to a TOML string, used by the `*-config` helper binaries
/// to print a starter config file.
pub fn dump<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    serdeconv::to_toml_string(value).map_err(|e| ConfigError::Dump(e.to_string()))
}
