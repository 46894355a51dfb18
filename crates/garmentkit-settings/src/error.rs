//! Settings errors.
//!
//! [`ConfigError`] covers values that are well formed but unusable (an empty
//! catalog, a margin above 1.0). [`SettingsError`] wraps it together with
//! the file and format failures of loading and saving.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load, save or validate settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read config '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Cannot write config '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The platform has no per-user config directory.
    #[error("No config directory on this platform")]
    NoConfigDirectory,

    /// Only `.toml` and `.json` files are understood.
    #[error("Unsupported config format for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Cannot encode config as TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A configuration value the designer cannot work with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Garment catalog is empty")]
    EmptyCatalog,

    #[error("Unknown garment type: {0}")]
    UnknownGarment(String),

    /// `key` is a dotted path such as `garments.men.margin.front`.
    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub type ConfigResult<T> = Result<T, ConfigError>;
