//! Configuration loading for slotedit.
//!
//! The engine only ever sees the [`ConfigSource`] capability: a `get(key)` lookup
//! that returns a raw TOML value. Where that value comes from (a file, a host
//! page, a test map) is the source's business. [`EditorSettings::resolve`] turns
//! raw values into validated, defaulted settings at the boundary.
//!
//! Keys are dotted paths into nested tables, e.g. `editor.max_active_slots`.

mod settings;

pub use settings::{EditorSettings, slots_from_source};

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value for `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// The `Config.get(key)` capability.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<toml::Value>;
}

/// In-memory source keyed by full dotted key.
///
/// Useful for hosts that resolve configuration elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, toml::Value>,
}

impl MapConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<toml::Value>) {
        self.values.insert(key.to_string(), value.into());
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<toml::Value> {
        self.values.get(key).cloned()
    }
}

/// A parsed TOML document.
///
/// String values have `${VAR}` references expanded from the environment at
/// lookup time.
#[derive(Debug, Clone, Default)]
pub struct TomlConfig {
    root: toml::Table,
    path: Option<PathBuf>,
}

impl TomlConfig {
    /// Load the default config file, if one exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match content.parse::<toml::Table>() {
            Ok(root) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Ok(Self {
                    root,
                    path: Some(path.to_path_buf()),
                })
            }
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        Ok(Self {
            root: content.parse::<toml::Table>()?,
            path: None,
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ConfigSource for TomlConfig {
    fn get(&self, key: &str) -> Option<toml::Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.root.get(first)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(expand_value(current))
    }
}

fn expand_value(value: &toml::Value) -> toml::Value {
    match value {
        toml::Value::String(s) => toml::Value::String(expand_env_vars(s)),
        toml::Value::Array(items) => toml::Value::Array(items.iter().map(expand_value).collect()),
        toml::Value::Table(table) => toml::Value::Table(
            table
                .iter()
                .map(|(k, v)| (k.clone(), expand_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Replace `${VAR}` references with environment values (missing vars become empty).
///
/// An unclosed `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".slotedit").join("config.toml"))
}
