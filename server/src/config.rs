//! Server configuration read from the environment (and `.env`, if present).
//!
//! | Variable          | Default      |
//! |-------------------|--------------|
//! | `TODO_HOST`       | `127.0.0.1`  |
//! | `PORT`            | `8000`       |
//! | `TODO_DB_PATH`    | `todos.db`   |
//! | `TODO_STATIC_DIR` | unset        |
//! | `TODO_SEED`       | `false`      |

use std::{env, path::PathBuf, str::FromStr};

use thiserror::Error;

/// Database path that selects a private in-memory store.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub static_dir: Option<PathBuf>,
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            db_path: "todos.db".to_string(),
            static_dir: None,
            seed: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys fall back to
    /// [`Config::default`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("TODO_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", defaults.port)?,
            db_path: lookup("TODO_DB_PATH").unwrap_or(defaults.db_path),
            static_dir: lookup("TODO_STATIC_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            seed: parse_flag(&lookup, "TODO_SEED")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
