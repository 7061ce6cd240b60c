//! Runtime configuration from the process environment (and `.env` files).
//!
//! | variable                 | default                                  |
//! |--------------------------|------------------------------------------|
//! | `GEOLOC_API_KEY`         | required                                 |
//! | `GEOLOC_BASE_URL`        | `http://api.openweathermap.org/geo/1.0/` |
//! | `GEOLOC_CONNECT_TIMEOUT` | 5 (seconds)                              |
//! | `GEOLOC_READ_TIMEOUT`    | 15 (seconds)                             |
//! | `GEOLOC_MAX_RETRIES`     | 3                                        |

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/geo/1.0/";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const API_KEY_VAR: &str = "GEOLOC_API_KEY";
const BASE_URL_VAR: &str = "GEOLOC_BASE_URL";
const CONNECT_TIMEOUT_VAR: &str = "GEOLOC_CONNECT_TIMEOUT";
const READ_TIMEOUT_VAR: &str = "GEOLOC_READ_TIMEOUT";
const MAX_RETRIES_VAR: &str = "GEOLOC_MAX_RETRIES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEOLOC_API_KEY is not set. Export it or add GEOLOC_API_KEY='<key>' to a .env file")]
    MissingApiKey,

    #[error("{var} must be a whole number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be at least 1 second")]
    ZeroTimeout { var: &'static str },

    #[error("could not read env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

/// Settings for the geocoding client.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    /// Always ends with `/`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Extra attempts after a read timeout.
    pub max_retries: u32,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read an env file. Variables already set in the process environment win,
    /// the same precedence `dotenvy::dotenv` gives the default `.env`.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let env_file_error = |source| ConfigError::EnvFile {
            path: path.display().to_string(),
            source,
        };

        let mut file_vars = HashMap::new();
        for item in dotenvy::from_path_iter(path).map_err(env_file_error)? {
            let (key, value) = item.map_err(env_file_error)?;
            file_vars.insert(key, value);
        }

        Self::from_layers(|key| std::env::var(key).ok(), &file_vars)
    }

    fn from_layers<F>(env: F, file_vars: &HashMap<String, String>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| env(key).or_else(|| file_vars.get(key).cloned()))
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config.base_url = normalize_base_url(url.trim());
        }
        if let Some(timeout) = parse_timeout(&lookup, CONNECT_TIMEOUT_VAR)? {
            config.connect_timeout = timeout;
        }
        if let Some(timeout) = parse_timeout(&lookup, READ_TIMEOUT_VAR)? {
            config.read_timeout = timeout;
        }
        if let Some(retries) = parse_number(&lookup, MAX_RETRIES_VAR)? {
            config.max_retries = retries;
        }

        Ok(config)
    }
}

fn parse_number<F>(lookup: &F, var: &'static str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}

fn parse_timeout<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_number(lookup, var)? {
        Some(0) => Err(ConfigError::ZeroTimeout { var }),
        secs => Ok(secs.map(|secs| Duration::from_secs(u64::from(secs)))),
    }
}

fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
