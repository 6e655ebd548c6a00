//! Configuration module for the ReleaseRite client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;

use reqwest::Url;

use crate::errors::AppError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_SESSION_PATH: &str = "./data/session.sqlite";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API, including the version prefix
    pub api_url: Url,
    /// Path to the SQLite file holding the stored credentials
    pub session_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables, merging `.env` first.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(
            &lookup("RELEASERITE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        let session_path = lookup("RELEASERITE_SESSION_PATH")
            .unwrap_or_else(|| DEFAULT_SESSION_PATH.to_string())
            .into();

        let log_level =
            lookup("RELEASERITE_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let log_json = match lookup("RELEASERITE_LOG_JSON") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!("RELEASERITE_LOG_JSON must be a boolean, got {raw:?}"))
            })?,
            None => false,
        };

        Ok(Self {
            api_url,
            session_path,
            log_level,
            log_json,
        })
    }
}

/// Parse and validate an API base URL.
pub fn parse_api_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::Config(format!("invalid API URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Config(format!(
            "API URL must use http or https, got {other:?}"
        ))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:8000/api/v1");
        assert_eq!(config.session_path, PathBuf::from("./data/session.sqlite"));
        assert_eq!(config.log_level, "warn");
        assert!(!config.log_json);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("RELEASERITE_API_URL", "https://releases.example.com/api/v1"),
            ("RELEASERITE_SESSION_PATH", "/tmp/rr.sqlite"),
            ("RELEASERITE_LOG_LEVEL", "debug"),
            ("RELEASERITE_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.host_str(), Some("releases.example.com"));
        assert_eq!(config.session_path, PathBuf::from("/tmp/rr.sqlite"));
        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[("RELEASERITE_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("RELEASERITE_API_URL", "ftp://host/api")]))
            .unwrap_err();
        assert!(err.to_string().contains("http or https"));

        let err = Config::from_lookup(lookup_from(&[("RELEASERITE_LOG_JSON", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
