//! Runtime configuration, read once from the environment and passed around explicitly.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which submission adapter the service uses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BackendKind {
    /// Remote game backend at `api_url`.
    Http,
    /// Local JSON store under `storage_dir`.
    #[default]
    Storage,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "storage" | "local" | "mock" => Ok(BackendKind::Storage),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown BACKEND '{0}' (expected 'http' or 'storage')")]
    UnknownBackend(String),
    #[error("Invalid PORT '{0}'")]
    InvalidPort(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the remote game backend.
    pub api_url: String,
    /// Origin used for share links (`{origin}/court_manager/game/{id}`).
    pub public_origin: String,
    pub backend: BackendKind,
    pub storage_dir: PathBuf,
    pub access_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_public_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_url: default_api_url(),
            public_origin: default_public_origin(),
            backend: BackendKind::default(),
            storage_dir: default_storage_dir(),
            access_token: None,
        }
    }
}

impl Config {
    /// Read HOST, PORT, API_URL, PUBLIC_ORIGIN, BACKEND, STORAGE_DIR and ACCESS_TOKEN.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or empty keys use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = match get("PORT") {
            Some(p) => p.trim().parse().map_err(|_| ConfigError::InvalidPort(p))?,
            None => default_port(),
        };
        let backend = match get("BACKEND") {
            Some(b) => b.parse()?,
            None => BackendKind::default(),
        };
        Ok(Self {
            host: get("HOST").unwrap_or_else(default_host),
            port,
            api_url: get("API_URL").unwrap_or_else(default_api_url),
            public_origin: get("PUBLIC_ORIGIN").unwrap_or_else(default_public_origin),
            backend,
            storage_dir: get("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_storage_dir),
            access_token: get("ACCESS_TOKEN"),
        })
    }
}
