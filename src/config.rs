//! Application-level configuration: optional JSON file, then environment overrides.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the bot looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GAMEBOT_CONFIG_PATH";

const DEFAULT_DATABASE_URL: &str = "postgres://postgres:postgres@db:5432/gamebot?sslmode=disable";
const DEFAULT_VK_API_URL: &str = "https://api.vk.com/method";
const DEFAULT_VK_API_VERSION: &str = "5.199";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LONG_POLL_WAIT_SECS: u64 = 25;

/// Which [`ResultStore`](crate::dao::result_store::ResultStore) backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// PostgreSQL at `database_url`.
    Postgres,
    /// Process-local tables; results are lost on restart.
    Memory,
}

impl StoreKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(StoreKind::Postgres),
            "memory" => Some(StoreKind::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Community access token; required to talk to VK.
    pub vk_token: Option<String>,
    /// Base URL of the VK method API.
    pub vk_api_url: String,
    /// Value sent as the `v` parameter of every method call.
    pub vk_api_version: String,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Backend selected for users and results.
    pub store: StoreKind,
    /// Upper bound for every persistence call.
    pub store_timeout: Duration,
    /// `wait` passed to the long-poll server.
    pub long_poll_wait: Duration,
}

impl AppConfig {
    /// Load the file configuration (falling back to defaults), then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn load_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Override fields from `lookup`; empty values are ignored and unparsable ones logged.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = lookup("VK_TOKEN") {
            self.vk_token = Some(token);
        }
        if let Some(url) = lookup("VK_API_URL") {
            self.vk_api_url = url;
        }
        if let Some(version) = lookup("VK_API_VERSION") {
            self.vk_api_version = version;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        } else {
            info!("DATABASE_URL not set; using configured database url");
        }
        if let Some(value) = lookup("GAMEBOT_STORE") {
            match StoreKind::parse(&value) {
                Some(kind) => self.store = kind,
                None => warn!(value = %value, "unknown GAMEBOT_STORE; keeping {:?}", self.store),
            }
        }
        if let Some(value) = lookup("STORE_TIMEOUT_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.store_timeout = Duration::from_millis(ms),
                Err(err) => warn!(value = %value, error = %err, "invalid STORE_TIMEOUT_MS"),
            }
        }
        if let Some(value) = lookup("LONG_POLL_WAIT_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.long_poll_wait = Duration::from_secs(secs),
                Err(err) => warn!(value = %value, error = %err, "invalid LONG_POLL_WAIT_SECS"),
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vk_token: None,
            vk_api_url: DEFAULT_VK_API_URL.into(),
            vk_api_version: DEFAULT_VK_API_VERSION.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            store: StoreKind::Postgres,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            long_poll_wait: Duration::from_secs(DEFAULT_LONG_POLL_WAIT_SECS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    vk_token: Option<String>,
    vk_api_url: Option<String>,
    vk_api_version: Option<String>,
    database_url: Option<String>,
    store: Option<StoreKind>,
    store_timeout_ms: Option<u64>,
    long_poll_wait_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            vk_token: value.vk_token,
            vk_api_url: value.vk_api_url.unwrap_or(defaults.vk_api_url),
            vk_api_version: value.vk_api_version.unwrap_or(defaults.vk_api_version),
            database_url: value.database_url.unwrap_or(defaults.database_url),
            store: value.store.unwrap_or(defaults.store),
            store_timeout: value
                .store_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            long_poll_wait: value
                .long_poll_wait_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.long_poll_wait),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert!(config.vk_token.is_none());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config: AppConfig = serde_json::from_str::<RawConfig>(
            r#"{"database_url": "postgres://file/db", "store_timeout_ms": 900}"#,
        )
        .unwrap()
        .into();
        assert_eq!(config.store_timeout, Duration::from_millis(900));

        config.apply_env(env_of(&[
            ("VK_TOKEN", "secret"),
            ("DATABASE_URL", "postgres://env/db"),
            ("GAMEBOT_STORE", "Memory"),
        ]));

        assert_eq!(config.vk_token.as_deref(), Some("secret"));
        assert_eq!(config.database_url, "postgres://env/db");
        assert_eq!(config.store, StoreKind::Memory);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("GAMEBOT_STORE", "redis"),
            ("STORE_TIMEOUT_MS", "soon"),
            ("DATABASE_URL", "   "),
        ]));

        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }
}
