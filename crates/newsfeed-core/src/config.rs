//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: which
//! server to talk to, where the push endpoint lives, how the session token
//! is persisted, and the last username used to log in.
//!
//! Configuration is stored at `~/.config/newsfeed/config.json`. Environment
//! variables override file values after loading.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, Session};
use crate::live::DEFAULT_HEARTBEAT_INTERVAL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "newsfeed";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Server used when nothing is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Path of the push endpoint relative to the server
const LIVE_PATH: &str = "/ws";

pub const ENV_SERVER_URL: &str = "NEWSFEED_SERVER_URL";
pub const ENV_LIVE_URL: &str = "NEWSFEED_LIVE_URL";
pub const ENV_TOKEN_STORE: &str = "NEWSFEED_TOKEN_STORE";
pub const ENV_LOG_DIR: &str = "NEWSFEED_LOG_DIR";

/// Where the session token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown token store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server_url: Option<String>,
    pub live_url: Option<String>,
    #[serde(default)]
    pub token_store: TokenStoreKind,
    pub heartbeat_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
    pub last_username: Option<String>,
}

impl Config {
    /// Load from the default location, returning defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `NEWSFEED_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_SERVER_URL) {
            self.server_url = Some(url);
        }
        if let Some(url) = get(ENV_LIVE_URL) {
            self.live_url = Some(url);
        }
        if let Some(kind) = get(ENV_TOKEN_STORE) {
            self.token_store = kind
                .parse()
                .with_context(|| format!("Invalid {}", ENV_TOKEN_STORE))?;
        }
        if let Some(dir) = get(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Push endpoint: the explicit `live_url`, or the server URL with a
    /// WebSocket scheme and the `/ws` path.
    pub fn live_endpoint(&self) -> Result<String> {
        if let Some(ref url) = self.live_url {
            return Ok(url.clone());
        }

        let mut url = Url::parse(self.server_url())
            .with_context(|| format!("Invalid server URL: {}", self.server_url()))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(anyhow::anyhow!("Unsupported server URL scheme: {}", other)),
        };
        url.set_scheme(scheme)
            .map_err(|_| anyhow::anyhow!("Cannot derive live endpoint from {}", self.server_url()))?;
        url.set_path(LIVE_PATH);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url.to_string())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL)
    }

    /// Per-request timeout. None means requests may wait indefinitely.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the session, restoring any token the configured store persisted.
    pub fn restore_session(&self) -> Result<Session> {
        let session = match self.token_store {
            TokenStoreKind::File => Session::restore(FileTokenStore::new(self.cache_dir()?)),
            TokenStoreKind::Keyring => Session::restore(KeyringTokenStore::new()),
            TokenStoreKind::Memory => Session::new(MemoryTokenStore::new()),
        };
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with_server(url: &str) -> Config {
        Config {
            server_url: Some(url.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_url(), DEFAULT_SERVER_URL);
        assert_eq!(config.live_endpoint().unwrap(), "ws://localhost:3000/ws");
        assert_eq!(config.heartbeat_interval(), Duration::from_millis(1000));
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.token_store, TokenStoreKind::File);
    }

    #[test]
    fn test_live_endpoint_derivation() {
        let config = config_with_server("https://news.example.com/app?x=1");
        assert_eq!(config.live_endpoint().unwrap(), "wss://news.example.com/ws");

        let config = config_with_server("http://127.0.0.1:8000");
        assert_eq!(config.live_endpoint().unwrap(), "ws://127.0.0.1:8000/ws");

        let config = config_with_server("ftp://example.com");
        assert!(config.live_endpoint().is_err());
    }

    #[test]
    fn test_explicit_live_url_wins() {
        let config = Config {
            server_url: Some("https://news.example.com".to_string()),
            live_url: Some("ws://push.example.com:9000/socket".to_string()),
            ..Config::default()
        };
        assert_eq!(config.live_endpoint().unwrap(), "ws://push.example.com:9000/socket");
    }

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SERVER_URL, "http://api.internal:8080"),
            (ENV_TOKEN_STORE, "Keyring"),
            (ENV_LIVE_URL, "   "),
        ]
        .into_iter()
        .collect();

        let mut config = config_with_server("http://old");
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server_url(), "http://api.internal:8080");
        assert_eq!(config.token_store, TokenStoreKind::Keyring);
        assert_eq!(config.live_url, None);
    }

    #[test]
    fn test_apply_overrides_rejects_unknown_store() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_TOKEN_STORE).then(|| "floppy".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newsfeed").join(CONFIG_FILE);

        assert!(Config::load_from(&path).unwrap().server_url.is_none());

        let config = Config {
            server_url: Some("http://localhost:8000".to_string()),
            last_username: Some("alice".to_string()),
            heartbeat_interval_ms: Some(250),
            token_store: TokenStoreKind::Memory,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
        assert_eq!(loaded.heartbeat_interval(), Duration::from_millis(250));
        assert_eq!(loaded.token_store, TokenStoreKind::Memory);
    }

    #[test]
    fn test_zero_values_fall_back() {
        let config = Config {
            heartbeat_interval_ms: Some(0),
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(config.heartbeat_interval(), DEFAULT_HEARTBEAT_INTERVAL);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_memory_store_session_starts_anonymous() {
        let config = Config {
            token_store: TokenStoreKind::Memory,
            ..Config::default()
        };
        assert!(!config.restore_session().unwrap().is_authenticated());
    }
}
