use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::proxy::{DEFAULT_PROXY_PORT, DEFAULT_PROXY_URL};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/chat";

const BACKEND_URL_ENV: &str = "AGENT_CHAT_BACKEND_URL";
const PROXY_URL_ENV: &str = "AGENT_CHAT_PROXY_URL";

/// Client settings. Credentials are deliberately absent: they are entered at
/// login and only ever held in memory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub proxy_url: String,
    pub proxy_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            proxy_port: DEFAULT_PROXY_PORT,
        }
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url;
        }
        if let Some(url) = lookup(PROXY_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.proxy_url = url;
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("agent-chat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.backend_url, "http://localhost:8080/chat");
        assert_eq!(config.proxy_port, 8088);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.backend_url = "http://agent.internal:9000/chat".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "proxy_port": 9100 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.proxy_port, 9100);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = Config::new();
        config.apply_env_overrides(|key| match key {
            BACKEND_URL_ENV => Some("http://remote:8080/chat".to_string()),
            PROXY_URL_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url, "http://remote:8080/chat");
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
    }
}
