//! Client configuration: where the API lives and how to talk to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file has invalid TOML syntax: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("could not locate a user config directory")]
    NoConfigDir,
}

/// Settings for the API client, from `config.toml` under the user config
/// dir. Every field has a default so a missing file just means defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Kanban REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Board opened when no `--board` flag is given.
    #[serde(default)]
    pub board: Option<String>,
    /// Global request timeout, shared by every call (fetch and persist).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            board: None,
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

/// Path of the config file: `<user config dir>/kanri/config.toml`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("kanri").join("config.toml"))
}

/// Load the config file if present, otherwise defaults. `KANRI_API_URL`
/// overrides the file in either case.
pub fn load() -> Result<ClientConfig, ConfigError> {
    let mut config = match config_path() {
        Ok(path) => load_from(&path)?,
        Err(ConfigError::NoConfigDir) => ClientConfig::default(),
        Err(e) => return Err(e),
    };
    if let Ok(url) = std::env::var("KANRI_API_URL") {
        if !url.is_empty() {
            config.api_url = url;
        }
    }
    Ok(config)
}

/// Load from an explicit path; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.board.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://kanban.example/api\"\n").unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://kanban.example/api");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn full_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ClientConfig {
            api_url: "https://kanban.example/api".into(),
            board: Some("board-7".into()),
            timeout_secs: 30,
            token: Some("secret".into()),
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.board.as_deref(), Some("board-7"));
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.token.as_deref(), Some("secret"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = [not toml").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::TomlDe(_))));
    }
}
