//! Configuration and credential storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::auth::{StoredToken, TokenClaims, TokenStore};

/// Backend the web front end's dev server proxies `/api` to.
pub const DEFAULT_API_BASE: &str = "http://localhost:9000";
/// Help chatbot host.
pub const DEFAULT_CHATBOT_URL: &str = "http://localhost:8000";

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL (scheme + host + port, no `/api` suffix)
    pub api_base_url: Option<String>,
    /// Chatbot host base URL
    pub chatbot_url: Option<String>,
    /// Stored bearer token (the web client's `authToken`)
    pub auth_token: Option<StoredToken>,
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "carparter", "carparter-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains the token)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn chatbot_url(&self) -> &str {
        self.chatbot_url.as_deref().unwrap_or(DEFAULT_CHATBOT_URL)
    }

    /// Raw bearer token, if one is stored. Expired tokens are still returned;
    /// the backend is the one that rejects them.
    pub fn bearer_token(&self) -> Option<String> {
        self.auth_token.as_ref().map(|t| t.token.clone())
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        self.auth_token.as_ref().and_then(|t| t.claims())
    }
}

impl TokenStore for Config {
    fn get_auth_token(&self) -> Option<StoredToken> {
        self.auth_token.clone()
    }

    fn set_auth_token(&mut self, token: String) {
        self.auth_token = Some(StoredToken::new(token));
    }

    fn clear_tokens(&mut self) {
        self.auth_token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE);
        assert_eq!(config.chatbot_url(), DEFAULT_CHATBOT_URL);
        assert!(config.bearer_token().is_none());
    }

    #[test]
    fn test_round_trip_keeps_token() {
        let mut config = Config {
            api_base_url: Some("https://api.carparter.example".to_string()),
            ..Default::default()
        };
        config.set_auth_token("abc".to_string());

        let text = toml::to_string_pretty(&config).unwrap();
        let loaded = Config::parse(&text).unwrap();
        assert_eq!(loaded.api_base_url(), "https://api.carparter.example");
        assert_eq!(loaded.bearer_token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_clear_tokens() {
        let mut config = Config::default();
        config.set_auth_token("abc".to_string());
        config.clear_tokens();
        assert!(config.get_auth_token().is_none());
    }
}
