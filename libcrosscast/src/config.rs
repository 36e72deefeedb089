//! Configuration management for Crosscast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub accounts: AccountsConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Location of the connected-account registry file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    pub path: String,
}

/// Location of the app-level platform credentials file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub path: String,
}

/// Endpoints of the external platform APIs
///
/// Defaults point at the public services. Overriding them redirects every
/// adapter, e.g. to a staging proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub google_token_url: String,
    pub youtube_upload_base: String,
    pub graph_base: String,
    pub twitter_api_base: String,
    pub twitter_upload_base: String,
    /// Privacy status for immediately published YouTube uploads
    pub youtube_privacy: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            youtube_upload_base: "https://www.googleapis.com/upload/youtube/v3".to_string(),
            graph_base: "https://graph.facebook.com/v19.0".to_string(),
            twitter_api_base: "https://api.twitter.com/2".to_string(),
            twitter_upload_base: "https://upload.twitter.com/1.1".to_string(),
            youtube_privacy: "public".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/crosscast/posts.db".to_string(),
            },
            accounts: AccountsConfig {
                path: "~/.config/crosscast/accounts.toml".to_string(),
            },
            credentials: CredentialsConfig {
                path: "~/.config/crosscast/credentials.toml".to_string(),
            },
            api: ApiConfig::default(),
        }
    }
}

/// Expand `~` and environment variables in a configured path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).map_err(|e| {
        ConfigError::MissingField(format!("Failed to expand path '{}': {}", path, e))
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Resolve the configuration file path following the XDG base directory layout
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CROSSCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("crosscast").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_with_defaults_for_api() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "/tmp/posts.db"

[accounts]
path = "/tmp/accounts.toml"

[credentials]
path = "/tmp/credentials.toml"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.database.path, "/tmp/posts.db");
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_partial_api_override() {
        let config: Config = toml::from_str(
            r#"
[database]
path = "db"
[accounts]
path = "a"
[credentials]
path = "c"
[api]
graph_base = "http://127.0.0.1:9000"
"#,
        )
        .unwrap();

        assert_eq!(config.api.graph_base, "http://127.0.0.1:9000");
        assert_eq!(
            config.api.twitter_api_base,
            ApiConfig::default().twitter_api_base
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_path(Path::new("/nonexistent/crosscast.toml"));
        match result {
            Err(crate::CrosscastError::Config(ConfigError::ReadError(_))) => {}
            other => panic!("Expected read error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[database\npath = ").unwrap();

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(crate::CrosscastError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default_config();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.accounts.path, config.accounts.path);
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        std::env::set_var("CROSSCAST_CONFIG", "/custom/crosscast.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("CROSSCAST_CONFIG");

        assert_eq!(path, PathBuf::from("/custom/crosscast.toml"));
    }

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("/var/lib/x.db").unwrap(), PathBuf::from("/var/lib/x.db"));
    }
}
