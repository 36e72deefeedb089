//! App-level platform credentials
//!
//! Some adapters sign requests with credentials that belong to the app rather
//! than to an individual account: the Google OAuth client used to refresh
//! YouTube tokens, and the Facebook app shared by Instagram and Facebook.
//! Twitter keys live on each account instead.
//!
//! Credentials are read from a TOML file with one table per platform:
//!
//! ```toml
//! [youtube]
//! client_id = "1234.apps.googleusercontent.com"
//! client_secret = "..."
//!
//! [instagram]   # also used for Facebook
//! client_id = "fb-app-id"
//! client_secret = "..."
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::types::Platform;

/// One platform's app credentials
#[derive(Debug)]
pub struct PlatformCredentials {
    pub platform: Platform,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub api_key: Option<String>,
    pub api_secret: Option<SecretString>,
}

impl PlatformCredentials {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            client_id: None,
            client_secret: None,
            api_key: None,
            api_secret: None,
        }
    }

    pub fn with_client(mut self, client_id: &str, client_secret: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self.client_secret = Some(SecretString::from(client_secret.to_string()));
        self
    }

    pub fn with_api_key(mut self, api_key: &str, api_secret: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self.api_secret = Some(SecretString::from(api_secret.to_string()));
        self
    }

    /// OAuth client id and secret, when both are set
    pub fn oauth_client(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().filter(|v| !v.is_empty())?;
        let secret = self
            .client_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .filter(|v| !v.is_empty())?;
        Some((id, secret))
    }
}

#[derive(Debug, Deserialize)]
struct RawCredentials {
    client_id: Option<String>,
    client_secret: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl RawCredentials {
    fn into_credentials(self, platform: Platform) -> PlatformCredentials {
        PlatformCredentials {
            platform,
            client_id: self.client_id,
            client_secret: self.client_secret.map(SecretString::from),
            api_key: self.api_key,
            api_secret: self.api_secret.map(SecretString::from),
        }
    }
}

/// Read-only lookup of app credentials by platform
#[derive(Debug, Default)]
pub struct CredentialStore {
    records: BTreeMap<Platform, PlatformCredentials>,
}

impl CredentialStore {
    /// Load credentials from a TOML file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Credentials file {} not found", path.display());
            return Ok(Self::default());
        }

        warn_if_readable_by_others(path);

        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let raw: BTreeMap<Platform, RawCredentials> =
            toml::from_str(&content).map_err(ConfigError::ParseError)?;

        Ok(Self::from_records(
            raw.into_iter()
                .map(|(platform, creds)| creds.into_credentials(platform))
                .collect(),
        ))
    }

    /// Build a store from records. Facebook records are filed under the
    /// shared Instagram/Graph entry unless one already exists.
    pub fn from_records(records: Vec<PlatformCredentials>) -> Self {
        let mut map = BTreeMap::new();
        let mut facebook = None;

        for record in records {
            match record.platform {
                Platform::Facebook => facebook = Some(record),
                Platform::Twitter => {
                    debug!("Twitter app credentials are ignored; keys are read from each account");
                }
                platform => {
                    map.insert(platform, record);
                }
            }
        }

        if let Some(mut record) = facebook {
            if map.contains_key(&Platform::Instagram) {
                warn!("Both [instagram] and [facebook] credentials found; using [instagram] for both");
            } else {
                record.platform = Platform::Instagram;
                map.insert(Platform::Instagram, record);
            }
        }

        Self { records: map }
    }

    /// Credentials an adapter for `platform` should use
    pub fn for_platform(&self, platform: Platform) -> Option<&PlatformCredentials> {
        self.records.get(&platform.account_platform())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(unix)]
fn warn_if_readable_by_others(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.permissions().mode() & 0o077 != 0 {
            warn!(
                "Credentials file {} is accessible by other users; consider chmod 600",
                path.display()
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_readable_by_others(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_instagram_and_facebook_share_one_record() {
        let store = CredentialStore::from_records(vec![
            PlatformCredentials::new(Platform::Instagram).with_client("fb-app", "fb-secret"),
        ]);

        let ig = store.for_platform(Platform::Instagram).unwrap();
        let fb = store.for_platform(Platform::Facebook).unwrap();
        assert!(std::ptr::eq(ig, fb));
        assert_eq!(fb.oauth_client(), Some(("fb-app", "fb-secret")));
    }

    #[test]
    fn test_facebook_record_becomes_shared_graph_record() {
        let store = CredentialStore::from_records(vec![
            PlatformCredentials::new(Platform::Facebook).with_client("fb-app", "fb-secret"),
        ]);

        assert_eq!(
            store.for_platform(Platform::Instagram).unwrap().platform,
            Platform::Instagram
        );
    }

    #[test]
    fn test_oauth_client_requires_both_parts() {
        let mut creds = PlatformCredentials::new(Platform::YouTube);
        creds.client_id = Some("id".to_string());
        assert_eq!(creds.oauth_client(), None);

        let creds = creds.with_client("id", "");
        assert_eq!(creds.oauth_client(), None);
    }

    #[test]
    fn test_secrets_not_exposed_in_debug() {
        let creds = PlatformCredentials::new(Platform::YouTube)
            .with_client("client-id", "super-secret-value");
        let debug_output = format!("{:?}", creds);

        assert!(!debug_output.contains("super-secret-value"));
        assert!(debug_output.contains("client-id"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.toml");
        std::fs::write(
            &path,
            r#"
[youtube]
client_id = "yt-client"
client_secret = "yt-secret"

[facebook]
client_id = "graph-app"
client_secret = "graph-secret"
"#,
        )
        .unwrap();

        let store = CredentialStore::load(&path).unwrap();
        assert_eq!(
            store.for_platform(Platform::YouTube).unwrap().oauth_client(),
            Some(("yt-client", "yt-secret"))
        );
        assert_eq!(
            store.for_platform(Platform::Instagram).unwrap().client_id.as_deref(),
            Some("graph-app")
        );
        assert!(store.for_platform(Platform::Twitter).is_none());
    }

    #[test]
    fn test_twitter_section_is_not_stored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.toml");
        std::fs::write(
            &path,
            r#"
[twitter]
client_id = "tw-app"
client_secret = "tw-secret"
"#,
        )
        .unwrap();

        let store = CredentialStore::load(&path).unwrap();
        assert!(store.for_platform(Platform::Twitter).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = CredentialStore::load(Path::new("/nonexistent/credentials.toml")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_unknown_platform_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.toml");
        std::fs::write(&path, "[myspace]\nclient_id = \"x\"\n").unwrap();

        assert!(CredentialStore::load(&path).is_err());
    }
}
