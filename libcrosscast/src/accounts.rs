//! Registry of a user's connected social accounts
//!
//! The registry is the orchestrator's read-only view of which accounts a user
//! has connected and the identifiers/tokens each one carries. Writes come from
//! the OAuth callback flow or manual credential entry through [`AccountRegistry::upsert`]
//! and [`AccountRegistry::disconnect`].
//!
//! Facebook has no connection record of its own: a Facebook Page is published
//! through the Instagram connection that carries `facebook_page_id` and
//! `page_access_token`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::{AccountError, Result};
use crate::types::{non_empty, Platform, SocialAccount, Target};

const DEFAULT_USER_ID: &str = "local";

/// Thread-safe registry of connected accounts, optionally backed by a TOML file
#[derive(Clone)]
pub struct AccountRegistry {
    /// Backing file; `None` for in-memory registries
    state_file: Option<PathBuf>,
    state: Arc<RwLock<RegistryState>>,
}

/// Registry contents persisted to TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub accounts: Vec<SocialAccount>,
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            accounts: Vec::new(),
        }
    }
}

impl AccountRegistry {
    /// Open the registry stored at `state_file`
    ///
    /// A missing file yields an empty registry; it is created on the first write.
    pub fn with_path(state_file: PathBuf) -> Result<Self> {
        let registry = Self {
            state_file: Some(state_file),
            state: Arc::new(RwLock::new(RegistryState::default())),
        };
        registry.load()?;
        Ok(registry)
    }

    /// Build an in-memory registry
    pub fn from_accounts(user_id: impl Into<String>, accounts: Vec<SocialAccount>) -> Self {
        let state = RegistryState {
            user_id: user_id.into(),
            accounts: sanitize(accounts),
        };
        Self {
            state_file: None,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Owner of every account in this registry
    pub fn user_id(&self) -> String {
        self.read().user_id.clone()
    }

    /// Accounts usable for `platform`
    ///
    /// For Facebook this is the Instagram connections that carry a Page id.
    pub fn accounts_for(&self, platform: Platform) -> Vec<SocialAccount> {
        let state = self.read();
        state
            .accounts
            .iter()
            .filter(|a| a.platform == platform.account_platform())
            .filter(|a| {
                platform != Platform::Facebook || non_empty(&a.facebook_page_id).is_some()
            })
            .cloned()
            .collect()
    }

    /// All accounts grouped by the platform they can publish to
    pub fn grouped(&self) -> BTreeMap<Platform, Vec<SocialAccount>> {
        Platform::ALL
            .iter()
            .map(|p| (*p, self.accounts_for(*p)))
            .filter(|(_, accounts)| !accounts.is_empty())
            .collect()
    }

    /// Look up the account a target refers to
    pub fn resolve(&self, target: &Target) -> Option<SocialAccount> {
        let state = self.read();
        let account = state
            .accounts
            .iter()
            .find(|a| {
                a.platform == target.platform.account_platform() && a.id == target.account_id
            })
            .cloned();

        if account.is_none() {
            debug!("No {} account with id '{}'", target.platform, target.account_id);
        }
        account
    }

    /// Insert or replace an account record
    ///
    /// Rejects Facebook records (Pages hang off the Instagram connection) and
    /// connected accounts missing their platform identity fields.
    pub fn upsert(&self, account: SocialAccount) -> Result<()> {
        if account.id.trim().is_empty() {
            return Err(AccountError::Invalid(
                account.username.clone(),
                "account id cannot be empty".to_string(),
            )
            .into());
        }

        if account.platform == Platform::Facebook {
            return Err(AccountError::Invalid(
                account.id.clone(),
                "Facebook Pages are connected through an Instagram account".to_string(),
            )
            .into());
        }

        let missing = account.missing_identity_fields();
        if account.connected && !missing.is_empty() {
            return Err(AccountError::Invalid(
                account.id.clone(),
                format!("connected account is missing {}", missing.join(", ")),
            )
            .into());
        }

        {
            let mut state = self.write();
            match state
                .accounts
                .iter_mut()
                .find(|a| a.platform == account.platform && a.id == account.id)
            {
                Some(existing) => *existing = account,
                None => state.accounts.push(account),
            }
        }

        self.save()
    }

    /// Mark an account as disconnected, keeping its record
    pub fn disconnect(&self, platform: Platform, account_id: &str) -> Result<()> {
        {
            let mut state = self.write();
            let account = state
                .accounts
                .iter_mut()
                .find(|a| a.platform == platform.account_platform() && a.id == account_id)
                .ok_or_else(|| {
                    AccountError::NotFound(account_id.to_string(), platform.to_string())
                })?;
            account.connected = false;
        }

        self.save()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize state to the backing file, if any
    fn save(&self) -> Result<()> {
        let Some(state_file) = &self.state_file else {
            return Ok(());
        };

        if let Some(parent) = state_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AccountError::StateFile(format!("Failed to create directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(&*self.read()).map_err(AccountError::Serialize)?;

        std::fs::write(state_file, content)
            .map_err(|e| AccountError::StateFile(format!("Failed to write account file: {}", e)))?;

        // Account files hold tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(state_file, permissions).map_err(|e| {
                AccountError::StateFile(format!("Failed to set permissions: {}", e))
            })?;
        }

        Ok(())
    }

    fn load(&self) -> Result<()> {
        let Some(state_file) = &self.state_file else {
            return Ok(());
        };

        if !state_file.exists() {
            debug!("Account file {} not found, starting empty", state_file.display());
            return Ok(());
        }

        let content = std::fs::read_to_string(state_file)
            .map_err(|e| AccountError::StateFile(format!("Failed to read account file: {}", e)))?;

        let mut loaded: RegistryState = toml::from_str(&content).map_err(AccountError::Parse)?;
        loaded.accounts = sanitize(loaded.accounts);

        *self.write() = loaded;
        Ok(())
    }
}

/// Drop records that cannot exist and flag broken connections
fn sanitize(accounts: Vec<SocialAccount>) -> Vec<SocialAccount> {
    accounts
        .into_iter()
        .filter(|account| {
            if account.platform == Platform::Facebook {
                warn!(
                    "Ignoring Facebook account '{}': Pages are published through an Instagram connection",
                    account.id
                );
                return false;
            }

            let missing = account.missing_identity_fields();
            if account.connected && !missing.is_empty() {
                warn!(
                    "{} account '{}' is marked connected but is missing {}",
                    account.platform,
                    account.id,
                    missing.join(", ")
                );
            }
            true
        })
        .collect()
}
