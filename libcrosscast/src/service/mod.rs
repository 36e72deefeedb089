//! Service layer for Crosscast
//!
//! `CrosscastService` wires the publish pipeline together from configuration
//! so that interfaces (the CLI, a UI action handler) share one entry point:
//!
//! - `PublishService`: validate, dispatch, report and record one draft
//! - `EventBus`: progress and report distribution
//!
//! # Example
//!
//! ```no_run
//! use libcrosscast::service::CrosscastService;
//! use libcrosscast::service::publishing::PublishRequest;
//! use libcrosscast::types::{Draft, Platform, Target};
//!
//! # async fn example() -> libcrosscast::Result<()> {
//! let service = CrosscastService::new().await?;
//!
//! let request = PublishRequest {
//!     draft: Draft::new("Launch day!"),
//!     targets: vec![Target::new(Platform::Twitter, "acct-1")],
//! };
//!
//! let response = service.publishing().publish(request).await?;
//! if let Some(summary) = &response.aggregate.summary {
//!     println!("{}", summary);
//! }
//! response.persistence.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod publishing;

use std::sync::Arc;
use tracing::debug;

use self::events::EventBus;
use self::publishing::PublishService;
use crate::accounts::AccountRegistry;
use crate::config::{expand_path, Config};
use crate::credentials::CredentialStore;
use crate::db::Database;
use crate::dispatcher::Dispatcher;
use crate::error::{ConfigError, Result};
use crate::platforms::Adapters;

const EVENT_CAPACITY: usize = 100;

/// Main service facade
///
/// Owns the shared database handle, the account registry and the event bus.
pub struct CrosscastService {
    db: Arc<Database>,
    registry: AccountRegistry,
    publishing: PublishService,
    event_bus: EventBus,
}

impl CrosscastService {
    /// Create a service from the configuration at the default location
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration cannot be loaded
    /// - The account or credential files cannot be parsed
    /// - Database cannot be initialized or migrated
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Create a service from an explicit configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let db_path = expand_path(&config.database.path)?;
        let db_path_str = db_path
            .to_str()
            .ok_or_else(|| ConfigError::MissingField("Invalid database path".to_string()))?;
        let db = Arc::new(Database::new(db_path_str).await?);

        let registry = AccountRegistry::with_path(expand_path(&config.accounts.path)?)?;
        let credentials = CredentialStore::load(&expand_path(&config.credentials.path)?)?;
        debug!(
            user = %registry.user_id(),
            credentials = !credentials.is_empty(),
            "Loaded account registry"
        );

        let dispatcher = Dispatcher::new(
            registry.clone(),
            Arc::new(credentials),
            Adapters::http(&config.api),
        );
        let event_bus = EventBus::new(EVENT_CAPACITY);
        let publishing = PublishService::new(dispatcher, db.clone(), event_bus.clone());

        Ok(Self {
            db,
            registry,
            publishing,
            event_bus,
        })
    }

    /// Access the database directly, e.g. to list recorded posts
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn publishing(&self) -> &PublishService {
        &self.publishing
    }

    /// Subscribe to publish events
    ///
    /// Subscribe before calling `publish` to receive every event of that
    /// request. Multiple subscribers are supported.
    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }
}
