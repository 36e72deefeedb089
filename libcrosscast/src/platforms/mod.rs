//! Publisher adapters, one per supported platform
//!
//! Each adapter performs a single publish against one external API and maps
//! every failure to a [`PlatformError`]. Adapters hold no per-request state,
//! so one instance serves any number of concurrent jobs.
//!
//! # Examples
//!
//! ```no_run
//! use libcrosscast::config::ApiConfig;
//! use libcrosscast::media::MediaPayload;
//! use libcrosscast::platforms::{Adapters, PublishJob};
//! use libcrosscast::types::{Draft, Platform, SocialAccount};
//!
//! # async fn example() -> Result<(), libcrosscast::error::PlatformError> {
//! let adapters = Adapters::http(&ApiConfig::default());
//!
//! let mut account = SocialAccount::new("acct-1", Platform::Twitter, "someone");
//! account.connected = true;
//! let draft = Draft::new("Hello from Crosscast");
//!
//! let job = PublishJob {
//!     account: &account,
//!     credentials: None,
//!     draft: &draft,
//!     media: MediaPayload::None,
//!     multi_target: false,
//! };
//! let external = adapters.get(Platform::Twitter).publish(&job).await?;
//! println!("Posted: {}", external.id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::config::ApiConfig;
use crate::credentials::PlatformCredentials;
use crate::error::PlatformError;
use crate::media::MediaPayload;
use crate::types::{Draft, ExternalRef, Platform, SocialAccount};

pub mod facebook;
pub(crate) mod http;
pub mod instagram;
pub mod oauth1;
pub mod twitter;
pub mod youtube;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Everything an adapter needs for one target
pub struct PublishJob<'a> {
    /// Connection record. For Facebook this is the Instagram record that
    /// carries the page id and page token.
    pub account: &'a SocialAccount,
    /// App-level credentials for the platform, if configured
    pub credentials: Option<&'a PlatformCredentials>,
    pub draft: &'a Draft,
    pub media: MediaPayload,
    /// True when the draft is going to more than one target
    pub multi_target: bool,
}

/// One-shot publish call against an external API
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The platform this adapter publishes to
    fn platform(&self) -> Platform;

    /// Publish the job's draft and return the remote reference
    ///
    /// # Errors
    ///
    /// - `PlatformError::Authentication` for rejected or missing tokens
    /// - `PlatformError::RateLimit` when throttled
    /// - `PlatformError::Validation` when the platform rejects the content
    /// - `PlatformError::Network` for transport failures
    /// - `PlatformError::Posting` for anything else, including malformed responses
    async fn publish(&self, job: &PublishJob<'_>) -> Result<ExternalRef, PlatformError>;
}

/// The four hard-wired adapters
#[derive(Clone)]
pub struct Adapters {
    youtube: Arc<dyn Publisher>,
    instagram: Arc<dyn Publisher>,
    facebook: Arc<dyn Publisher>,
    twitter: Arc<dyn Publisher>,
}

impl Adapters {
    /// Real adapters sharing one HTTP client
    ///
    /// No timeout is set on the client; a publish waits as long as the
    /// platform takes.
    pub fn http(api: &ApiConfig) -> Self {
        let client = Client::new();
        Self {
            youtube: Arc::new(youtube::YouTubePublisher::new(client.clone(), api)),
            instagram: Arc::new(instagram::InstagramPublisher::new(client.clone(), api)),
            facebook: Arc::new(facebook::FacebookPublisher::new(client.clone(), api)),
            twitter: Arc::new(twitter::TwitterPublisher::new(client, api)),
        }
    }

    pub fn new(
        youtube: Arc<dyn Publisher>,
        instagram: Arc<dyn Publisher>,
        facebook: Arc<dyn Publisher>,
        twitter: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            youtube,
            instagram,
            facebook,
            twitter,
        }
    }

    pub fn get(&self, platform: Platform) -> &dyn Publisher {
        match platform {
            Platform::YouTube => self.youtube.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Facebook => self.facebook.as_ref(),
            Platform::Twitter => self.twitter.as_ref(),
        }
    }
}
