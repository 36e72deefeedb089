//! Mock publisher for testing
//!
//! A configurable adapter that can simulate successes, failures, and delays.
//! It records every job it receives so integration tests can verify dispatch
//! behavior without credentials or network access.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::PlatformError;
use crate::platforms::{PublishJob, Publisher};
use crate::types::{ExternalRef, Platform};

/// What the mock saw for one publish call
#[derive(Debug, Clone)]
pub struct PublishedJob {
    pub account_id: String,
    pub text: String,
    pub media_url: Option<String>,
    pub media_bytes: Option<Bytes>,
    pub multi_target: bool,
}

/// Configuration for mock publisher behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub platform: Platform,

    /// Error to return instead of succeeding
    pub error: Option<PlatformError>,

    /// Delay before completing (simulates network latency)
    pub delay: Duration,

    /// Number of times publish has been called
    pub publish_call_count: Arc<Mutex<usize>>,

    /// Jobs that have been received (for verification)
    pub published: Arc<Mutex<Vec<PublishedJob>>>,
}

impl MockConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            error: None,
            delay: Duration::from_millis(0),
            publish_call_count: Arc::new(Mutex::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock publisher for testing
pub struct MockPublisher {
    config: MockConfig,
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock publisher that always succeeds
    pub fn success(platform: Platform) -> Self {
        Self::new(MockConfig::new(platform))
    }

    /// Create a mock publisher that always fails with `error`
    pub fn failure(platform: Platform, error: PlatformError) -> Self {
        Self::new(MockConfig {
            error: Some(error),
            ..MockConfig::new(platform)
        })
    }

    /// Create a mock publisher with a delay
    pub fn with_delay(platform: Platform, delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..MockConfig::new(platform)
        })
    }

    /// Get the number of times publish was called
    pub fn publish_call_count(&self) -> usize {
        *self
            .config
            .publish_call_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get every job that was received
    pub fn published(&self) -> Vec<PublishedJob> {
        self.config
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> Platform {
        self.config.platform
    }

    async fn publish(&self, job: &PublishJob<'_>) -> Result<ExternalRef, PlatformError> {
        *self
            .config
            .publish_call_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;

        self.config
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedJob {
                account_id: job.account.id.clone(),
                text: job.draft.text.clone(),
                media_url: job.media.url().map(str::to_string),
                media_bytes: job.media.blob().map(|blob| blob.bytes.clone()),
                multi_target: job.multi_target,
            });

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        match &self.config.error {
            Some(error) => Err(error.clone()),
            None => Ok(ExternalRef::new(
                format!("{}:mock-{}", self.config.platform, uuid::Uuid::new_v4()),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaPayload;
    use crate::types::{Draft, SocialAccount};

    fn job_parts() -> (SocialAccount, Draft) {
        (
            SocialAccount::new("acct-1", Platform::Twitter, "someone"),
            Draft::new("Test content"),
        )
    }

    #[tokio::test]
    async fn test_mock_success() {
        let publisher = MockPublisher::success(Platform::Twitter);
        let (account, draft) = job_parts();
        let job = PublishJob {
            account: &account,
            credentials: None,
            draft: &draft,
            media: MediaPayload::Url("https://cdn.example.com/a.jpg".to_string()),
            multi_target: true,
        };

        let external = publisher.publish(&job).await.unwrap();
        assert!(external.id.starts_with("twitter:mock-"));
        assert_eq!(publisher.publish_call_count(), 1);

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].account_id, "acct-1");
        assert_eq!(published[0].text, "Test content");
        assert_eq!(published[0].media_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert!(published[0].multi_target);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let publisher = MockPublisher::failure(
            Platform::Twitter,
            PlatformError::RateLimit("Too many requests".to_string()),
        );
        let (account, draft) = job_parts();
        let job = PublishJob {
            account: &account,
            credentials: None,
            draft: &draft,
            media: MediaPayload::None,
            multi_target: false,
        };

        let result = publisher.publish(&job).await;
        assert_eq!(
            result,
            Err(PlatformError::RateLimit("Too many requests".to_string()))
        );
        assert_eq!(publisher.publish_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let publisher = MockPublisher::with_delay(Platform::Twitter, Duration::from_millis(50));
        let (account, draft) = job_parts();
        let job = PublishJob {
            account: &account,
            credentials: None,
            draft: &draft,
            media: MediaPayload::None,
            multi_target: false,
        };

        let start = std::time::Instant::now();
        publisher.publish(&job).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
