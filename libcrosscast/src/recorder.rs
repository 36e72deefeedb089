//! Durable record of successful publishes

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::db::Database;
use crate::error::{CrosscastError, DbError, Result};
use crate::types::{Draft, PostRecord, PublishOutcome};

/// Sink for one record per successfully published target
#[async_trait]
pub trait PostRecorder: Send + Sync {
    async fn record(&self, record: &PostRecord) -> Result<()>;
}

#[async_trait]
impl PostRecorder for Database {
    async fn record(&self, record: &PostRecord) -> Result<()> {
        self.create_post_record(record).await
    }
}

/// Records for the successful outcomes only, in outcome order
pub fn records_for(user_id: &str, draft: &Draft, outcomes: &[PublishOutcome]) -> Vec<PostRecord> {
    outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| PostRecord::for_success(user_id, &o.target, draft, o.external_ref()))
        .collect()
}

/// In-memory recorder, available to integration tests and embedders that do
/// not persist
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    records: Arc<Mutex<Vec<PostRecord>>>,
    fail_with: Option<String>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose every write fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<PostRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PostRecorder for MemoryRecorder {
    async fn record(&self, record: &PostRecord) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(CrosscastError::Database(DbError::IoError(
                std::io::Error::other(message.clone()),
            )));
        }

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
