//! Publishing service: dispatch, report, then record
//!
//! Reports reach subscribers before any record is written. Writes run on a
//! spawned task and are awaited only if the caller asks, through the
//! returned [`PersistenceHandle`].

use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::events::{Event, EventBus};
use crate::dispatcher::Dispatcher;
use crate::error::{CrosscastError, Result};
use crate::recorder::{records_for, PostRecorder};
use crate::report::{aggregate, Aggregate};
use crate::types::{Draft, PublishOutcome, Target};

/// One draft and the targets it goes to
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub draft: Draft,
    pub targets: Vec<Target>,
}

/// Settled result of a publish request
#[derive(Debug)]
pub struct PublishResponse {
    pub request_id: String,
    /// One outcome per requested target, in request order
    pub outcomes: Vec<PublishOutcome>,
    pub aggregate: Aggregate,
    pub persistence: PersistenceHandle,
}

/// How recording one successful target went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Recorded,
    PersistenceFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceReport {
    pub entries: Vec<(Target, RecordStatus)>,
}

impl PersistenceReport {
    pub fn all_recorded(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, status)| *status == RecordStatus::Recorded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &(Target, RecordStatus)> {
        self.entries
            .iter()
            .filter(|(_, status)| *status != RecordStatus::Recorded)
    }
}

/// Background record writes for one request
///
/// Dropping the handle does not cancel the writes.
#[derive(Debug)]
pub struct PersistenceHandle {
    targets: Vec<Target>,
    task: JoinHandle<Vec<(Target, RecordStatus)>>,
}

impl PersistenceHandle {
    /// Wait for every write to finish
    pub async fn wait(self) -> PersistenceReport {
        match self.task.await {
            Ok(entries) => PersistenceReport { entries },
            Err(e) => {
                warn!(error = %e, "Record task did not complete");
                let reason = format!("record task failed: {}", e);
                PersistenceReport {
                    entries: self
                        .targets
                        .into_iter()
                        .map(|target| (target, RecordStatus::PersistenceFailed(reason.clone())))
                        .collect(),
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct PublishService {
    dispatcher: Dispatcher,
    recorder: Arc<dyn PostRecorder>,
    event_bus: EventBus,
}

impl PublishService {
    pub fn new(dispatcher: Dispatcher, recorder: Arc<dyn PostRecorder>, event_bus: EventBus) -> Self {
        Self {
            dispatcher,
            recorder,
            event_bus,
        }
    }

    /// Publish a draft to every requested target
    ///
    /// Per-target failures are reported in the response, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns `CrosscastError::InvalidInput` when no target is selected.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishResponse> {
        if request.targets.is_empty() {
            return Err(CrosscastError::InvalidInput(
                "No targets selected".to_string(),
            ));
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let user_id = self.dispatcher.registry().user_id();

        self.event_bus.emit(Event::PublishStarted {
            request_id: request_id.clone(),
            targets: request.targets.iter().map(Target::to_string).collect(),
        });
        info!(
            request = %request_id,
            targets = request.targets.len(),
            "Publishing draft"
        );

        let outcomes = self
            .dispatcher
            .dispatch(&request.draft, &request.targets)
            .await;
        let aggregate = aggregate(&outcomes);

        for report in &aggregate.reports {
            self.event_bus.emit(Event::TargetReported {
                request_id: request_id.clone(),
                report: report.clone(),
            });
        }

        match &aggregate.summary {
            Some(summary) => {
                info!(request = %request_id, "{}", summary);
                self.event_bus.emit(Event::PublishCompleted {
                    request_id: request_id.clone(),
                    summary: summary.clone(),
                });
            }
            None => {
                warn!(request = %request_id, "All targets failed");
                self.event_bus.emit(Event::PublishFailed {
                    request_id: request_id.clone(),
                    error: "All targets failed".to_string(),
                });
            }
        }

        let persistence = self.spawn_records(&request_id, &user_id, &request.draft, &outcomes);

        Ok(PublishResponse {
            request_id,
            outcomes,
            aggregate,
            persistence,
        })
    }

    /// Write one record per success on a background task
    fn spawn_records(
        &self,
        request_id: &str,
        user_id: &str,
        draft: &Draft,
        outcomes: &[PublishOutcome],
    ) -> PersistenceHandle {
        let records = records_for(user_id, draft, outcomes);
        let targets: Vec<Target> = records
            .iter()
            .map(|r| Target::new(r.platform, r.account_id.clone()))
            .collect();

        let recorder = Arc::clone(&self.recorder);
        let event_bus = self.event_bus.clone();
        let request_id = request_id.to_string();

        let task = tokio::spawn(async move {
            let writes = records.iter().map(|record| {
                let recorder = Arc::clone(&recorder);
                async move { recorder.record(record).await }
            });
            let results = join_all(writes).await;

            records
                .iter()
                .zip(results)
                .map(|(record, result)| {
                    let target = Target::new(record.platform, record.account_id.clone());
                    let status = match result {
                        Ok(()) => RecordStatus::Recorded,
                        Err(e) => {
                            warn!(
                                platform = %record.platform,
                                account = %record.account_id,
                                error = %e,
                                "Failed to record published post"
                            );
                            event_bus.emit(Event::RecordFailed {
                                request_id: request_id.clone(),
                                platform: record.platform,
                                account_id: record.account_id.clone(),
                                error: e.to_string(),
                            });
                            RecordStatus::PersistenceFailed(e.to_string())
                        }
                    };
                    (target, status)
                })
                .collect()
        });

        PersistenceHandle { targets, task }
    }
}
