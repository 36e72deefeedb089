//! Event system for publish progress
//!
//! An in-process event bus distributing publish events to subscribers (CLI
//! output, UI toasts) without blocking the publish itself.
//!
//! # Architecture
//!
//! The bus uses `tokio::sync::broadcast` for multi-subscriber support. If no
//! subscribers exist, events are dropped immediately. Subscribers can lag
//! without blocking emitters.
//!
//! # Example
//!
//! ```no_run
//! use libcrosscast::service::events::{EventBus, Event};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::PublishStarted {
//!     request_id: "abc123".to_string(),
//!     targets: vec!["twitter:acct-1".to_string()],
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::report::TargetReport;
use crate::types::Platform;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast bus for publish events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus
    ///
    /// `capacity` is how many events each subscriber may buffer before the
    /// oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers. Never blocks or fails.
    pub fn emit(&self, event: Event) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Events emitted while a publish request runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Dispatch is about to begin
    PublishStarted {
        request_id: String,
        /// Targets as `platform:account_id`
        targets: Vec<String>,
    },

    /// Final result for one target
    TargetReported {
        request_id: String,
        report: TargetReport,
    },

    /// At least one target succeeded
    PublishCompleted {
        request_id: String,
        summary: String,
    },

    /// Every target failed
    PublishFailed { request_id: String, error: String },

    /// A published target could not be recorded. Its published status stands.
    RecordFailed {
        request_id: String,
        platform: Platform,
        account_id: String,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutcomeStatus;

    fn report() -> TargetReport {
        TargetReport {
            platform: Platform::Twitter,
            account_id: "t1".to_string(),
            status: OutcomeStatus::Success,
            message: "Published to Twitter".to_string(),
            post_id: Some("123".to_string()),
            url: None,
        }
    }

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::PublishStarted {
            request_id: "req-1".to_string(),
            targets: vec!["twitter:t1".to_string()],
        });

        match receiver.recv().await.unwrap() {
            Event::PublishStarted {
                request_id,
                targets,
            } => {
                assert_eq!(request_id, "req-1");
                assert_eq!(targets, vec!["twitter:t1"]);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        let event = Event::TargetReported {
            request_id: "req-2".to_string(),
            report: report(),
        };
        event_bus.emit(event.clone());

        assert_eq!(receiver1.recv().await.unwrap(), event);
        assert_eq!(receiver2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let event_bus = EventBus::new(10);

        // Must not panic or block
        event_bus.emit(Event::PublishFailed {
            request_id: "req-3".to_string(),
            error: "All targets failed".to_string(),
        });

        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::RecordFailed {
            request_id: "req-4".to_string(),
            platform: Platform::YouTube,
            account_id: "y1".to_string(),
            error: "disk full".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"record_failed\""));
        assert!(json.contains("\"platform\":\"youtube\""));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_target_reported_serialization() {
        let event = Event::TargetReported {
            request_id: "req-5".to_string(),
            report: report(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "target_reported");
        assert_eq!(json["report"]["status"], "success");
        assert_eq!(json["report"]["post_id"], "123");
    }

    #[tokio::test]
    async fn test_subscriber_count() {
        let event_bus = EventBus::new(10);
        assert_eq!(event_bus.subscriber_count(), 0);

        let _receiver1 = event_bus.subscribe();
        let _receiver2 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);
    }
}
