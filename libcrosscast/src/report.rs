//! Fan-in of publish outcomes into user-facing reports

use serde::{Deserialize, Serialize};

use crate::types::{OutcomeStatus, Platform, PublishOutcome};

/// Result line for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub platform: Platform,
    pub account_id: String,
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TargetReport {
    fn from_outcome(outcome: &PublishOutcome) -> Self {
        let target = &outcome.target;
        let external = outcome.external_ref();

        let message = match outcome.reason() {
            Some(reason) => reason,
            None => format!("Published to {}", target.platform.display_name()),
        };

        Self {
            platform: target.platform,
            account_id: target.account_id.clone(),
            status: outcome.status(),
            message,
            post_id: external.map(|r| r.id.clone()),
            url: external.and_then(|r| r.url.clone()),
        }
    }
}

/// Everything the caller needs to present a finished publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub any_success: bool,
    pub reports: Vec<TargetReport>,
    /// Only present when at least one target succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Aggregate {
    /// The draft is cleared once anything went out
    pub fn should_reset_draft(&self) -> bool {
        self.any_success
    }

    pub fn success_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == OutcomeStatus::Success)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetReport> {
        self.reports
            .iter()
            .filter(|r| r.status != OutcomeStatus::Success)
    }
}

/// Build reports ordered by platform then account id, so the result does
/// not depend on which target finished first
pub fn aggregate(outcomes: &[PublishOutcome]) -> Aggregate {
    let mut reports: Vec<TargetReport> = outcomes.iter().map(TargetReport::from_outcome).collect();
    reports.sort_by(|a, b| (a.platform, &a.account_id).cmp(&(b.platform, &b.account_id)));

    let successes = reports
        .iter()
        .filter(|r| r.status == OutcomeStatus::Success)
        .count();
    let any_success = successes > 0;

    let summary = any_success.then(|| {
        format!(
            "Published to {} of {} target{}",
            successes,
            reports.len(),
            if reports.len() == 1 { "" } else { "s" }
        )
    });

    Aggregate {
        any_success,
        reports,
        summary,
    }
}
