//! Job status and outcome types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of row errors included in anything reported outside the worker
pub const REPORTED_ERROR_LIMIT: usize = 5;

/// Ingestion status of one job
///
/// Serialized with the backend's vocabulary, where a queued job is `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(rename = "pending", alias = "queued")]
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Statuses only move forward: queued -> running -> completed | failed.
    /// A queued job may also fail without ever running.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pipeline run
///
/// `errors` holds every row failure. Use [`JobSummary::reported`] for anything
/// leaving the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub record_count: u64,
    pub errors: Vec<String>,
}

impl JobSummary {
    pub fn record_success(&mut self) {
        self.record_count += 1;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// The externally visible summary, errors capped at [`REPORTED_ERROR_LIMIT`]
    pub fn reported(&self) -> ReportedSummary {
        ReportedSummary {
            record_count: Some(self.record_count),
            errors: self
                .errors
                .iter()
                .take(REPORTED_ERROR_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

/// Summary payload sent to the backend with status updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,
    pub errors: Vec<String>,
}

impl ReportedSummary {
    /// Summary for a job that failed as a whole
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            record_count: None,
            errors: vec![message.into()],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_transitions_are_forward_only() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Failed));

        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Queued));
        for terminal in [JobStatus::Completed, JobStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                JobStatus::Queued,
                JobStatus::Running,
                JobStatus::Completed,
                JobStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(JobStatus::Queued).unwrap(), json!("pending"));
        assert_eq!(serde_json::to_value(JobStatus::Running).unwrap(), json!("running"));
        let parsed: JobStatus = serde_json::from_value(json!("queued")).unwrap();
        assert_eq!(parsed, JobStatus::Queued);
    }

    #[test]
    fn test_reported_summary_caps_errors() {
        let mut summary = JobSummary::default();
        for i in 0..8 {
            summary.record_error(format!("error {}", i));
        }
        summary.record_success();
        summary.record_success();

        let reported = summary.reported();
        assert_eq!(summary.error_count(), 8);
        assert_eq!(reported.errors.len(), REPORTED_ERROR_LIMIT);
        assert_eq!(reported.errors[0], "error 0");
        assert_eq!(reported.record_count, Some(2));
    }

    #[test]
    fn test_reported_summary_serialization() {
        let mut summary = JobSummary::default();
        summary.record_success();
        assert_eq!(
            serde_json::to_value(summary.reported()).unwrap(),
            json!({ "recordCount": 1, "errors": [] })
        );
        assert_eq!(
            serde_json::to_value(ReportedSummary::failure("Unsupported format: csv")).unwrap(),
            json!({ "errors": ["Unsupported format: csv"] })
        );
    }
}
