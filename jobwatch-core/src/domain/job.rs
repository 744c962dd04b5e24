//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a job accepted by the remote side
///
/// Created from the backend's acceptance response, never generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.job_id)
    }
}

/// Lifecycle state of a submitted job
///
/// Exactly one variant is active at a time, so a result, an error message
/// and a job id can never be observed together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Submission request in flight
    Submitting,
    /// Accepted by the backend, waiting for a terminal status
    Pending {
        job_id: String,
        /// Display-only label reported by the backend (e.g. "processing")
        last_known_status: String,
    },
    Completed {
        result: serde_json::Value,
    },
    Failed {
        error_message: String,
    },
    /// Polling stopped by the caller before the job finished
    Cancelled,
}

impl JobState {
    /// Returns true for `Completed`, `Failed` and `Cancelled`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed { .. } | JobState::Failed { .. } | JobState::Cancelled
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, JobState::Pending { .. })
    }

    /// Job id of a pending job
    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobState::Pending { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Submitting => "submitting",
            JobState::Pending { .. } => "pending",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    /// Whether the lifecycle graph allows moving from `self` to `next`
    ///
    /// `Submitting` is reachable from every state because a new submission
    /// always starts a fresh lifecycle. A pending job may be re-entered with
    /// an updated status label; any other move out of a terminal state is
    /// rejected.
    pub fn can_transition_to(&self, next: &JobState) -> bool {
        use JobState::*;

        match (self, next) {
            (_, Submitting) => true,
            (Submitting, Pending { .. } | Completed { .. } | Failed { .. }) => true,
            (Pending { job_id: current, .. }, Pending { job_id: updated, .. }) => {
                current == updated
            }
            (Pending { .. }, Completed { .. } | Failed { .. } | Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending {
                job_id,
                last_known_status,
            } => write!(f, "pending ({}: {})", job_id, last_known_status),
            JobState::Failed { error_message } => write!(f, "failed: {}", error_message),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending(job_id: &str, status: &str) -> JobState {
        JobState::Pending {
            job_id: job_id.to_string(),
            last_known_status: status.to_string(),
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::Submitting.is_terminal());
        assert!(!pending("job-1", "queued").is_terminal());
        assert!(JobState::Completed { result: json!(1) }.is_terminal());
        assert!(
            JobState::Failed {
                error_message: "boom".to_string()
            }
            .is_terminal()
        );
        assert!(JobState::Cancelled.is_terminal());
    }

    #[test]
    fn test_job_id_only_when_pending() {
        assert_eq!(pending("job-1", "queued").job_id(), Some("job-1"));
        assert_eq!(JobState::Submitting.job_id(), None);
        assert_eq!(JobState::Cancelled.job_id(), None);
    }

    #[test]
    fn test_terminal_never_returns_to_pending() {
        let terminals = [
            JobState::Completed { result: json!({}) },
            JobState::Failed {
                error_message: "x".to_string(),
            },
            JobState::Cancelled,
        ];

        for state in terminals {
            assert!(!state.can_transition_to(&pending("job-1", "processing")));
            assert!(!state.can_transition_to(&JobState::Cancelled));
            assert!(state.can_transition_to(&JobState::Submitting));
        }
    }

    #[test]
    fn test_lifecycle_transitions() {
        assert!(JobState::Idle.can_transition_to(&JobState::Submitting));
        assert!(!JobState::Idle.can_transition_to(&pending("job-1", "queued")));
        assert!(JobState::Submitting.can_transition_to(&pending("job-1", "queued")));
        assert!(!JobState::Submitting.can_transition_to(&JobState::Cancelled));
        assert!(pending("job-1", "queued").can_transition_to(&pending("job-1", "processing")));
        assert!(!pending("job-1", "queued").can_transition_to(&pending("job-2", "queued")));
        assert!(pending("job-1", "queued").can_transition_to(&JobState::Cancelled));
    }

    #[test]
    fn test_state_serialization_is_tagged() {
        let value = serde_json::to_value(pending("job-7", "processing")).unwrap();
        assert_eq!(
            value,
            json!({"state": "pending", "job_id": "job-7", "last_known_status": "processing"})
        );

        let value = serde_json::to_value(JobState::Cancelled).unwrap();
        assert_eq!(value, json!({"state": "cancelled"}));
    }

    #[test]
    fn test_display() {
        assert_eq!(pending("job-1", "queued").to_string(), "pending (job-1: queued)");
        assert_eq!(JobState::Idle.to_string(), "idle");
    }
}
