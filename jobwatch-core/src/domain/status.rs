//! Remote job status classification
//!
//! The backend reports status as a free-form string. Only two values are
//! terminal; everything else, including labels this client has never seen,
//! means the job is still running.

use crate::dto::job::StatusResponse;

/// Status label for a successfully finished job
pub const STATUS_COMPLETED: &str = "completed";

/// Status label for a job that finished unsuccessfully
pub const STATUS_FAILED: &str = "failed";

/// Message used when a failed job carries no error text
pub const DEFAULT_FAILURE_MESSAGE: &str = "Job failed";

/// Status of a job as reported by one status check
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteStatus {
    Completed(serde_json::Value),
    Failed(String),
    /// Any non-terminal label, passed through for display
    Running(String),
}

impl From<StatusResponse> for RemoteStatus {
    fn from(response: StatusResponse) -> Self {
        match response.status.as_str() {
            STATUS_COMPLETED => {
                RemoteStatus::Completed(response.data.unwrap_or(serde_json::Value::Null))
            }
            STATUS_FAILED => RemoteStatus::Failed(
                response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            ),
            _ => RemoteStatus::Running(response.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: &str, data: Option<serde_json::Value>, error: Option<&str>) -> StatusResponse {
        StatusResponse {
            status: status.to_string(),
            data,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_completed_carries_data() {
        let status = RemoteStatus::from(response("completed", Some(json!({"count": 9001})), None));
        assert_eq!(status, RemoteStatus::Completed(json!({"count": 9001})));
    }

    #[test]
    fn test_completed_without_data_is_null() {
        let status = RemoteStatus::from(response("completed", None, None));
        assert_eq!(status, RemoteStatus::Completed(serde_json::Value::Null));
    }

    #[test]
    fn test_failed_carries_error() {
        let status = RemoteStatus::from(response("failed", None, Some("timeout in aggregation")));
        assert_eq!(status, RemoteStatus::Failed("timeout in aggregation".to_string()));
    }

    #[test]
    fn test_failed_without_error_uses_default() {
        let status = RemoteStatus::from(response("failed", None, Some("")));
        assert_eq!(status, RemoteStatus::Failed(DEFAULT_FAILURE_MESSAGE.to_string()));
    }

    #[test]
    fn test_unknown_status_is_running() {
        for label in ["processing", "queued", "reticulating", "COMPLETED", ""] {
            let status = RemoteStatus::from(response(label, None, None));
            assert_eq!(status, RemoteStatus::Running(label.to_string()));
        }
    }
}
