//! Job submission
//!
//! Performs the single submission request of a lifecycle and turns its
//! outcome into either a finished state or a handle to poll. Errors never
//! escape: a failed request becomes `JobState::Failed`.

use jobwatch_client::{JobBackend, SubmitOutcome};
use jobwatch_core::domain::job::{JobHandle, JobState};
use jobwatch_core::domain::request::JobRequest;
use tracing::{info, warn};

/// What a submission produced
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The job ended without polling (synchronous result or error)
    Finished(JobState),
    /// The job was accepted and must be polled
    Accepted(JobHandle),
}

/// Submits a job, consuming the request
pub async fn submit_job(backend: &dyn JobBackend, request: JobRequest) -> Submission {
    match backend.submit(request).await {
        Ok(SubmitOutcome::Completed(result)) => {
            info!("Job completed synchronously");
            Submission::Finished(JobState::Completed { result })
        }
        Ok(SubmitOutcome::Accepted(handle)) => {
            info!("Job accepted as {}", handle);
            Submission::Accepted(handle)
        }
        Err(e) => {
            warn!("Job submission failed: {}", e);
            Submission::Finished(JobState::Failed {
                error_message: e.failure_message(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jobwatch_client::{ClientError, Result};
    use jobwatch_core::domain::status::RemoteStatus;
    use serde_json::json;
    use std::sync::Mutex;

    struct OneShotBackend {
        outcome: Mutex<Option<Result<SubmitOutcome>>>,
        seen: Mutex<Option<JobRequest>>,
    }

    impl OneShotBackend {
        fn new(outcome: Result<SubmitOutcome>) -> Self {
            Self {
                outcome: Mutex::new(Some(outcome)),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl JobBackend for OneShotBackend {
        async fn submit(&self, request: JobRequest) -> Result<SubmitOutcome> {
            *self.seen.lock().unwrap() = Some(request);
            self.outcome
                .lock()
                .unwrap()
                .take()
                .expect("submit called more than once")
        }

        async fn check_status(&self, _handle: &JobHandle) -> Result<RemoteStatus> {
            panic!("submission must not check status");
        }
    }

    #[tokio::test]
    async fn test_sync_success() {
        let backend = OneShotBackend::new(Ok(SubmitOutcome::Completed(json!({"count": 42}))));
        let request = JobRequest::new().with_param("status", "pending");

        let submission = submit_job(&backend, request.clone()).await;

        assert_eq!(
            submission,
            Submission::Finished(JobState::Completed {
                result: json!({"count": 42})
            })
        );
        assert_eq!(backend.seen.lock().unwrap().as_ref(), Some(&request));
    }

    #[tokio::test]
    async fn test_accepted() {
        let backend = OneShotBackend::new(Ok(SubmitOutcome::Accepted(JobHandle::new("job-1"))));
        let submission = submit_job(&backend, JobRequest::new()).await;
        assert_eq!(submission, Submission::Accepted(JobHandle::new("job-1")));
    }

    #[tokio::test]
    async fn test_api_error_becomes_failed() {
        let backend = OneShotBackend::new(Err(ClientError::api_error(422, "invalid date range")));
        let submission = submit_job(&backend, JobRequest::new()).await;
        assert_eq!(
            submission,
            Submission::Finished(JobState::Failed {
                error_message: "invalid date range".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_parse_error_becomes_failed() {
        let backend = OneShotBackend::new(Err(ClientError::ParseError("bad json".to_string())));
        match submit_job(&backend, JobRequest::new()).await {
            Submission::Finished(JobState::Failed { error_message }) => {
                assert!(error_message.contains("bad json"));
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }
}
