//! Backend seam used by the poller
//!
//! The poller only needs two operations from the job-processing backend.
//! Keeping them behind a trait lets the poller run against the HTTP client
//! in production and against scripted backends in tests.

use async_trait::async_trait;
use jobwatch_core::domain::job::JobHandle;
use jobwatch_core::domain::request::JobRequest;
use jobwatch_core::domain::status::RemoteStatus;

use crate::error::Result;

/// Successful outcome of a submission call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend answered synchronously with the final result
    Completed(serde_json::Value),
    /// The backend accepted the job for asynchronous processing
    Accepted(JobHandle),
}

/// Operations consumed from the job-processing backend
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submits a job
    ///
    /// Performs exactly one request. An error response from the backend is
    /// returned as `Err`.
    async fn submit(&self, request: JobRequest) -> Result<SubmitOutcome>;

    /// Checks the status of an accepted job once
    async fn check_status(&self, handle: &JobHandle) -> Result<RemoteStatus>;
}
