//! Status polling loop
//!
//! Checks a pending job once per interval until the backend reports a
//! terminal status, the lifecycle is cancelled, or an optional bound runs
//! out. Only one status request is ever in flight; a slow response delays
//! the next tick instead of stacking requests.

use jobwatch_client::JobBackend;
use jobwatch_core::domain::job::{JobHandle, JobState};
use jobwatch_core::domain::status::RemoteStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::machine::StateMachine;

/// Optional limits on how long a job is polled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollBound {
    pub max_attempts: Option<u32>,
    pub max_wait: Option<Duration>,
}

impl PollBound {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            max_wait: config.max_wait,
        }
    }

    /// Reason to give up on `handle`, if a limit has been reached
    pub fn check(&self, handle: &JobHandle, attempts: u32, elapsed: Duration) -> Option<String> {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return Some(format!(
                "job {} did not finish after {} status checks",
                handle, attempts
            ));
        }

        if let Some(max_wait) = self.max_wait.filter(|max_wait| elapsed >= *max_wait) {
            return Some(format!(
                "job {} did not finish within {}s",
                handle,
                max_wait.as_secs_f64()
            ));
        }

        None
    }
}

/// Poll loop of a single lifecycle
pub(crate) struct PollLoop {
    pub backend: Arc<dyn JobBackend>,
    pub machine: Arc<StateMachine>,
    pub generation: u64,
    pub interval: Duration,
    pub bound: PollBound,
}

impl PollLoop {
    /// Polls `handle` until a terminal state or cancellation
    ///
    /// The first check happens one interval after the call.
    pub async fn run(self, handle: JobHandle, token: CancellationToken) {
        let started = Instant::now();
        let mut ticker = time::interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts: u32 = 0;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Polling of job {} cancelled", handle);
                    return;
                }
                _ = ticker.tick() => {}
            }

            attempts = attempts.saturating_add(1);
            debug!("Checking status of job {} (attempt {})", handle, attempts);

            let response = tokio::select! {
                _ = token.cancelled() => {
                    debug!("Dropping in-flight status check of job {}", handle);
                    return;
                }
                response = self.backend.check_status(&handle) => response,
            };

            match response {
                Ok(RemoteStatus::Completed(result)) => {
                    info!("Job {} completed", handle);
                    self.machine
                        .apply(self.generation, JobState::Completed { result });
                    return;
                }
                Ok(RemoteStatus::Failed(error_message)) => {
                    info!("Job {} failed: {}", handle, error_message);
                    self.machine
                        .apply(self.generation, JobState::Failed { error_message });
                    return;
                }
                Ok(RemoteStatus::Running(label)) => {
                    debug!("Job {} still {}", handle, label);
                    let applied = self.machine.apply(
                        self.generation,
                        JobState::Pending {
                            job_id: handle.job_id.clone(),
                            last_known_status: label,
                        },
                    );
                    if !applied {
                        return;
                    }
                }
                Err(e) if e.is_server_error() => {
                    warn!("Backend error while checking job {}: {}", handle, e);
                }
                Err(e) => {
                    warn!("Status check for job {} failed: {}", handle, e);
                }
            }

            if let Some(reason) = self.bound.check(&handle, attempts, started.elapsed()) {
                warn!("Giving up on job {}: {}", handle, reason);
                self.machine.apply(
                    self.generation,
                    JobState::Failed {
                        error_message: reason,
                    },
                );
                return;
            }
        }
    }
}
