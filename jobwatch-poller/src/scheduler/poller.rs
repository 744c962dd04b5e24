//! Job poller
//!
//! Public entry point of the crate. A `JobPoller` owns one state machine
//! and at most one running lifecycle task. Submitting while a lifecycle is
//! still running abandons it first, so two loops never write the same state.

use jobwatch_client::JobBackend;
use jobwatch_core::domain::job::JobState;
use jobwatch_core::domain::request::JobRequest;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_POLL_INTERVAL};
use crate::machine::StateMachine;
use crate::scheduler::poll_loop::{PollBound, PollLoop};
use crate::submission::{Submission, submit_job};

/// Running lifecycle task and the means to stop it
struct ActiveLifecycle {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveLifecycle {
    fn stop(self) {
        self.token.cancel();
        self.task.abort();
    }
}

/// Settings copied into each lifecycle task
#[derive(Debug, Clone)]
struct LifecycleSettings {
    interval: Duration,
    initial_status: String,
    bound: PollBound,
}

/// Submits jobs and tracks them to completion
///
/// All outcomes, including transport errors, are reported through
/// [`JobState`]; no method returns an error.
///
/// # Example
/// ```no_run
/// use jobwatch_core::domain::request::JobRequest;
/// use jobwatch_poller::{Config, JobPoller};
///
/// # async fn example() -> anyhow::Result<()> {
/// let poller = JobPoller::from_config(&Config::new("http://localhost:3000".to_string()))?;
/// poller.on_state_change(|state| println!("report job: {}", state));
///
/// poller.submit(JobRequest::new().with_param("status", "pending"));
/// let outcome = poller.wait_for_terminal().await;
/// # Ok(())
/// # }
/// ```
pub struct JobPoller {
    backend: Arc<dyn JobBackend>,
    machine: Arc<StateMachine>,
    settings: LifecycleSettings,
    active: Mutex<Option<ActiveLifecycle>>,
}

impl JobPoller {
    /// Creates a poller over any backend
    ///
    /// A zero `poll_interval` is replaced by the default interval.
    pub fn new(backend: Arc<dyn JobBackend>, config: &Config) -> Self {
        let interval = if config.poll_interval.is_zero() {
            warn!(
                "Poll interval must be greater than 0, using {:?}",
                DEFAULT_POLL_INTERVAL
            );
            DEFAULT_POLL_INTERVAL
        } else {
            config.poll_interval
        };

        Self {
            backend,
            machine: Arc::new(StateMachine::new()),
            settings: LifecycleSettings {
                interval,
                initial_status: config.initial_status.clone(),
                bound: PollBound::from_config(config),
            },
            active: Mutex::new(None),
        }
    }

    /// Creates a poller talking HTTP to the backend described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let client = config.build_client()?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.machine.state()
    }

    /// Registers a callback invoked with the new state after every transition
    ///
    /// The callback may call `submit` or `cancel` on this poller.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(&JobState) + Send + Sync + 'static,
    {
        self.machine.on_state_change(Arc::new(callback));
    }

    /// Receiver for async observers
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.machine.subscribe()
    }

    /// Starts a new lifecycle for `request`
    ///
    /// Any lifecycle still running is cancelled first. The state is
    /// `Submitting` when this returns, unless a callback has already moved
    /// it on.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: JobRequest) {
        let generation = self.machine.begin();
        let token = CancellationToken::new();

        info!("Starting job lifecycle {}", generation);

        let task = tokio::spawn(run_lifecycle(
            Arc::clone(&self.backend),
            Arc::clone(&self.machine),
            self.settings.clone(),
            generation,
            token.clone(),
            request,
        ));

        let lifecycle = ActiveLifecycle {
            generation,
            token,
            task,
        };

        // A concurrent submit may already have installed a newer lifecycle,
        // or a callback may have cancelled this one before it was installed
        let superseded = {
            let mut active = self.lock_active();
            let newer_installed = active
                .as_ref()
                .is_some_and(|current| current.generation > generation);
            if newer_installed || !self.machine.is_current(generation) {
                Some(lifecycle)
            } else {
                active.replace(lifecycle)
            }
        };

        if let Some(previous) = superseded {
            debug!("Abandoning lifecycle {}", previous.generation);
            previous.stop();
        }
    }

    /// Stops polling a pending job
    ///
    /// No-op unless the current state is `Pending`. Returns whether the job
    /// was cancelled.
    pub fn cancel(&self) -> bool {
        let Some(retired) = self.machine.cancel() else {
            debug!("Nothing to cancel in state {}", self.machine.state().name());
            return false;
        };

        let lifecycle = {
            let mut active = self.lock_active();
            if active.as_ref().is_some_and(|l| l.generation == retired) {
                active.take()
            } else {
                None
            }
        };

        if let Some(lifecycle) = lifecycle {
            info!("Cancelled job lifecycle {}", lifecycle.generation);
            lifecycle.stop();
        }

        true
    }

    /// Waits until the current lifecycle reaches a terminal state
    ///
    /// Returns immediately if the state is already terminal. Waits forever
    /// when called before any submission.
    pub async fn wait_for_terminal(&self) -> JobState {
        let mut receiver = self.machine.subscribe();
        let waited = receiver
            .wait_for(|state| state.is_terminal())
            .await
            .map(|state| state.clone());

        match waited {
            Ok(state) => state,
            Err(_) => self.machine.state(),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveLifecycle>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        if let Some(lifecycle) = self.lock_active().take() {
            lifecycle.stop();
        }
    }
}

/// One lifecycle: submit, then poll while pending
async fn run_lifecycle(
    backend: Arc<dyn JobBackend>,
    machine: Arc<StateMachine>,
    settings: LifecycleSettings,
    generation: u64,
    token: CancellationToken,
    request: JobRequest,
) {
    let submission = tokio::select! {
        _ = token.cancelled() => return,
        submission = submit_job(backend.as_ref(), request) => submission,
    };

    let handle = match submission {
        Submission::Finished(state) => {
            machine.apply(generation, state);
            return;
        }
        Submission::Accepted(handle) => handle,
    };

    let pending = JobState::Pending {
        job_id: handle.job_id.clone(),
        last_known_status: settings.initial_status,
    };
    if !machine.apply(generation, pending) {
        return;
    }

    PollLoop {
        backend,
        machine,
        generation,
        interval: settings.interval,
        bound: settings.bound,
    }
    .run(handle, token)
    .await;
}
