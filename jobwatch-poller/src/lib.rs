//! Jobwatch Poller
//!
//! Tracks an asynchronous report job from submission to a terminal state.
//!
//! Architecture:
//! - Configuration: backend location, poll cadence and optional bounds
//! - Submission: one request that either finishes the job or yields a handle
//! - Scheduler: fixed-interval status loop and the public `JobPoller`
//! - State machine: the lifecycle every caller observes
//!
//! Failures never surface as errors from the poller. They end up in
//! [`JobState::Failed`], except for transient status-check errors, which are
//! logged and otherwise ignored.

pub mod config;
mod machine;
pub mod scheduler;
mod submission;

pub use config::Config;
pub use jobwatch_core::domain::job::JobState;
pub use scheduler::{JobPoller, PollBound};
