//! Scheduler layer
//!
//! Drives a job from submission to a terminal state: one submission call,
//! then a fixed-interval status loop while the job is pending. The state
//! itself lives in the state machine; the scheduler only feeds it.

mod poll_loop;
pub mod poller;

pub use poll_loop::PollBound;
pub use poller::JobPoller;
