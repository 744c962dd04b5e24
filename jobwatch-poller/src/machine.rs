//! Job state machine
//!
//! Single source of truth for the lifecycle of the current job. Every
//! lifecycle started by a submission gets a generation number; writes are
//! only accepted from the current generation, so a response that arrives
//! after its lifecycle was cancelled or superseded is dropped instead of
//! applied.

use jobwatch_core::domain::job::JobState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// Callback invoked after every transition
pub type Observer = Arc<dyn Fn(&JobState) + Send + Sync>;

struct Inner {
    generation: u64,
    state: JobState,
    observers: Vec<Observer>,
    /// Transitions not yet handed to the observers, oldest first
    undelivered: VecDeque<JobState>,
    /// Set while some thread is draining `undelivered`
    delivering: bool,
}

/// Lifecycle state holder with generation-checked writes
pub struct StateMachine {
    inner: Mutex<Inner>,
    sender: watch::Sender<JobState>,
}

impl StateMachine {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(JobState::Idle);
        Self {
            inner: Mutex::new(Inner {
                generation: 0,
                state: JobState::Idle,
                observers: Vec::new(),
                undelivered: VecDeque::new(),
                delivering: false,
            }),
            sender,
        }
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.sender.borrow().clone()
    }

    /// Receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.sender.subscribe()
    }

    /// Registers a callback run after every transition
    ///
    /// Callbacks run after the state lock is released, one transition at a
    /// time and in transition order. A callback may start or cancel a
    /// lifecycle; the transitions it causes are delivered once it returns.
    pub fn on_state_change(&self, observer: Observer) {
        self.lock().observers.push(observer);
    }

    /// Starts a new lifecycle and returns its generation
    ///
    /// Always moves to `Submitting`, whatever the previous state was.
    pub fn begin(&self) -> u64 {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            self.publish(&mut inner, JobState::Submitting);
            inner.generation
        };

        self.deliver();
        generation
    }

    /// Whether `generation` is the lifecycle currently allowed to write
    pub fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Applies a transition on behalf of lifecycle `generation`
    ///
    /// Returns false when the lifecycle is no longer current or the move is
    /// not part of the lifecycle graph. Re-applying the current state is
    /// accepted without notifying observers.
    pub fn apply(&self, generation: u64, next: JobState) -> bool {
        {
            let mut inner = self.lock();

            if inner.generation != generation {
                debug!(
                    "Discarding {} from superseded lifecycle {} (current {})",
                    next.name(),
                    generation,
                    inner.generation
                );
                return false;
            }

            if inner.state == next {
                return true;
            }

            if !inner.state.can_transition_to(&next) {
                debug!(
                    "Rejecting transition {} -> {}",
                    inner.state.name(),
                    next.name()
                );
                return false;
            }

            self.publish(&mut inner, next);
        }

        self.deliver();
        true
    }

    /// Cancels the current lifecycle if it is pending
    ///
    /// Retires the generation so that late responses are discarded, and
    /// returns the retired generation. Returns `None` (and changes nothing)
    /// in any other state.
    pub fn cancel(&self) -> Option<u64> {
        let retired = {
            let mut inner = self.lock();

            if !inner.state.is_pending() {
                return None;
            }

            let retired = inner.generation;
            inner.generation += 1;
            self.publish(&mut inner, JobState::Cancelled);
            retired
        };

        self.deliver();
        Some(retired)
    }

    /// Records a transition; observers are notified by `deliver`
    fn publish(&self, inner: &mut Inner, next: JobState) {
        debug!("Job state {} -> {}", inner.state.name(), next.name());
        inner.state = next;
        self.sender.send_replace(inner.state.clone());
        inner.undelivered.push_back(inner.state.clone());
    }

    /// Hands queued transitions to the observers without holding the lock
    ///
    /// Only one thread drains the queue at a time. A transition published
    /// while another thread is delivering, including one caused by a
    /// callback, is picked up by that thread after its current callback.
    fn deliver(&self) {
        {
            let mut inner = self.lock();
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }

        let _reset = DeliveryReset(self);

        loop {
            let (state, observers) = {
                let mut inner = self.lock();
                match inner.undelivered.pop_front() {
                    Some(state) => (state, inner.observers.clone()),
                    None => {
                        inner.delivering = false;
                        return;
                    }
                }
            };

            for observer in &observers {
                observer(&state);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the delivery flag when an observer panics
struct DeliveryReset<'a>(&'a StateMachine);

impl Drop for DeliveryReset<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().delivering = false;
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
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

    fn recorder(machine: &StateMachine) -> Arc<Mutex<Vec<JobState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        machine.on_state_change(Arc::new(move |state: &JobState| {
            sink.lock().unwrap().push(state.clone());
        }));
        seen
    }

    #[test]
    fn test_starts_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.state(), JobState::Idle);
    }

    #[test]
    fn test_full_lifecycle_notifies_each_transition() {
        let machine = StateMachine::new();
        let seen = recorder(&machine);

        let generation = machine.begin();
        assert!(machine.apply(generation, pending("job-1", "queued")));
        assert!(machine.apply(generation, pending("job-1", "processing")));
        assert!(machine.apply(generation, JobState::Completed { result: json!(9001) }));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                JobState::Submitting,
                pending("job-1", "queued"),
                pending("job-1", "processing"),
                JobState::Completed { result: json!(9001) },
            ]
        );
    }

    #[test]
    fn test_repeated_state_is_not_renotified() {
        let machine = StateMachine::new();
        let generation = machine.begin();
        machine.apply(generation, pending("job-1", "processing"));

        let seen = recorder(&machine);
        assert!(machine.apply(generation, pending("job-1", "processing")));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let machine = StateMachine::new();
        let old = machine.begin();
        let current = machine.begin();
        assert_ne!(old, current);

        assert!(!machine.apply(old, JobState::Completed { result: json!(1) }));
        assert_eq!(machine.state(), JobState::Submitting);
        assert!(!machine.is_current(old));
        assert!(machine.is_current(current));
    }

    #[test]
    fn test_cancel_only_when_pending() {
        let machine = StateMachine::new();
        assert_eq!(machine.cancel(), None);

        let generation = machine.begin();
        assert_eq!(machine.cancel(), None);
        assert_eq!(machine.state(), JobState::Submitting);

        machine.apply(generation, pending("job-3", "queued"));
        assert_eq!(machine.cancel(), Some(generation));
        assert_eq!(machine.state(), JobState::Cancelled);

        assert_eq!(machine.cancel(), None);
    }

    #[test]
    fn test_cancel_discards_late_completion() {
        let machine = StateMachine::new();
        let generation = machine.begin();
        machine.apply(generation, pending("job-3", "queued"));
        machine.cancel();

        assert!(!machine.apply(generation, JobState::Completed { result: json!({}) }));
        assert_eq!(machine.state(), JobState::Cancelled);
    }

    #[test]
    fn test_terminal_state_rejects_pending() {
        let machine = StateMachine::new();
        let generation = machine.begin();
        machine.apply(
            generation,
            JobState::Failed {
                error_message: "boom".to_string(),
            },
        );

        assert!(!machine.apply(generation, pending("job-1", "processing")));
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn test_subscribe_sees_latest_state() {
        let machine = StateMachine::new();
        let receiver = machine.subscribe();

        let generation = machine.begin();
        machine.apply(generation, pending("job-1", "queued"));

        assert_eq!(*receiver.borrow(), pending("job-1", "queued"));
    }

    #[test]
    fn test_observer_can_cancel_from_callback() {
        let machine = Arc::new(StateMachine::new());
        let seen = recorder(&machine);

        let target = Arc::downgrade(&machine);
        machine.on_state_change(Arc::new(move |state: &JobState| {
            if !state.is_pending() {
                return;
            }
            if let Some(machine) = target.upgrade() {
                machine.cancel();
            }
        }));

        let generation = machine.begin();
        assert!(machine.apply(generation, pending("job-1", "queued")));

        assert_eq!(machine.state(), JobState::Cancelled);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                JobState::Submitting,
                pending("job-1", "queued"),
                JobState::Cancelled,
            ]
        );
    }

    #[test]
    fn test_observer_can_read_state() {
        let machine = Arc::new(StateMachine::new());
        let reads = Arc::new(Mutex::new(Vec::new()));

        let target = Arc::downgrade(&machine);
        let sink = Arc::clone(&reads);
        machine.on_state_change(Arc::new(move |_: &JobState| {
            if let Some(machine) = target.upgrade() {
                sink.lock().unwrap().push(machine.state().name());
            }
        }));

        machine.begin();
        assert_eq!(*reads.lock().unwrap(), vec!["submitting"]);
    }
}
