//! Handles for observing and cancelling spawned runs.

use super::state::RunState;
use super::{Outcome, Priority, RunConfig};
use crate::cancellation::Cancellable;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Observer and cancel capability for one spawned run.
///
/// Dropping a handle does not cancel the run. Register the handle (or its
/// [`Canceller`]) in a [`TaskBag`](crate::cancellation::TaskBag) to tie
/// cancellation to a scope.
pub struct TaskHandle {
    id: Uuid,
    name: Option<String>,
    state: Arc<RunState>,
    settled_rx: watch::Receiver<bool>,
}

impl TaskHandle {
    pub(crate) fn new(
        id: Uuid,
        name: Option<String>,
        state: Arc<RunState>,
        settled_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            name,
            state,
            settled_rx,
        }
    }

    /// Returns the unique id of this run.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the diagnostic name, if one was configured.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Requests cooperative cancellation.
    ///
    /// Idempotent, and a no-op once the run has settled. The running
    /// operation keeps executing; its result is discarded at the next
    /// checkpoint.
    pub fn cancel(&self) {
        if self.state.request_cancel() {
            debug!(task_id = %self.id, name = ?self.name, "Cancellation requested");
        }
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancel_requested()
    }

    /// Returns true once the outcome is fixed.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.is_settled()
    }

    /// Returns the settled outcome, or None while still running.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome()
    }

    /// Waits until the run has finished dispatching all callbacks.
    ///
    /// Returns the settled outcome. Returns None if the task died without
    /// settling, which only happens when the operation itself panicked;
    /// a panicking callback still leaves the already-settled outcome
    /// observable here.
    pub async fn join(&self) -> Option<Outcome> {
        let mut settled_rx = self.settled_rx.clone();
        let _ = settled_rx.wait_for(|done| *done).await;
        self.state.outcome()
    }

    /// Derives a cheap, non-owning cancel capability for this run.
    #[must_use]
    pub fn canceller(&self) -> Canceller {
        Canceller {
            id: self.id,
            state: self.state.clone(),
        }
    }
}

impl Cancellable for TaskHandle {
    fn cancel(&self) {
        TaskHandle::cancel(self);
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cancelled", &self.is_cancelled())
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// Cheap, cloneable cancel capability detached from handle ownership.
#[derive(Clone)]
pub struct Canceller {
    id: Uuid,
    state: Arc<RunState>,
}

impl Canceller {
    /// Returns the id of the run this capability cancels.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Requests cooperative cancellation of the associated run.
    pub fn cancel(&self) {
        if self.state.request_cancel() {
            debug!(task_id = %self.id, "Cancellation requested");
        }
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancel_requested()
    }
}

impl Cancellable for Canceller {
    fn cancel(&self) {
        Canceller::cancel(self);
    }
}

impl std::fmt::Debug for Canceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canceller")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Cancellation-query view handed to a one-shot operation.
///
/// The context is query-only: the operation can observe a pending
/// cancellation request and return early, but cannot cancel the run
/// through it.
#[derive(Clone)]
pub struct TaskContext {
    id: Uuid,
    name: Option<String>,
    priority: Priority,
    state: Arc<RunState>,
}

impl TaskContext {
    pub(crate) fn new(
        id: Uuid,
        name: Option<String>,
        priority: Priority,
        state: Arc<RunState>,
    ) -> Self {
        Self {
            id,
            name,
            priority,
            state,
        }
    }

    /// Returns true if cancellation has been requested for this run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancel_requested()
    }

    /// Returns the id of the surrounding run.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the diagnostic name, if one was configured.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the advisory priority hint.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Shared plumbing built once per spawned run.
pub(crate) struct RunParts {
    pub(crate) handle: TaskHandle,
    pub(crate) state: Arc<RunState>,
    pub(crate) settled_tx: watch::Sender<bool>,
}

impl RunParts {
    pub(crate) fn new(config: &RunConfig, kind: &'static str) -> Self {
        let id = Uuid::new_v4();
        let state = Arc::new(RunState::new());
        let (settled_tx, settled_rx) = watch::channel(false);

        debug!(
            task_id = %id,
            name = ?config.name,
            priority = %config.priority,
            kind,
            "Spawning task"
        );

        let handle = TaskHandle::new(id, config.name.clone(), state.clone(), settled_rx);
        Self {
            handle,
            state,
            settled_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    fn parts() -> RunParts {
        RunParts::new(&RunConfig::new().with_name("test"), "task")
    }

    #[test]
    fn test_handle_exposes_identity() {
        let parts = parts();
        assert_eq!(parts.handle.name(), Some("test"));
        assert!(!parts.handle.id().is_nil());
    }

    #[test]
    fn test_cancel_is_observable_and_idempotent() {
        let parts = parts();

        parts.handle.cancel();
        parts.handle.cancel();

        assert!(parts.handle.is_cancelled());
        assert!(!parts.handle.is_settled());
    }

    #[test]
    fn test_canceller_shares_run_state() {
        let parts = parts();
        let canceller = parts.handle.canceller();

        assert_eq!(canceller.id(), parts.handle.id());
        canceller.cancel();

        assert!(canceller.is_cancelled());
        assert!(parts.handle.is_cancelled());
    }

    #[test]
    fn test_cancel_after_settlement_is_noop() {
        let parts = parts();
        parts.state.settle(Outcome::Success);

        parts.handle.cancel();

        assert!(!parts.handle.is_cancelled());
        assert_eq!(parts.handle.outcome(), Some(Outcome::Success));
    }

    #[test]
    fn test_context_is_query_only_view() {
        let parts = parts();
        let context = TaskContext::new(
            parts.handle.id(),
            Some("test".to_string()),
            Priority::High,
            parts.state.clone(),
        );

        assert!(!context.is_cancelled());
        assert_eq!(context.priority(), Priority::High);
        assert_eq!(context.name(), Some("test"));

        parts.handle.cancel();
        assert!(context.is_cancelled());
    }

    #[test]
    fn test_join_pending_until_completion_signal() {
        let parts = parts();
        let mut join = task::spawn(parts.handle.join());

        assert_pending!(join.poll());

        parts.state.settle(Outcome::Success);
        parts.settled_tx.send(true).unwrap();

        assert!(join.is_woken());
        assert_eq!(assert_ready!(join.poll()), Some(Outcome::Success));
    }

    #[test]
    fn test_join_reports_none_when_sender_dropped_unsettled() {
        let parts = parts();
        let mut join = task::spawn(parts.handle.join());

        assert_pending!(join.poll());

        drop(parts.settled_tx);

        assert!(join.is_woken());
        assert_eq!(assert_ready!(join.poll()), None);
    }
}
