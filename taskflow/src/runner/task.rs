//! One-shot task runners.

use super::handle::RunParts;
use super::{
    DoneCallback, Outcome, Priority, RunConfig, TaskContext, TaskFuture, TaskHandle,
};
use std::future::Future;

/// Runs one async operation and reports how it ended.
///
/// The operation always runs to completion; cancellation is checked once,
/// immediately before the outcome is dispatched. If cancellation was
/// requested by then, the computed value is discarded and the cancelled
/// path runs instead.
///
/// Callback order is fixed: exactly one of the outcome callbacks, then
/// `on_completed`.
pub struct TaskRunner<T> {
    op: Box<dyn FnOnce(TaskContext) -> TaskFuture<T> + Send>,
    config: RunConfig,
    on_cancelled: Option<DoneCallback>,
    on_completed: Option<DoneCallback>,
}

impl<T> TaskRunner<T>
where
    T: Send + 'static,
{
    /// Creates a runner for an infallible operation.
    ///
    /// The operation receives a [`TaskContext`] it can poll to return
    /// early when cancellation is requested.
    #[must_use]
    pub fn new<F, Fut>(op: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            op: Box::new(move |ctx| Box::pin(op(ctx))),
            config: RunConfig::default(),
            on_cancelled: None,
            on_completed: None,
        }
    }

    /// Sets the diagnostic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Sets the priority hint.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.config.priority = priority;
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the callback for the cancelled outcome. Defaults to a no-op.
    #[must_use]
    pub fn on_cancelled<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_cancelled = Some(Box::new(move || Box::pin(callback())));
        self
    }

    /// Sets the callback that always runs last. Defaults to a no-op.
    #[must_use]
    pub fn on_completed<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_completed = Some(Box::new(move || Box::pin(callback())));
        self
    }

    /// Spawns the operation and returns its handle.
    ///
    /// `on_success` receives the operation's value unless cancellation
    /// was requested first.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<S, Fut>(self, on_success: S) -> TaskHandle
    where
        S: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Self {
            op,
            config,
            on_cancelled,
            on_completed,
        } = self;

        let RunParts {
            handle,
            state,
            settled_tx,
        } = RunParts::new(&config, "task");
        let context = TaskContext::new(
            handle.id(),
            config.name.clone(),
            config.priority,
            state.clone(),
        );

        tokio::spawn(async move {
            let value = op(context).await;

            if state.is_cancel_requested() {
                state.settle(Outcome::Cancelled);
                if let Some(callback) = on_cancelled {
                    callback().await;
                }
            } else {
                state.settle(Outcome::Success);
                on_success(value).await;
            }

            if let Some(callback) = on_completed {
                callback().await;
            }

            let _ = settled_tx.send(true);
        });

        handle
    }
}

impl<T> std::fmt::Debug for TaskRunner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("config", &self.config)
            .field("has_on_cancelled", &self.on_cancelled.is_some())
            .field("has_on_completed", &self.on_completed.is_some())
            .finish()
    }
}

/// Runs one fallible async operation and reports how it ended.
///
/// Dispatch rules match [`TaskRunner`], with the error path split out:
/// exactly one of `on_success`, `on_error`, or the cancelled callback
/// runs, then `on_completed`. Cancellation wins over both a value and an
/// error when it was requested by dispatch time.
pub struct FallibleTaskRunner<T, E> {
    op: Box<dyn FnOnce(TaskContext) -> TaskFuture<Result<T, E>> + Send>,
    config: RunConfig,
    on_cancelled: Option<DoneCallback>,
    on_completed: Option<DoneCallback>,
}

impl<T, E> FallibleTaskRunner<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a runner for a fallible operation.
    #[must_use]
    pub fn new<F, Fut>(op: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            op: Box::new(move |ctx| Box::pin(op(ctx))),
            config: RunConfig::default(),
            on_cancelled: None,
            on_completed: None,
        }
    }

    /// Sets the diagnostic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Sets the priority hint.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.config.priority = priority;
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the callback for the cancelled outcome. Defaults to a no-op.
    #[must_use]
    pub fn on_cancelled<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_cancelled = Some(Box::new(move || Box::pin(callback())));
        self
    }

    /// Sets the callback that always runs last. Defaults to a no-op.
    #[must_use]
    pub fn on_completed<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_completed = Some(Box::new(move || Box::pin(callback())));
        self
    }

    /// Spawns the operation and returns its handle.
    ///
    /// Exactly one of `on_success` and `on_error` receives the result,
    /// unless cancellation was requested first.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<S, SFut, R, RFut>(self, on_success: S, on_error: R) -> TaskHandle
    where
        S: FnOnce(T) -> SFut + Send + 'static,
        SFut: Future<Output = ()> + Send + 'static,
        R: FnOnce(E) -> RFut + Send + 'static,
        RFut: Future<Output = ()> + Send + 'static,
    {
        let Self {
            op,
            config,
            on_cancelled,
            on_completed,
        } = self;

        let RunParts {
            handle,
            state,
            settled_tx,
        } = RunParts::new(&config, "fallible_task");
        let context = TaskContext::new(
            handle.id(),
            config.name.clone(),
            config.priority,
            state.clone(),
        );

        tokio::spawn(async move {
            let result = op(context).await;

            if state.is_cancel_requested() {
                // The computed result is discarded, cancellation wins.
                state.settle(Outcome::Cancelled);
                if let Some(callback) = on_cancelled {
                    callback().await;
                }
            } else {
                match result {
                    Ok(value) => {
                        state.settle(Outcome::Success);
                        on_success(value).await;
                    }
                    Err(error) => {
                        state.settle(Outcome::Failure);
                        on_error(error).await;
                    }
                }
            }

            if let Some(callback) = on_completed {
                callback().await;
            }

            let _ = settled_tx.send(true);
        });

        handle
    }
}

impl<T, E> std::fmt::Debug for FallibleTaskRunner<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallibleTaskRunner")
            .field("config", &self.config)
            .field("has_on_cancelled", &self.on_cancelled.is_some())
            .field("has_on_completed", &self.on_completed.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_success_value_reaches_callback() {
        let received = Arc::new(parking_lot::Mutex::new(None));
        let received_clone = received.clone();

        let handle = TaskRunner::new(|_ctx| async { 42 }).spawn(move |value| {
            let received = received_clone;
            async move {
                *received.lock() = Some(value);
            }
        });

        assert_eq!(handle.join().await, Some(Outcome::Success));
        assert_eq!(*received.lock(), Some(42));
    }

    #[tokio::test]
    async fn test_builder_sets_name_and_priority() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_clone = seen.clone();

        let handle = TaskRunner::new(|ctx: TaskContext| async move { ctx.priority() })
            .with_name("classifier")
            .with_priority(Priority::High)
            .spawn(move |priority| {
                let seen = seen_clone;
                async move {
                    *seen.lock() = Some(priority);
                }
            });

        assert_eq!(handle.name(), Some("classifier"));
        assert_eq!(handle.join().await, Some(Outcome::Success));
        assert_eq!(*seen.lock(), Some(Priority::High));
    }

    #[tokio::test]
    async fn test_with_config_applies_whole_config() {
        let config = RunConfig::new().with_name("bulk").with_priority(Priority::Low);

        let handle = TaskRunner::new(|_ctx| async {})
            .with_config(config)
            .spawn(|()| async {});

        assert_eq!(handle.name(), Some("bulk"));
        assert_eq!(handle.join().await, Some(Outcome::Success));
    }

    #[tokio::test]
    async fn test_fallible_error_reaches_error_callback() {
        let errors = Arc::new(AtomicUsize::new(0));
        let errors_clone = errors.clone();

        let handle = FallibleTaskRunner::new(|_ctx| async {
            Err::<u32, _>(TestError::new("boom"))
        })
        .spawn(
            |_value| async {
                panic!("success must not fire for an error");
            },
            move |error| {
                let errors = errors_clone;
                async move {
                    assert_eq!(error, TestError::new("boom"));
                    errors.fetch_add(1, Ordering::SeqCst);
                }
            },
        );

        assert_eq!(handle.join().await, Some(Outcome::Failure));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_hooks_still_settle() {
        let handle = TaskRunner::new(|_ctx| async { "done" }).spawn(|_value| async {});
        handle.cancel();

        assert_eq!(handle.join().await, Some(Outcome::Cancelled));
    }
}
