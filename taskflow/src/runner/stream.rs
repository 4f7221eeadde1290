//! Stream-consuming runner.

use super::handle::RunParts;
use super::{DoneCallback, ErrorCallback, Outcome, Priority, RunConfig, TaskHandle};
use futures::stream::{BoxStream, StreamExt};
use futures::Stream;
use std::future::Future;

/// Consumes a fallible element stream and reports how consumption ended.
///
/// Elements are processed strictly in producer order; the per-element
/// callback is awaited before the next element is pulled. Cancellation is
/// checked for every pulled element, and once more after the loop so a
/// request racing the final element still lands as cancelled rather than
/// success.
///
/// A producer error ends consumption: cancellation wins if it was
/// requested by then, otherwise the error callback runs. At most one of
/// the error and cancelled callbacks fires per run, and `on_completed`
/// always runs last.
pub struct StreamRunner<T, E> {
    stream: BoxStream<'static, Result<T, E>>,
    config: RunConfig,
    on_error: Option<ErrorCallback<E>>,
    on_cancelled: Option<DoneCallback>,
    on_completed: Option<DoneCallback>,
}

impl<T, E> StreamRunner<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a runner over a fallible element stream.
    ///
    /// The producer is dropped as soon as consumption stops; it does not
    /// need to be cancellation-aware.
    #[must_use]
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
            config: RunConfig::default(),
            on_error: None,
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

    /// Sets the callback for a producer error. Defaults to a no-op.
    #[must_use]
    pub fn on_error<F, Fut>(mut self, callback: F) -> Self
    where
        F: FnOnce(E) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(Box::new(move |error| Box::pin(callback(error))));
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

    /// Spawns the consumption loop and returns its handle.
    ///
    /// `on_value` is awaited for each element before the next one is
    /// pulled. An element pulled after cancellation was requested is
    /// discarded without reaching `on_value`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<V, Fut>(self, mut on_value: V) -> TaskHandle
    where
        V: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Self {
            mut stream,
            config,
            mut on_error,
            on_cancelled,
            on_completed,
        } = self;

        let RunParts {
            handle,
            state,
            settled_tx,
        } = RunParts::new(&config, "stream");

        tokio::spawn(async move {
            let mut dispatched = false;

            while let Some(item) = stream.next().await {
                if state.is_cancel_requested() {
                    // The pulled item is discarded, the re-check below
                    // records the outcome.
                    break;
                }

                match item {
                    Ok(value) => on_value(value).await,
                    Err(error) => {
                        state.settle(Outcome::Failure);
                        if let Some(callback) = on_error.take() {
                            callback(error).await;
                        }
                        dispatched = true;
                        break;
                    }
                }
            }

            // Extra check so a cancel racing the final element or the
            // exhaustion still lands. Skipped after an error dispatch,
            // the error and cancelled callbacks are mutually exclusive.
            if !dispatched {
                if state.is_cancel_requested() {
                    state.settle(Outcome::Cancelled);
                    if let Some(callback) = on_cancelled {
                        callback().await;
                    }
                } else {
                    state.settle(Outcome::Success);
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

impl<E> StreamRunner<(), E>
where
    E: Send + 'static,
{
    /// Spawns a consumption loop whose per-element callback takes no
    /// payload.
    ///
    /// For signal streams whose elements only mark an occurrence. All
    /// other semantics match [`spawn`](Self::spawn).
    pub fn spawn_signals<V, Fut>(self, mut on_signal: V) -> TaskHandle
    where
        V: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawn(move |()| on_signal())
    }
}

impl<T, E> std::fmt::Debug for StreamRunner<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRunner")
            .field("config", &self.config)
            .field("has_on_error", &self.on_error.is_some())
            .field("has_on_cancelled", &self.on_cancelled.is_some())
            .field("has_on_completed", &self.on_completed.is_some())
            .finish()
    }
}
