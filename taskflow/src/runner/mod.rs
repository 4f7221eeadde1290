//! Task runners that classify how async work ends.
//!
//! This module provides:
//! - TaskRunner and FallibleTaskRunner for one-shot operations
//! - StreamRunner for consuming element streams
//! - TaskHandle and Canceller for observing and cancelling runs
//! - Outcome, RunConfig, and Priority supporting types

mod config;
mod handle;
mod outcome;
mod state;
mod stream;
mod task;

pub use config::{Priority, RunConfig};
pub use handle::{Canceller, TaskContext, TaskHandle};
pub use outcome::Outcome;
pub use stream::StreamRunner;
pub use task::{FallibleTaskRunner, TaskRunner};

use std::future::Future;
use std::pin::Pin;

/// Boxed future produced by a runner operation or callback.
pub(crate) type TaskFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Boxed async callback that takes no arguments.
pub(crate) type DoneCallback = Box<dyn FnOnce() -> TaskFuture<()> + Send>;

/// Boxed async callback that receives the producer error.
pub(crate) type ErrorCallback<E> = Box<dyn FnOnce(E) -> TaskFuture<()> + Send>;
