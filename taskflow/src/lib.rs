//! # Taskflow
//!
//! Structured task runners with cooperative cancellation on Tokio.
//!
//! Taskflow wraps one-shot operations and element streams in spawned tasks
//! that report how they ended:
//!
//! - **Outcome classification**: exactly one of success, error, or
//!   cancelled fires per run, always followed by a completion hook
//! - **Cooperative cancellation**: a flag checked at fixed points, never a
//!   forced interrupt
//! - **Bulk cancellation**: a `TaskBag` cancels everything it tracks,
//!   including on drop
//! - **Ordered stream consumption**: each element is fully processed
//!   before the next one is pulled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskflow::prelude::*;
//!
//! // Run one operation and observe how it ends
//! let handle = TaskRunner::new(|_ctx| async { fetch_report().await })
//!     .with_name("report")
//!     .on_completed(|| async { println!("done") })
//!     .spawn(|report| async move { render(report) });
//!
//! // Tie cancellation to a scope
//! let bag = TaskBag::new();
//! bag.insert(handle.canceller());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod runner;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{Cancellable, TaskBag};
    pub use crate::runner::{
        Canceller, FallibleTaskRunner, Outcome, Priority, RunConfig,
        StreamRunner, TaskContext, TaskHandle, TaskRunner,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
