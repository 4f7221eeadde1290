//! Cancellation capabilities and bulk cancellation.
//!
//! This module provides:
//! - Cancellable as the cooperative cancel capability
//! - TaskBag for tracking and cancelling groups of tasks

mod bag;
mod cancellable;

pub use bag::TaskBag;
pub use cancellable::Cancellable;
