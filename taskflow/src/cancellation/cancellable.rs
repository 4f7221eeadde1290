//! The cooperative cancel capability.

use std::sync::Arc;

/// Something whose underlying work can be asked to stop.
///
/// Cancellation is cooperative and idempotent: the first call requests
/// cancellation, later calls are no-ops, and a call after the work has
/// settled changes nothing. Implementations never block and never force an
/// interrupt.
pub trait Cancellable: Send + Sync {
    /// Requests cancellation of the underlying work.
    fn cancel(&self);
}

impl<T: Cancellable + ?Sized> Cancellable for Box<T> {
    fn cancel(&self) {
        (**self).cancel();
    }
}

impl<T: Cancellable + ?Sized> Cancellable for Arc<T> {
    fn cancel(&self) {
        (**self).cancel();
    }
}
