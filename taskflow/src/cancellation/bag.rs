//! A bag of cancellable handles with bulk cancellation.

use super::Cancellable;
use parking_lot::Mutex;
use tracing::debug;

/// A collection of cancellable handles that can all be stopped at once.
///
/// Entries are kept in insertion order and duplicates are allowed.
/// Dropping the bag cancels everything still tracked, so owning a bag
/// inside a longer-lived object ties the tracked work to that object's
/// lifetime.
#[derive(Default)]
pub struct TaskBag {
    entries: Mutex<Vec<Box<dyn Cancellable>>>,
}

impl TaskBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a handle for later bulk cancellation.
    ///
    /// Callable from any thread, including one currently running tracked
    /// work.
    pub fn insert<C>(&self, entry: C)
    where
        C: Cancellable + 'static,
    {
        self.entries.lock().push(Box::new(entry));
    }

    /// Cancels every tracked handle and empties the bag.
    ///
    /// Idempotent: a second call finds nothing left to cancel. Entries
    /// inserted while a `cancel_all` is in flight stay tracked for the
    /// next one.
    pub fn cancel_all(&self) {
        let entries: Vec<_> = {
            let mut lock = self.entries.lock();
            std::mem::take(&mut *lock)
        };

        if entries.is_empty() {
            return;
        }

        debug!(count = entries.len(), "Cancelling all tracked tasks");
        for entry in &entries {
            entry.cancel();
        }
    }

    /// Returns the number of tracked handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Drop for TaskBag {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for TaskBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBag")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    mockall::mock! {
        Tracked {}

        impl Cancellable for Tracked {
            fn cancel(&self);
        }
    }

    struct CountingCancel(Arc<AtomicUsize>);

    impl Cancellable for CountingCancel {
        fn cancel(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_bag_starts_empty() {
        let bag = TaskBag::new();
        assert!(bag.is_empty());
        assert_eq!(bag.len(), 0);
    }

    #[test]
    fn test_insert_keeps_duplicates() {
        let bag = TaskBag::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bag.insert(CountingCancel(counter.clone()));
        bag.insert(CountingCancel(counter.clone()));

        assert_eq!(bag.len(), 2);

        bag.cancel_all();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cancel_all_delivers_exactly_once_per_entry() {
        let bag = TaskBag::new();

        for _ in 0..3 {
            let mut tracked = MockTracked::new();
            tracked.expect_cancel().times(1).return_const(());
            bag.insert(tracked);
        }

        bag.cancel_all();
        // Dropping the drained mocks verified the expectations.
    }

    #[test]
    fn test_cancel_all_empties_the_bag() {
        let bag = TaskBag::new();
        bag.insert(CountingCancel(Arc::new(AtomicUsize::new(0))));

        bag.cancel_all();

        assert!(bag.is_empty());
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let bag = TaskBag::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bag.insert(CountingCancel(counter.clone()));

        bag.cancel_all();
        bag.cancel_all();
        bag.cancel_all();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_all_on_empty_bag_is_noop() {
        let bag = TaskBag::new();
        bag.cancel_all();
        assert!(bag.is_empty());
    }

    #[test]
    fn test_drop_cancels_tracked_entries() {
        let counter = Arc::new(AtomicUsize::new(0));

        {
            let bag = TaskBag::new();
            bag.insert(CountingCancel(counter.clone()));
            bag.insert(CountingCancel(counter.clone()));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_insert_after_cancel_all_is_tracked_again() {
        let bag = TaskBag::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bag.insert(CountingCancel(counter.clone()));
        bag.cancel_all();

        bag.insert(CountingCancel(counter.clone()));
        assert_eq!(bag.len(), 1);

        bag.cancel_all();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_inserts_are_all_tracked() {
        let bag = Arc::new(TaskBag::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let bag = bag.clone();
                let counter = counter.clone();
                std::thread::spawn(move || {
                    bag.insert(CountingCancel(counter));
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(bag.len(), 8);
        bag.cancel_all();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
