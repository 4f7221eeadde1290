//! Probes for observing callback behaviour in tests.

use parking_lot::RwLock;
use thiserror::Error;

/// An error for exercising failure paths in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("injected failure: {message}")]
pub struct TestError {
    /// Description of the injected failure.
    pub message: String,
}

impl TestError {
    /// Creates a new test error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Records entries in order, from any thread.
///
/// Intended for asserting the exact sequence in which runner callbacks
/// fired.
#[derive(Debug, Default)]
pub struct CallbackLog {
    entries: RwLock<Vec<String>>,
}

impl CallbackLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.write().push(entry.into());
    }

    /// Returns all entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.read().clone()
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clears all recorded entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of entries starting with a prefix.
    #[must_use]
    pub fn count_of(&self, prefix: &str) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}
