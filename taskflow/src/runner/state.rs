//! Shared state between a handle and its spawned task.

use super::Outcome;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const RUNNING: u8 = 0;
const SUCCESS: u8 = 1;
const FAILURE: u8 = 2;
const CANCELLED: u8 = 3;

/// Cancel-request flag plus the settled outcome slot for one run.
///
/// Settlement happens exactly once; cancellation requests after
/// settlement are ignored.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    cancel_requested: AtomicBool,
    settled: AtomicU8,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Returns true on the first effective request.
    pub(crate) fn request_cancel(&self) -> bool {
        if self.settled.load(Ordering::SeqCst) != RUNNING {
            return false;
        }
        self.cancel_requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Returns true if cancellation has been requested.
    pub(crate) fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Records the outcome. Only the first settlement sticks.
    pub(crate) fn settle(&self, outcome: Outcome) {
        let _ = self.settled.compare_exchange(
            RUNNING,
            encode(outcome),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Returns true once an outcome has been recorded.
    pub(crate) fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst) != RUNNING
    }

    /// Returns the recorded outcome, or None while still running.
    pub(crate) fn outcome(&self) -> Option<Outcome> {
        decode(self.settled.load(Ordering::SeqCst))
    }
}

fn encode(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Success => SUCCESS,
        Outcome::Failure => FAILURE,
        Outcome::Cancelled => CANCELLED,
    }
}

fn decode(value: u8) -> Option<Outcome> {
    match value {
        SUCCESS => Some(Outcome::Success),
        FAILURE => Some(Outcome::Failure),
        CANCELLED => Some(Outcome::Cancelled),
        _ => None,
    }
}
