//! State store: current state plus last error, published as one snapshot.
//!
//! Reads are lock-free `ArcSwap` loads and always observe a whole commit.
//! Writes happen only from the dispatcher's critical section (and the
//! harness arrangement path), so there is a single writer at a time.

use crate::state::ComponentState;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Consistent view of the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Current lifecycle state.
    pub state: ComponentState,
    /// Description of the most recent failure, cleared by the next
    /// successful non-health-check dispatch.
    pub last_error: Option<String>,
}

/// Single source of truth for component state.
#[derive(Debug)]
pub struct StateStore {
    inner: ArcSwap<Status>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Store starting at `UNSPECIFIED` with no error.
    pub fn new() -> Self {
        Self { inner: ArcSwap::from_pointee(Status::default()) }
    }

    /// Snapshot both slots at once.
    pub fn status(&self) -> Arc<Status> {
        self.inner.load_full()
    }

    pub fn state(&self) -> ComponentState {
        self.inner.load().state
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.load().last_error.clone()
    }

    /// Publish a new state and error slot together.
    pub(crate) fn commit(&self, state: ComponentState, last_error: Option<String>) {
        self.inner.store(Arc::new(Status { state, last_error }));
    }

    /// Record an error without moving the state.
    pub(crate) fn record_error(&self, message: String) {
        let state = self.state();
        self.commit(state, Some(message));
    }

    /// Overwrite the state only; the error slot is left alone.
    pub(crate) fn arrange(&self, state: ComponentState) {
        let last_error = self.last_error();
        self.commit(state, last_error);
    }
}
