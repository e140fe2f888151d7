//! Lifecycle events emitted once a dispatch outcome is committed.

use crate::command::Command;
use crate::error::FailureKind;
use crate::state::ComponentState;
use std::fmt;

/// Events emitted by the dispatcher after each commit.
///
/// Events are emitted from inside the dispatch critical section, so their
/// order matches commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A command succeeded and committed its resulting state.
    ///
    /// `from == to` for commands that keep state (e.g. `RELOAD`).
    Transitioned {
        /// Command applied
        command: Command,
        /// State before
        from: ComponentState,
        /// State committed
        to: ComponentState,
    },
    /// A command was refused without running or without committing.
    Rejected {
        /// Refused command
        command: Command,
        /// State left in place
        state: ComponentState,
        /// Why it was refused
        kind: FailureKind,
    },
    /// A handler failed; the component moved to `ERROR`.
    HandlerFailed {
        /// Command whose handler failed
        command: Command,
        /// State before the failure
        from: ComponentState,
    },
    /// A health check completed without touching state.
    HealthChecked {
        /// State at the time of the probe
        state: ComponentState,
    },
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleEvent::Transitioned { command, from, to } => {
                write!(f, "Transitioned({command}: {from} -> {to})")
            }
            LifecycleEvent::Rejected { command, state, kind } => {
                write!(f, "Rejected({command} in {state}, {kind})")
            }
            LifecycleEvent::HandlerFailed { command, from } => {
                write!(f, "HandlerFailed({command} from {from})")
            }
            LifecycleEvent::HealthChecked { state } => write!(f, "HealthChecked({state})"),
        }
    }
}
