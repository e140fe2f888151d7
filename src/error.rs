//! Dispatch failure taxonomy.
//!
//! None of these escape `dispatch`; each is folded into a failed
//! [`DispatchResult`](crate::DispatchResult) so the state machine stays live.
use crate::command::Command;
use crate::state::ComponentState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a dispatch did not succeed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DispatchError {
    /// The transition policy rejects `command` from `state`. State unchanged.
    #[error("illegal transition: {command} from {state}")]
    IllegalTransition {
        /// Rejected command.
        command: Command,
        /// State it was applied to.
        state: ComponentState,
    },
    /// Legal, but nothing is registered to run it. State unchanged.
    #[error("no handler registered for {command}")]
    UnhandledCommand {
        /// Command without a handler.
        command: Command,
    },
    /// The handler failed or panicked. State forced to `ERROR`.
    #[error("{message}")]
    HandlerFailure {
        /// Command whose handler failed.
        command: Command,
        /// Handler's own description.
        message: String,
    },
    /// The handler asked for a state it may not commit. State unchanged.
    #[error("handler for {command} returned {detail}")]
    ContractViolation {
        /// Command whose handler misbehaved.
        command: Command,
        /// What was returned.
        detail: String,
    },
}

impl DispatchError {
    /// Coarse classification.
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::IllegalTransition { .. } => FailureKind::IllegalTransition,
            DispatchError::UnhandledCommand { .. } => FailureKind::UnhandledCommand,
            DispatchError::HandlerFailure { .. } => FailureKind::HandlerFailure,
            DispatchError::ContractViolation { .. } => FailureKind::ContractViolation,
        }
    }

    /// Check if this is a policy rejection.
    pub fn is_illegal_transition(&self) -> bool {
        matches!(self, DispatchError::IllegalTransition { .. })
    }

    /// Check if a handler was missing.
    pub fn is_unhandled(&self) -> bool {
        matches!(self, DispatchError::UnhandledCommand { .. })
    }

    /// Check if the handler itself failed.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, DispatchError::HandlerFailure { .. })
    }

    /// Check if the handler broke its contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, DispatchError::ContractViolation { .. })
    }

    pub(crate) fn invalid_code(command: Command, code: i32) -> Self {
        DispatchError::ContractViolation { command, detail: format!("invalid state code {code}") }
    }

    pub(crate) fn forbidden_override(command: Command, state: ComponentState) -> Self {
        DispatchError::ContractViolation {
            command,
            detail: format!("{state}, which is not a valid override"),
        }
    }
}

/// Serializable failure class carried on every failed result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    IllegalTransition,
    UnhandledCommand,
    HandlerFailure,
    ContractViolation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::IllegalTransition => "illegal_transition",
            FailureKind::UnhandledCommand => "unhandled_command",
            FailureKind::HandlerFailure => "handler_failure",
            FailureKind::ContractViolation => "contract_violation",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_wire_format() {
        let illegal = DispatchError::IllegalTransition {
            command: Command::Pause,
            state: ComponentState::Stopped,
        };
        assert_eq!(illegal.to_string(), "illegal transition: PAUSE from STOPPED");

        let unhandled = DispatchError::UnhandledCommand { command: Command::HealthCheck };
        assert_eq!(unhandled.to_string(), "no handler registered for HEALTH_CHECK");

        let failed = DispatchError::HandlerFailure {
            command: Command::Stop,
            message: "drain timed out".into(),
        };
        assert_eq!(failed.to_string(), "drain timed out");

        assert_eq!(
            DispatchError::invalid_code(Command::Start, 42).to_string(),
            "handler for START returned invalid state code 42"
        );
    }

    #[test]
    fn kinds_classify() {
        let err = DispatchError::UnhandledCommand { command: Command::Start };
        assert_eq!(err.kind(), FailureKind::UnhandledCommand);
        assert!(err.is_unhandled());
        assert!(!err.is_illegal_transition());
        assert_eq!(FailureKind::ContractViolation.to_string(), "contract_violation");
    }
}
