//! Outcome record returned for every dispatch.

use crate::command::Command;
use crate::error::{DispatchError, FailureKind};
use crate::state::ComponentState;
use serde::{Deserialize, Serialize};

/// Outcome of one dispatch. Always carries a valid resulting state, even on
/// failure (unchanged, or `ERROR` after a handler failure).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Command that was applied.
    pub command: Command,
    /// State observed when the command was admitted.
    pub previous_state: ComponentState,
    /// State committed by this dispatch.
    pub resulting_state: ComponentState,
    /// Whether the command completed without error.
    pub success: bool,
    /// Failure description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Failure class, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl DispatchResult {
    pub(crate) fn succeeded(
        command: Command,
        previous_state: ComponentState,
        resulting_state: ComponentState,
    ) -> Self {
        Self {
            command,
            previous_state,
            resulting_state,
            success: true,
            error_message: None,
            error_kind: None,
        }
    }

    pub(crate) fn failed(
        command: Command,
        previous_state: ComponentState,
        resulting_state: ComponentState,
        err: &DispatchError,
    ) -> Self {
        Self {
            command,
            previous_state,
            resulting_state,
            success: false,
            error_message: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    /// Whether the committed state differs from the previous one.
    pub fn changed_state(&self) -> bool {
        self.previous_state != self.resulting_state
    }
}
