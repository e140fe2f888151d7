//! Component lifecycle states and their stable wire codes.

use serde::{Deserialize, Serialize};
use std::fmt;

const CODE_UNSPECIFIED: i32 = 0;
const CODE_ACTIVE: i32 = 1;
const CODE_PAUSED: i32 = 2;
const CODE_STOPPED: i32 = 3;
const CODE_ERROR: i32 = 4;
const CODE_RECOVERING: i32 = 5;

/// Raw state code that does not name any [`ComponentState`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid component state code: {0}")]
pub struct InvalidStateCode(pub i32);

/// Lifecycle phase of a sensor as tracked by the dispatcher.
///
/// Codes mirror the orchestrator's wire enum, so `Unspecified` is `0` and is
/// only ever the initial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentState {
    /// No command has been applied yet.
    #[default]
    Unspecified,
    /// Running and producing events.
    Active,
    /// Temporarily suspended; resumable.
    Paused,
    /// Shut down in an orderly way.
    Stopped,
    /// A handler failed; needs `RECOVER` or `STOP`.
    Error,
    /// Recovery in progress.
    Recovering,
}

impl ComponentState {
    /// Every state, in code order.
    pub const ALL: [ComponentState; 6] = [
        ComponentState::Unspecified,
        ComponentState::Active,
        ComponentState::Paused,
        ComponentState::Stopped,
        ComponentState::Error,
        ComponentState::Recovering,
    ];

    /// Wire code for this state.
    pub fn code(self) -> i32 {
        match self {
            ComponentState::Unspecified => CODE_UNSPECIFIED,
            ComponentState::Active => CODE_ACTIVE,
            ComponentState::Paused => CODE_PAUSED,
            ComponentState::Stopped => CODE_STOPPED,
            ComponentState::Error => CODE_ERROR,
            ComponentState::Recovering => CODE_RECOVERING,
        }
    }

    /// Decode a wire code, rejecting anything outside the enumeration.
    pub fn from_code(code: i32) -> Result<Self, InvalidStateCode> {
        match code {
            CODE_UNSPECIFIED => Ok(ComponentState::Unspecified),
            CODE_ACTIVE => Ok(ComponentState::Active),
            CODE_PAUSED => Ok(ComponentState::Paused),
            CODE_STOPPED => Ok(ComponentState::Stopped),
            CODE_ERROR => Ok(ComponentState::Error),
            CODE_RECOVERING => Ok(ComponentState::Recovering),
            other => Err(InvalidStateCode(other)),
        }
    }

    /// Canonical upper-case name, as used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentState::Unspecified => "UNSPECIFIED",
            ComponentState::Active => "ACTIVE",
            ComponentState::Paused => "PAUSED",
            ComponentState::Stopped => "STOPPED",
            ComponentState::Error => "ERROR",
            ComponentState::Recovering => "RECOVERING",
        }
    }
}

impl TryFrom<i32> for ComponentState {
    type Error = InvalidStateCode;

    fn try_from(code: i32) -> Result<Self, InvalidStateCode> {
        ComponentState::from_code(code)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
