//! Transition policy: which commands are legal from which state.
//!
//! The table is static data, independent of any handler, so it can be tested
//! on its own. Anything not listed is rejected.

use crate::command::Command;
use crate::state::ComponentState;
use crate::state::ComponentState::{Active, Error, Paused, Recovering, Stopped, Unspecified};

/// Where a legal command leaves the component when its handler does not
/// override the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultNext {
    /// Move to this state.
    To(ComponentState),
    /// Stay where we are.
    Unchanged,
}

impl DefaultNext {
    /// Resolve against the state the command was applied to.
    pub fn resolve(self, current: ComponentState) -> ComponentState {
        match self {
            DefaultNext::To(state) => state,
            DefaultNext::Unchanged => current,
        }
    }
}

/// Policy decision for one `(state, command)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Legal; carries the default resulting state.
    Allowed(ComponentState),
    /// Not legal from this state.
    Rejected,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, Verdict::Allowed(_))
    }
}

struct Rule {
    command: Command,
    from: &'static [ComponentState],
    next: DefaultNext,
}

const RULES: &[Rule] = &[
    Rule { command: Command::Start, from: &[Unspecified, Stopped], next: DefaultNext::To(Active) },
    Rule { command: Command::Stop, from: &[Active, Paused, Error], next: DefaultNext::To(Stopped) },
    Rule { command: Command::Pause, from: &[Active], next: DefaultNext::To(Paused) },
    Rule { command: Command::Resume, from: &[Paused], next: DefaultNext::To(Active) },
    Rule { command: Command::Reload, from: &[Active, Paused], next: DefaultNext::Unchanged },
    Rule {
        command: Command::HealthCheck,
        from: &ComponentState::ALL,
        next: DefaultNext::Unchanged,
    },
    Rule { command: Command::Recover, from: &[Error], next: DefaultNext::To(Active) },
];

/// Table-driven transition policy.
///
/// Two variants exist and differ only in whether `START` is accepted from
/// `ERROR`: [`strict`](Self::strict) (the default) requires `RECOVER` or
/// `STOP` first, [`permissive_restart`](Self::permissive_restart) allows a
/// direct restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionPolicy {
    restart_from_error: bool,
}

impl TransitionPolicy {
    /// Only `RECOVER`, `STOP` and `HEALTH_CHECK` are legal from `ERROR`.
    pub fn strict() -> Self {
        Self { restart_from_error: false }
    }

    /// Additionally allows `START` from `ERROR`.
    pub fn permissive_restart() -> Self {
        Self { restart_from_error: true }
    }

    /// Whether `START` is accepted from `ERROR`.
    pub fn restart_from_error(&self) -> bool {
        self.restart_from_error
    }

    /// Decide legality and default next state for `command` applied in `current`.
    pub fn evaluate(&self, current: ComponentState, command: Command) -> Verdict {
        if self.restart_from_error && command == Command::Start && current == Error {
            return Verdict::Allowed(Active);
        }
        RULES
            .iter()
            .find(|rule| rule.command == command)
            .filter(|rule| rule.from.contains(&current))
            .map(|rule| Verdict::Allowed(rule.next.resolve(current)))
            .unwrap_or(Verdict::Rejected)
    }

    /// Convenience for `evaluate(..).is_allowed()`.
    pub fn is_legal(&self, current: ComponentState, command: Command) -> bool {
        self.evaluate(current, command).is_allowed()
    }

    /// States from which `command` is legal, in code order.
    pub fn legal_from(&self, command: Command) -> Vec<ComponentState> {
        ComponentState::ALL.into_iter().filter(|s| self.is_legal(*s, command)).collect()
    }
}
