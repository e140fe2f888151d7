//! Lifecycle commands sent by the orchestrator.
//!
//! Commands are a closed set. Transports carry them as lower-case labels
//! (`"health_check"`); messages and logs use the upper-case name
//! (`HEALTH_CHECK`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label that does not name a lifecycle command.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct ParseCommandError(pub String);

/// A lifecycle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Begin producing events.
    Start,
    /// Shut down.
    Stop,
    /// Suspend without tearing down.
    Pause,
    /// Leave `PAUSED`.
    Resume,
    /// Re-read configuration in place.
    Reload,
    /// Report health; never changes state.
    HealthCheck,
    /// Leave `ERROR`.
    Recover,
}

impl Command {
    /// Every command.
    pub const ALL: [Command; 7] = [
        Command::Start,
        Command::Stop,
        Command::Pause,
        Command::Resume,
        Command::Reload,
        Command::HealthCheck,
        Command::Recover,
    ];

    /// Wire label.
    pub fn label(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Reload => "reload",
            Command::HealthCheck => "health_check",
            Command::Recover => "recover",
        }
    }

    /// Upper-case name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Start => "START",
            Command::Stop => "STOP",
            Command::Pause => "PAUSE",
            Command::Resume => "RESUME",
            Command::Reload => "RELOAD",
            Command::HealthCheck => "HEALTH_CHECK",
            Command::Recover => "RECOVER",
        }
    }

    /// Parses a label (case-insensitive; `-` and `_` are interchangeable).
    ///
    /// # Errors
    ///
    /// Returns [`ParseCommandError`] if the label does not match any command.
    pub fn parse(value: &str) -> Result<Self, ParseCommandError> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "reload" => Ok(Command::Reload),
            "health_check" | "healthcheck" => Ok(Command::HealthCheck),
            "recover" => Ok(Command::Recover),
            _ => Err(ParseCommandError(value.to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for cmd in Command::ALL {
            assert_eq!(Command::parse(cmd.label()), Ok(cmd));
            assert_eq!(cmd.as_str().parse::<Command>(), Ok(cmd));
        }
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(Command::parse("HealthCheck"), Ok(Command::HealthCheck));
        assert_eq!(Command::parse("health-check"), Ok(Command::HealthCheck));
        assert_eq!(Command::parse(" Stop "), Ok(Command::Stop));
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = Command::parse("reboot").unwrap_err();
        assert_eq!(err.to_string(), "unknown command: reboot");
    }
}
