//! Opaque argument documents carried by commands.
//!
//! The dispatcher never looks inside [`CommandArgs`]; shapes belong to the
//! handlers. [`canonical`] holds the shared argument vocabulary so production
//! call sites and test suites exercise the same scenarios.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Loosely-typed key/value document passed through to a handler.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandArgs(Map<String, JsonValue>);

/// Argument value that is not a JSON object.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("command arguments must be a JSON object, got {found}")]
pub struct InvalidArgs {
    /// JSON type that was supplied.
    pub found: &'static str,
}

impl CommandArgs {
    /// Empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a key, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Boolean flag; absent or non-boolean values read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
    }

    /// String value for `key`, if present and a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl From<Map<String, JsonValue>> for CommandArgs {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl TryFrom<JsonValue> for CommandArgs {
    type Error = InvalidArgs;

    /// `null` is accepted as the empty document.
    fn try_from(value: JsonValue) -> Result<Self, InvalidArgs> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            JsonValue::Null => Ok(Self::default()),
            JsonValue::Bool(_) => Err(InvalidArgs { found: "boolean" }),
            JsonValue::Number(_) => Err(InvalidArgs { found: "number" }),
            JsonValue::String(_) => Err(InvalidArgs { found: "string" }),
            JsonValue::Array(_) => Err(InvalidArgs { found: "array" }),
        }
    }
}

/// Named argument values shared by production call sites and tests.
pub mod canonical {
    use super::CommandArgs;
    use crate::command::Command;
    use serde_json::json;

    /// `START` flag: validate without starting.
    pub const DRY_RUN: &str = "dry_run";
    /// `STOP` flag: skip graceful drain.
    pub const FORCE: &str = "force";
    /// `PAUSE` free-text reason.
    pub const REASON: &str = "reason";
    /// `RELOAD` replacement configuration document.
    pub const CONFIG: &str = "config";
    /// `HEALTH_CHECK` flag: probe dependencies too.
    pub const DEEP: &str = "deep";
    /// `RECOVER` flag: discard in-memory state before resuming.
    pub const RESET: &str = "reset";

    pub fn start_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn start_dry_run() -> CommandArgs {
        CommandArgs::new().with(DRY_RUN, true)
    }

    pub fn stop_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn stop_forced() -> CommandArgs {
        CommandArgs::new().with(FORCE, true)
    }

    pub fn pause_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn pause_with_reason() -> CommandArgs {
        CommandArgs::new().with(REASON, "maintenance")
    }

    pub fn resume_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn reload_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn reload_with_config() -> CommandArgs {
        CommandArgs::new().with(CONFIG, json!({ "sample_rate_hz": 10 }))
    }

    pub fn health_check_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn health_check_deep() -> CommandArgs {
        CommandArgs::new().with(DEEP, true)
    }

    pub fn recover_default() -> CommandArgs {
        CommandArgs::new()
    }

    pub fn recover_with_reset() -> CommandArgs {
        CommandArgs::new().with(RESET, true)
    }

    /// Default arguments for `command`.
    pub fn default_for(command: Command) -> CommandArgs {
        match command {
            Command::Start => start_default(),
            Command::Stop => stop_default(),
            Command::Pause => pause_default(),
            Command::Resume => resume_default(),
            Command::Reload => reload_default(),
            Command::HealthCheck => health_check_default(),
            Command::Recover => recover_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_empty_and_scalars_are_rejected() {
        assert!(CommandArgs::try_from(JsonValue::Null).unwrap().is_empty());
        let err = CommandArgs::try_from(json!([1, 2])).unwrap_err();
        assert_eq!(err.found, "array");
    }

    #[test]
    fn canonical_variants_carry_their_flags() {
        assert!(canonical::start_dry_run().flag(canonical::DRY_RUN));
        assert!(canonical::stop_forced().flag(canonical::FORCE));
        assert_eq!(canonical::pause_with_reason().str(canonical::REASON), Some("maintenance"));
        assert!(!canonical::start_default().flag(canonical::DRY_RUN));
    }

    #[test]
    fn serializes_transparently() {
        let args = CommandArgs::new().with("force", true);
        assert_eq!(serde_json::to_value(&args).unwrap(), json!({ "force": true }));
    }
}
