//! Dispatcher configuration.

use crate::policy::TransitionPolicy;
use serde::{Deserialize, Serialize};

/// Default number of dispatch results kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Errors produced when validating dispatcher configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// History must hold at least one record.
    #[error("history_capacity must be > 0 (got {provided})")]
    InvalidHistoryCapacity {
        /// Value provided by caller.
        provided: usize,
    },
}

/// Validated dispatcher settings.
///
/// Deserializes with defaults for missing fields, so an empty document is a
/// valid config:
///
/// ```
/// use lifeline::DispatcherConfig;
/// let cfg: DispatcherConfig = serde_json::from_str("{}").unwrap();
/// assert!(!cfg.restart_from_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    restart_from_error: bool,
    history_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { restart_from_error: false, history_capacity: DEFAULT_HISTORY_CAPACITY }
    }
}

impl DispatcherConfig {
    /// Create a config with validation.
    pub fn new(restart_from_error: bool, history_capacity: usize) -> Result<Self, ConfigError> {
        let cfg = Self { restart_from_error, history_capacity };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Re-check invariants (useful after deserializing).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidHistoryCapacity { provided: 0 });
        }
        Ok(())
    }

    /// Whether `START` is legal from `ERROR`.
    pub fn restart_from_error(&self) -> bool {
        self.restart_from_error
    }

    /// Maximum number of results kept in history.
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Transition policy selected by this config.
    pub fn policy(&self) -> TransitionPolicy {
        if self.restart_from_error {
            TransitionPolicy::permissive_restart()
        } else {
            TransitionPolicy::strict()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_history_is_rejected() {
        assert_eq!(
            DispatcherConfig::new(false, 0),
            Err(ConfigError::InvalidHistoryCapacity { provided: 0 })
        );
    }

    #[test]
    fn deserialized_config_picks_policy() {
        let cfg: DispatcherConfig =
            serde_json::from_str(r#"{"restart_from_error": true}"#).expect("config");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.policy(), TransitionPolicy::permissive_restart());
        assert_eq!(cfg.history_capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = serde_json::from_str::<DispatcherConfig>(r#"{"restart": true}"#);
        assert!(res.is_err());
    }
}
