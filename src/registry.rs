//! Handler registry and its builder.
//!
//! The registry is assembled once at startup and frozen; duplicate
//! registrations are reported by [`HandlerRegistryBuilder::build`] so that
//! dispatch-time failures stay limited to state-machine concerns.

use crate::command::Command;
use crate::config::ConfigError;
use crate::handler::{CommandHandler, FnHandler, HandlerContext, HandlerResult};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Configuration errors detected while building the registry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// More than one handler was registered for the same command.
    #[error("duplicate handler registered for {0}")]
    DuplicateHandler(Command),
    /// Dispatcher configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Immutable command → handler mapping.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Command, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    /// Start a builder.
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    /// Handler registered for `command`, if any.
    pub fn lookup(&self, command: Command) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&command).cloned()
    }

    /// Whether `command` has a handler.
    pub fn contains(&self, command: Command) -> bool {
        self.handlers.contains_key(&command)
    }

    /// Commands with a handler, in [`Command::ALL`] order.
    pub fn commands(&self) -> Vec<Command> {
        Command::ALL.into_iter().filter(|c| self.handlers.contains_key(c)).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").field("commands", &self.commands()).finish()
    }
}

/// Fluent builder for [`HandlerRegistry`].
///
/// Registration never fails eagerly; the first duplicate is remembered and
/// returned from [`build`](Self::build).
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<Command, Arc<dyn CommandHandler>>,
    duplicate: Option<Command>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler object for `command`.
    pub fn register<H>(self, command: Command, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        self.register_arc(command, Arc::new(handler))
    }

    /// Register a shared handler object for `command`.
    pub fn register_arc(mut self, command: Command, handler: Arc<dyn CommandHandler>) -> Self {
        if self.handlers.contains_key(&command) {
            self.duplicate.get_or_insert(command);
        } else {
            self.handlers.insert(command, handler);
        }
        self
    }

    /// Register an async closure for `command`.
    pub fn on<F, Fut>(self, command: Command, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(command, FnHandler::new(f))
    }

    pub fn on_start<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::Start, f)
    }

    pub fn on_stop<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::Stop, f)
    }

    pub fn on_pause<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::Pause, f)
    }

    pub fn on_resume<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::Resume, f)
    }

    pub fn on_reload<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::Reload, f)
    }

    pub fn on_health_check<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::HealthCheck, f)
    }

    pub fn on_recover<F, Fut>(self, f: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Command::Recover, f)
    }

    /// Freeze the registry.
    ///
    /// # Errors
    ///
    /// [`BuildError::DuplicateHandler`] for the first command registered twice.
    pub fn build(self) -> Result<HandlerRegistry, BuildError> {
        if let Some(command) = self.duplicate {
            return Err(BuildError::DuplicateHandler(command));
        }
        Ok(HandlerRegistry { handlers: self.handlers })
    }
}
