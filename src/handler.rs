//! Business handlers invoked by the dispatcher.

use crate::args::CommandArgs;
use crate::command::Command;
use crate::state::ComponentState;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// What the dispatcher hands to a handler.
#[derive(Clone, Debug, PartialEq)]
pub struct HandlerContext {
    /// Command being applied.
    pub command: Command,
    /// State the command is applied to.
    pub state: ComponentState,
    /// Opaque arguments, passed through untouched.
    pub args: CommandArgs,
}

/// Outcome of a successful handler run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Transition {
    /// Accept the policy's default resulting state.
    #[default]
    Default,
    /// Override the resulting state.
    To(ComponentState),
    /// Override with a raw wire code; unknown codes are a contract violation.
    Code(i32),
}

/// Failure reported by a handler. The message becomes the dispatch error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Capture any error's `Display` output.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self { message: err.to_string() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

/// Handler result type.
pub type HandlerResult = Result<Transition, HandlerError>;

/// Logic executed for one command kind.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the handler. The dispatcher waits for this to resolve before the
    /// next command is admitted.
    async fn handle(&self, ctx: HandlerContext) -> HandlerResult;
}

/// Adapts an async closure into a [`CommandHandler`].
pub struct FnHandler<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f, _marker: PhantomData }
    }
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F, Fut>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: HandlerContext) -> HandlerResult {
        (self.f)(ctx).await
    }
}

/// Handler that accepts every command with the default transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptHandler;

#[async_trait]
impl CommandHandler for AcceptHandler {
    async fn handle(&self, _ctx: HandlerContext) -> HandlerResult {
        Ok(Transition::Default)
    }
}
