//! Dispatch engine: serializes commands, consults the policy, runs handlers,
//! and commits the outcome.
//!
//! Every call to [`Dispatcher::dispatch`] runs as one critical section
//! spanning policy check, handler execution, and commit. A second caller
//! waits until the first result is committed, so no two dispatches can act on
//! the same stale `previous_state`.
//!
//! `dispatch` never returns an error and never panics; all failures surface
//! as `success == false` on the returned [`DispatchResult`].

use crate::args::CommandArgs;
use crate::command::Command;
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::handler::{HandlerContext, Transition};
use crate::history::{DispatchHistory, InMemoryHistory};
use crate::policy::{TransitionPolicy, Verdict};
use crate::registry::{BuildError, HandlerRegistry, HandlerRegistryBuilder};
use crate::result::DispatchResult;
use crate::state::ComponentState;
use crate::store::{StateStore, Status};
use crate::telemetry::{emit_best_effort, LifecycleEvent, NullSink, TelemetrySink};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Mutex;
use tower_service::Service;
use tracing::{debug, error, warn};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

type EmitFn = Arc<dyn Fn(LifecycleEvent) -> BoxFuture<'static, ()> + Send + Sync>;

fn emitter<S>(sink: S) -> EmitFn
where
    S: TelemetrySink + Sync,
    S::Future: Send + 'static,
{
    Arc::new(move |event| emit_best_effort(sink.clone(), event).boxed())
}

/// One inbound command, as handed over by a transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Command to apply.
    pub command: Command,
    /// Opaque arguments for the handler.
    #[serde(default)]
    pub args: CommandArgs,
}

impl DispatchRequest {
    pub fn new(command: Command, args: CommandArgs) -> Self {
        Self { command, args }
    }
}

/// Lifecycle command dispatcher.
///
/// Build once at startup with [`Dispatcher::builder`], share behind an
/// `Arc`, and drop at shutdown.
pub struct Dispatcher {
    policy: TransitionPolicy,
    registry: HandlerRegistry,
    store: StateStore,
    gate: Mutex<()>,
    history: Arc<dyn DispatchHistory>,
    emit: EmitFn,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .field("registry", &self.registry)
            .field("status", &self.store.status())
            .finish()
    }
}

impl Dispatcher {
    /// Start a builder with default config and no handlers.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Dispatcher with default config over a prebuilt registry.
    pub fn new(registry: HandlerRegistry) -> Self {
        let config = DispatcherConfig::default();
        Self::assemble(
            config.policy(),
            registry,
            Arc::new(InMemoryHistory::with_capacity(config.history_capacity())),
            emitter(NullSink),
        )
    }

    fn assemble(
        policy: TransitionPolicy,
        registry: HandlerRegistry,
        history: Arc<dyn DispatchHistory>,
        emit: EmitFn,
    ) -> Self {
        Self { policy, registry, store: StateStore::new(), gate: Mutex::new(()), history, emit }
    }

    /// Apply `command` to the state machine.
    ///
    /// Runs in the caller's task. Dropping the returned future before it
    /// resolves abandons the dispatch: nothing is committed and the gate is
    /// released. Callers that may give up early (timeouts, cancelled RPCs)
    /// should go through [`DispatchService`], [`TransportRouter`], or
    /// [`ChannelTransport`], which run the dispatch on its own task.
    ///
    /// [`TransportRouter`]: crate::transport::TransportRouter
    /// [`ChannelTransport`]: crate::transport_channel::ChannelTransport
    pub async fn dispatch(&self, command: Command, args: CommandArgs) -> DispatchResult {
        let _guard = self.gate.lock().await;
        let previous = self.store.state();

        let default_next = match self.policy.evaluate(previous, command) {
            Verdict::Allowed(next) => next,
            Verdict::Rejected => {
                let err = DispatchError::IllegalTransition { command, state: previous };
                return self.reject(command, previous, err).await;
            }
        };

        let Some(handler) = self.registry.lookup(command) else {
            let err = DispatchError::UnhandledCommand { command };
            return self.reject(command, previous, err).await;
        };

        let ctx = HandlerContext { command, state: previous, args };
        match AssertUnwindSafe(handler.handle(ctx)).catch_unwind().await {
            Ok(Ok(transition)) => match self.resolve(command, previous, default_next, transition) {
                Ok(next) => self.succeed(command, previous, next).await,
                Err(err) => self.reject(command, previous, err).await,
            },
            Ok(Err(handler_err)) => {
                let message = handler_err.to_string();
                self.fail(command, previous, DispatchError::HandlerFailure { command, message })
                    .await
            }
            Err(panic) => {
                let message =
                    format!("handler for {command} panicked: {}", panic_message(&*panic));
                self.fail(command, previous, DispatchError::HandlerFailure { command, message })
                    .await
            }
        }
    }

    /// Dispatch a transport request.
    pub async fn dispatch_request(&self, request: DispatchRequest) -> DispatchResult {
        self.dispatch(request.command, request.args).await
    }

    /// Current state. Never blocks, never observes a half-applied commit.
    pub fn current_state(&self) -> ComponentState {
        self.store.state()
    }

    /// Most recent failure description, if any.
    pub fn last_error_message(&self) -> Option<String> {
        self.store.last_error()
    }

    /// State and last error read together.
    pub fn status(&self) -> Status {
        (*self.store.status()).clone()
    }

    /// Retained dispatch results, oldest first.
    pub async fn history(&self) -> Vec<DispatchResult> {
        self.history.list().await
    }

    pub fn policy(&self) -> &TransitionPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// `tower::Service` handle sharing this dispatcher.
    pub fn service(self: &Arc<Self>) -> DispatchService {
        DispatchService { inner: Arc::clone(self) }
    }

    /// Force the state for test arrangement. Waits for any in-flight dispatch,
    /// runs no handler, and leaves the error slot, history, and telemetry
    /// untouched.
    pub(crate) async fn arrange(&self, state: ComponentState) {
        let _guard = self.gate.lock().await;
        debug!(target: DISPATCH_TARGET, to = %state, "state arranged");
        self.store.arrange(state);
    }

    fn resolve(
        &self,
        command: Command,
        previous: ComponentState,
        default_next: ComponentState,
        transition: Transition,
    ) -> Result<ComponentState, DispatchError> {
        let next = match transition {
            Transition::Default => return Ok(default_next),
            Transition::To(state) => state,
            Transition::Code(code) => ComponentState::from_code(code)
                .map_err(|_| DispatchError::invalid_code(command, code))?,
        };
        if command == Command::HealthCheck && next != previous {
            return Err(DispatchError::forbidden_override(command, next));
        }
        Ok(next)
    }

    async fn succeed(
        &self,
        command: Command,
        previous: ComponentState,
        next: ComponentState,
    ) -> DispatchResult {
        let event = if command == Command::HealthCheck {
            LifecycleEvent::HealthChecked { state: previous }
        } else {
            self.store.commit(next, None);
            LifecycleEvent::Transitioned { command, from: previous, to: next }
        };
        debug!(
            target: DISPATCH_TARGET,
            %command, from = %previous, to = %next,
            "dispatch succeeded"
        );
        self.finish(DispatchResult::succeeded(command, previous, next), event).await
    }

    async fn reject(
        &self,
        command: Command,
        previous: ComponentState,
        err: DispatchError,
    ) -> DispatchResult {
        warn!(
            target: DISPATCH_TARGET,
            %command, state = %previous, error = %err,
            "dispatch rejected"
        );
        self.store.record_error(err.to_string());
        let event = LifecycleEvent::Rejected { command, state: previous, kind: err.kind() };
        self.finish(DispatchResult::failed(command, previous, previous, &err), event).await
    }

    async fn fail(
        &self,
        command: Command,
        previous: ComponentState,
        err: DispatchError,
    ) -> DispatchResult {
        error!(target: DISPATCH_TARGET, %command, from = %previous, error = %err, "handler failed");
        self.store.commit(ComponentState::Error, Some(err.to_string()));
        let event = LifecycleEvent::HandlerFailed { command, from: previous };
        self.finish(DispatchResult::failed(command, previous, ComponentState::Error, &err), event)
            .await
    }

    async fn finish(&self, result: DispatchResult, event: LifecycleEvent) -> DispatchResult {
        self.history.append(&result).await;
        (self.emit)(event).await;
        result
    }
}

/// Dispatch on a dedicated task and wait for its result.
///
/// The caller's future only awaits the join handle, so dropping it leaves the
/// dispatch running until it commits.
pub(crate) async fn dispatch_detached(
    dispatcher: Arc<Dispatcher>,
    command: Command,
    args: CommandArgs,
) -> DispatchResult {
    let task = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.dispatch(command, args).await }
    });
    match task.await {
        Ok(result) => result,
        Err(join_err) => {
            error!(target: DISPATCH_TARGET, %command, error = %join_err, "dispatch task aborted");
            let state = dispatcher.current_state();
            let err = DispatchError::HandlerFailure {
                command,
                message: format!("dispatch of {command} aborted: {join_err}"),
            };
            DispatchResult::failed(command, state, state, &err)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    handlers: Option<HandlerRegistryBuilder>,
    registry: Option<HandlerRegistry>,
    history: Option<Arc<dyn DispatchHistory>>,
    emit: EmitFn,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            config: DispatcherConfig::default(),
            handlers: None,
            registry: None,
            history: None,
            emit: emitter(NullSink),
        }
    }
}

impl DispatcherBuilder {
    /// Use this config (policy variant, history capacity).
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Register handlers; duplicates are reported by [`build`](Self::build).
    pub fn handlers(mut self, handlers: HandlerRegistryBuilder) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Use an already built registry. Takes precedence over [`handlers`](Self::handlers).
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the default in-memory history.
    pub fn history<H: DispatchHistory + 'static>(mut self, history: H) -> Self {
        self.history = Some(Arc::new(history));
        self
    }

    /// Send lifecycle events to `sink`.
    pub fn telemetry<S>(mut self, sink: S) -> Self
    where
        S: TelemetrySink + Sync,
        S::Future: Send + 'static,
    {
        self.emit = emitter(sink);
        self
    }

    /// Validate and construct.
    ///
    /// # Errors
    ///
    /// [`BuildError::DuplicateHandler`] for a command registered twice, or
    /// [`BuildError::InvalidConfig`] if the config fails validation.
    pub fn build(self) -> Result<Dispatcher, BuildError> {
        self.config.validate()?;
        let registry = match (self.registry, self.handlers) {
            (Some(registry), _) => registry,
            (None, Some(handlers)) => handlers.build()?,
            (None, None) => HandlerRegistry::default(),
        };
        let capacity = self.config.history_capacity();
        let history =
            self.history.unwrap_or_else(|| Arc::new(InMemoryHistory::with_capacity(capacity)));
        Ok(Dispatcher::assemble(self.config.policy(), registry, history, self.emit))
    }
}

/// `tower::Service` over [`DispatchRequest`]. Clones share one dispatcher.
#[derive(Clone, Debug)]
pub struct DispatchService {
    inner: Arc<Dispatcher>,
}

impl DispatchService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { inner: dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner
    }
}

impl Service<DispatchRequest> for DispatchService {
    type Response = DispatchResult;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<DispatchResult, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DispatchRequest) -> Self::Future {
        let dispatcher = Arc::clone(&self.inner);
        Box::pin(async move { Ok(dispatch_detached(dispatcher, req.command, req.args).await) })
    }
}
