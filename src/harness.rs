//! Test harness: drive the dispatcher directly, bypassing any transport.
//!
//! The harness is the only public way to force a state
//! ([`Harness::set_state`]). It is compiled only with the `test-harness`
//! feature; production code holds a [`Dispatcher`], which exposes no such
//! operation.
//!
//! ```
//! use lifeline::{ComponentState, Dispatcher, Harness, HandlerRegistry, Transition};
//!
//! # tokio_test_block_on(async {
//! let handlers = HandlerRegistry::builder().on_pause(|_| async { Ok(Transition::Default) });
//! let harness = Harness::new(Dispatcher::builder().handlers(handlers).build().unwrap());
//! harness.set_state(ComponentState::Active).await;
//! let res = harness.dispatch_pause(None).await;
//! assert_eq!(res.resulting_state, ComponentState::Paused);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use crate::args::{canonical, CommandArgs};
use crate::command::Command;
use crate::dispatcher::{dispatch_detached, Dispatcher};
use crate::result::DispatchResult;
use crate::state::ComponentState;
use std::sync::Arc;

/// Direct-call wrapper around a shared [`Dispatcher`].
#[derive(Clone, Debug)]
pub struct Harness {
    dispatcher: Arc<Dispatcher>,
}

impl Harness {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher: Arc::new(dispatcher) }
    }

    /// Wrap a dispatcher that is also shared elsewhere.
    pub fn from_shared(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Dispatch `command`; `None` means the canonical default arguments.
    ///
    /// The dispatch runs on its own task, so a test that times out waiting
    /// still sees the commit afterwards.
    pub async fn dispatch(&self, command: Command, args: Option<CommandArgs>) -> DispatchResult {
        let args = args.unwrap_or_else(|| canonical::default_for(command));
        dispatch_detached(Arc::clone(&self.dispatcher), command, args).await
    }

    pub async fn dispatch_start(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::Start, args).await
    }

    pub async fn dispatch_stop(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::Stop, args).await
    }

    pub async fn dispatch_pause(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::Pause, args).await
    }

    pub async fn dispatch_resume(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::Resume, args).await
    }

    pub async fn dispatch_reload(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::Reload, args).await
    }

    pub async fn dispatch_health_check(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::HealthCheck, args).await
    }

    pub async fn dispatch_recover(&self, args: Option<CommandArgs>) -> DispatchResult {
        self.dispatch(Command::Recover, args).await
    }

    /// Force the state. Runs no handler; last error, history, and telemetry
    /// are left untouched.
    pub async fn set_state(&self, state: ComponentState) {
        self.dispatcher.arrange(state).await;
    }

    pub fn state(&self) -> ComponentState {
        self.dispatcher.current_state()
    }

    pub fn last_error(&self) -> Option<String> {
        self.dispatcher.last_error_message()
    }

    pub async fn history(&self) -> Vec<DispatchResult> {
        self.dispatcher.history().await
    }
}
