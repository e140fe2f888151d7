#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # lifeline
//!
//! Lifecycle command dispatch for long-lived sensor processes.
//!
//! A remote orchestrator sends `START`, `STOP`, `PAUSE`, `RESUME`, `RELOAD`,
//! `HEALTH_CHECK` and `RECOVER`. The [`Dispatcher`] turns each into exactly
//! one race-free state transition:
//!
//! - **Transition policy**: a static table decides which commands are legal
//!   from which [`ComponentState`] and where they lead by default
//! - **Handler registry**: at most one business handler per command, frozen
//!   at startup
//! - **Dispatch engine**: one command at a time; policy check, handler run
//!   and commit form a single critical section
//! - **State store**: lock-free reads of the committed state and last error
//!
//! Failures never escape as errors or panics; they come back as a failed
//! [`DispatchResult`] so the machine always accepts the next command.
//!
//! ## Quick Start
//!
//! ```rust
//! use lifeline::{Command, CommandArgs, ComponentState, Dispatcher, HandlerRegistry, Transition};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let handlers = HandlerRegistry::builder()
//!         .on_start(|ctx| async move {
//!             // open sockets, spawn samplers, ...
//!             let _ = ctx.args;
//!             Ok(Transition::Default)
//!         })
//!         .on_stop(|_| async { Ok(Transition::Default) });
//!
//!     let dispatcher = Dispatcher::builder().handlers(handlers).build().expect("valid registry");
//!
//!     let res = dispatcher.dispatch(Command::Start, CommandArgs::new()).await;
//!     assert!(res.success);
//!     assert_eq!(dispatcher.current_state(), ComponentState::Active);
//! }
//! ```

pub mod args;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
#[cfg(any(test, feature = "test-harness"))]
pub mod harness;
pub mod history;
pub mod policy;
pub mod prelude;
pub mod registry;
pub mod result;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod transport;
pub mod transport_channel;

// Re-exports
pub use args::{canonical, CommandArgs, InvalidArgs};
pub use command::{Command, ParseCommandError};
pub use config::{ConfigError, DispatcherConfig};
pub use dispatcher::{DispatchRequest, DispatchService, Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, FailureKind};
pub use handler::{
    AcceptHandler, CommandHandler, FnHandler, HandlerContext, HandlerError, HandlerResult,
    Transition,
};
#[cfg(any(test, feature = "test-harness"))]
pub use harness::Harness;
pub use history::{DispatchHistory, InMemoryHistory};
pub use policy::{TransitionPolicy, Verdict};
pub use registry::{BuildError, HandlerRegistry, HandlerRegistryBuilder};
pub use result::DispatchResult;
pub use state::{ComponentState, InvalidStateCode};
pub use store::{StateStore, Status};
pub use telemetry::{LifecycleEvent, LogSink, MemorySink, NullSink, TelemetrySink};
pub use transport::{
    JsonTransport, Transport, TransportEnvelope, TransportError, TransportReply, TransportRouter,
};
pub use transport_channel::{ChannelError, ChannelTransport};
