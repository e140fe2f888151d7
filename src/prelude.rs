//! Convenient re-exports for common lifeline types.
pub use crate::{
    args::{canonical, CommandArgs},
    command::Command,
    config::DispatcherConfig,
    dispatcher::{DispatchRequest, Dispatcher, DispatcherBuilder},
    error::{DispatchError, FailureKind},
    handler::{CommandHandler, HandlerContext, HandlerError, HandlerResult, Transition},
    policy::TransitionPolicy,
    registry::{BuildError, HandlerRegistry},
    result::DispatchResult,
    state::ComponentState,
    store::Status,
};

#[cfg(any(test, feature = "test-harness"))]
pub use crate::harness::Harness;
