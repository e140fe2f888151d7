//! Lifecycle telemetry.
//!
//! The dispatcher emits a [`LifecycleEvent`] for every dispatch once the
//! outcome is committed. Events flow through `TelemetrySink`
//! implementations, which are `tower::Service<LifecycleEvent>` so they
//! compose like any other service. Emission is best-effort: sink errors never
//! affect dispatch.

pub mod events;
pub mod sinks;

pub use events::LifecycleEvent;
pub use sinks::{emit_best_effort, LogSink, MemorySink, NullSink, TelemetrySink};
