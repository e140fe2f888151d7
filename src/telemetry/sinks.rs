use super::events::LifecycleEvent;
use futures::future::{ready, Ready};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tower::ServiceExt;
use tower_service::Service;

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

/// Default number of events a [`MemorySink`] retains.
pub const DEFAULT_MEMORY_SINK_CAPACITY: usize = 4096;

/// Consumer of lifecycle events.
///
/// Any cloneable `tower::Service<LifecycleEvent>` with an error type
/// qualifies; the dispatcher clones the sink once per event.
pub trait TelemetrySink:
    Service<LifecycleEvent, Response = (), Error = Self::SinkError> + Clone + Send + 'static
{
    type SinkError: std::error::Error + Send + 'static;
}

/// Drive `sink` to readiness and hand it `event`. Errors are dropped.
pub async fn emit_best_effort<S>(sink: S, event: LifecycleEvent)
where
    S: Service<LifecycleEvent, Response = ()> + Send + 'static,
    S::Error: std::error::Error + Send + 'static,
    S::Future: Send + 'static,
{
    match sink.ready_oneshot().await {
        Ok(mut sink) => {
            if let Err(e) = sink.call(event).await {
                tracing::debug!(target: TELEMETRY_TARGET, error = %e, "sink rejected event");
            }
        }
        Err(e) => tracing::debug!(target: TELEMETRY_TARGET, error = %e, "sink not ready"),
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl Service<LifecycleEvent> for NullSink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _event: LifecycleEvent) -> Self::Future {
        ready(Ok(()))
    }
}

impl TelemetrySink for NullSink {
    type SinkError = Infallible;
}

/// Writes each event as a structured `tracing` record.
///
/// Transitions and health checks log at `info`; rejections and handler
/// failures at `warn`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Service<LifecycleEvent> for LogSink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: LifecycleEvent) -> Self::Future {
        match event {
            LifecycleEvent::Transitioned { command, from, to } => {
                tracing::info!(target: TELEMETRY_TARGET, %command, %from, %to, "transitioned");
            }
            LifecycleEvent::Rejected { command, state, kind } => {
                tracing::warn!(target: TELEMETRY_TARGET, %command, %state, %kind, "rejected");
            }
            LifecycleEvent::HandlerFailed { command, from } => {
                tracing::warn!(target: TELEMETRY_TARGET, %command, %from, "handler failed");
            }
            LifecycleEvent::HealthChecked { state } => {
                tracing::info!(target: TELEMETRY_TARGET, %state, "health checked");
            }
        }
        ready(Ok(()))
    }
}

impl TelemetrySink for LogSink {
    type SinkError = Infallible;
}

/// Bounded in-memory buffer of events, oldest evicted first.
///
/// Clones share one buffer, so a test can keep a handle while the
/// dispatcher owns another.
#[derive(Clone, Debug)]
pub struct MemorySink {
    buffer: Arc<Mutex<VecDeque<LifecycleEvent>>>,
    capacity: usize,
    evicted: Arc<AtomicU64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_SINK_CAPACITY)
    }

    /// Buffer at most `capacity` events (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity,
            evicted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of buffered events, oldest first.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.buffer().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.buffer().clear();
    }

    pub fn len(&self) -> usize {
        self.buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    /// Events dropped because the buffer was full.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn push(&self, event: LifecycleEvent) {
        let mut buffer = self.buffer();
        if buffer.len() == self.capacity {
            buffer.pop_front();
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        buffer.push_back(event);
    }

    // Poisoning only means a panic elsewhere; the events are still valid.
    fn buffer(&self) -> MutexGuard<'_, VecDeque<LifecycleEvent>> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<LifecycleEvent> for MemorySink {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: LifecycleEvent) -> Self::Future {
        self.push(event);
        ready(Ok(()))
    }
}

impl TelemetrySink for MemorySink {
    type SinkError = Infallible;
}
