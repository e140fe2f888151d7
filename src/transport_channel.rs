//! In-process transport backed by a single dispatch worker task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::dispatcher::{DispatchRequest, Dispatcher};
use crate::result::DispatchResult;
use crate::transport::TRANSPORT_TARGET;

type Tx = mpsc::Sender<(DispatchRequest, oneshot::Sender<DispatchResult>)>;

/// Errors from the channel transport.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The worker has shut down.
    #[error("dispatch worker closed")]
    Closed,
    /// The worker dropped the reply.
    #[error("dispatch reply dropped")]
    ReplyDropped,
}

/// In-process channel transport: one worker task owns the dispatch loop.
///
/// A request that has been queued is dispatched to completion even if the
/// sender stops waiting for the reply.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: Tx,
}

impl ChannelTransport {
    /// Create a channel transport and spawn a worker to drive the dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(dispatcher: Arc<Dispatcher>, capacity: usize) -> Self {
        let (tx, mut rx) =
            mpsc::channel::<(DispatchRequest, oneshot::Sender<DispatchResult>)>(capacity.max(1));
        tokio::spawn(async move {
            while let Some((req, reply_tx)) = rx.recv().await {
                let result = dispatcher.dispatch_request(req).await;
                if reply_tx.send(result).is_err() {
                    debug!(target: TRANSPORT_TARGET, "caller abandoned dispatch reply");
                }
            }
        });
        Self { tx }
    }

    /// Queue a request and await its result.
    pub async fn send(&self, req: DispatchRequest) -> Result<DispatchResult, ChannelError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx.send((req, resp_tx)).await.map_err(|_| ChannelError::Closed)?;
        resp_rx.await.map_err(|_| ChannelError::ReplyDropped)
    }
}
