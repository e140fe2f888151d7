//! Transport boundary.
//!
//! Transports (gRPC, JSONL over a pipe, etc.) map inbound frames to the
//! canonical [`TransportEnvelope`] and encode a [`TransportReply`] back out.
//! The dispatcher never sees the wire; [`TransportRouter`] glues the two
//! together.

use crate::args::{CommandArgs, InvalidArgs};
use crate::command::{Command, ParseCommandError};
use crate::dispatcher::{dispatch_detached, Dispatcher};
use crate::result::DispatchResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Tracing target for transport operations.
pub(crate) const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Canonical inbound message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransportEnvelope {
    /// Request identifier, echoed in the reply.
    pub id: String,
    /// Command label (e.g. `"health_check"`).
    pub cmd: String,
    /// Arbitrary JSON args for the command.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Canonical outbound message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransportReply {
    /// Identifier of the request this answers.
    pub id: String,
    /// Dispatch outcome.
    pub result: DispatchResult,
}

/// Transport abstraction for encoding/decoding control messages.
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode a raw frame into an envelope.
    fn decode(&self, raw: &[u8]) -> Result<TransportEnvelope, Self::Error>;

    /// Encode a reply into an outgoing frame.
    fn encode(&self, reply: &TransportReply) -> Result<Vec<u8>, Self::Error>;
}

/// JSON framing via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonTransport;

impl Transport for JsonTransport {
    type Error = serde_json::Error;

    fn decode(&self, raw: &[u8]) -> Result<TransportEnvelope, Self::Error> {
        serde_json::from_slice(raw)
    }

    fn encode(&self, reply: &TransportReply) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(reply)
    }
}

/// Failures before a command reaches the dispatcher, or while encoding the
/// reply. Dispatch outcomes themselves are never errors here.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// Frame could not be decoded.
    #[error("decode: {0}")]
    Decode(String),
    /// Reply could not be encoded.
    #[error("encode: {0}")]
    Encode(String),
    /// Label does not name a lifecycle command.
    #[error(transparent)]
    UnknownCommand(#[from] ParseCommandError),
    /// Arguments were not a JSON object.
    #[error(transparent)]
    InvalidArgs(#[from] InvalidArgs),
}

/// Decodes frames, dispatches, and encodes replies.
pub struct TransportRouter<T> {
    dispatcher: Arc<Dispatcher>,
    transport: T,
}

impl<T: Transport> TransportRouter<T> {
    pub fn new(dispatcher: Arc<Dispatcher>, transport: T) -> Self {
        Self { dispatcher, transport }
    }

    /// Handle one inbound frame and return the encoded reply.
    pub async fn handle(&self, raw: &[u8]) -> Result<Vec<u8>, TransportError> {
        let envelope = self.transport.decode(raw).map_err(|e| {
            warn!(target: TRANSPORT_TARGET, error = %e, "failed to decode frame");
            TransportError::Decode(e.to_string())
        })?;
        let command = Command::parse(&envelope.cmd)?;
        let args = CommandArgs::try_from(envelope.args)?;
        let result = dispatch_detached(Arc::clone(&self.dispatcher), command, args).await;
        let reply = TransportReply { id: envelope.id, result };
        self.transport.encode(&reply).map_err(|e| TransportError::Encode(e.to_string()))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Transition;
    use crate::registry::HandlerRegistry;
    use crate::state::ComponentState;
    use serde_json::json;

    fn router() -> TransportRouter<JsonTransport> {
        let handlers = HandlerRegistry::builder().on_start(|ctx| async move {
            assert_eq!(ctx.args.get("dry_run"), Some(&json!(true)));
            Ok(Transition::Default)
        });
        let dispatcher = Dispatcher::builder().handlers(handlers).build().expect("dispatcher");
        TransportRouter::new(Arc::new(dispatcher), JsonTransport)
    }

    #[tokio::test]
    async fn round_trip_start() {
        let router = router();
        let raw = json!({ "id": "cmd-1", "cmd": "start", "args": { "dry_run": true } }).to_string();
        let bytes = router.handle(raw.as_bytes()).await.expect("reply");
        let reply: TransportReply = serde_json::from_slice(&bytes).expect("decode reply");
        assert_eq!(reply.id, "cmd-1");
        assert!(reply.result.success);
        assert_eq!(reply.result.resulting_state, ComponentState::Active);
    }

    #[tokio::test]
    async fn unknown_label_never_dispatches() {
        let router = router();
        let raw = json!({ "id": "cmd-2", "cmd": "reboot" }).to_string();
        let err = router.handle(raw.as_bytes()).await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownCommand(_)));
        assert!(router.dispatcher().history().await.is_empty());
    }

    #[tokio::test]
    async fn garbage_frames_are_decode_errors() {
        let err = router().handle(b"not json").await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn non_object_args_are_rejected() {
        let raw = json!({ "id": "cmd-3", "cmd": "start", "args": [1] }).to_string();
        let err = router().handle(raw.as_bytes()).await.unwrap_err();
        assert_eq!(err.to_string(), "command arguments must be a JSON object, got array");
    }
}
