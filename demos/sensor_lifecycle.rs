//! Walk a sensor through its lifecycle over the JSON transport.
use lifeline::prelude::*;
use lifeline::{JsonTransport, LogSink, TransportReply, TransportRouter};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let handlers = HandlerRegistry::builder()
        .on_start(|ctx| async move {
            if ctx.args.flag(canonical::DRY_RUN) {
                Ok(Transition::To(ctx.state))
            } else {
                Ok(Transition::Default)
            }
        })
        .on_pause(|_| async { Ok(Transition::Default) })
        .on_resume(|_| async { Ok(Transition::Default) })
        .on_reload(|ctx| async move {
            match ctx.args.get(canonical::CONFIG) {
                Some(cfg) if cfg.is_object() => Ok(Transition::Default),
                _ => Err(HandlerError::new("reload requires a config object")),
            }
        })
        .on_health_check(|_| async { Ok(Transition::Default) })
        .on_stop(|_| async { Ok(Transition::Default) })
        .on_recover(|_| async { Ok(Transition::Default) });

    let dispatcher = Dispatcher::builder().handlers(handlers).telemetry(LogSink).build()?;
    let router = TransportRouter::new(Arc::new(dispatcher), JsonTransport);

    let frames = [
        r#"{"id":"1","cmd":"start"}"#,
        r#"{"id":"2","cmd":"pause","args":{"reason":"maintenance"}}"#,
        r#"{"id":"3","cmd":"reload","args":{"config":{"sample_rate_hz":10}}}"#,
        r#"{"id":"4","cmd":"reload"}"#,
        r#"{"id":"5","cmd":"recover","args":{"reset":true}}"#,
        r#"{"id":"6","cmd":"health_check","args":{"deep":true}}"#,
    ];

    for frame in frames {
        let bytes = router.handle(frame.as_bytes()).await?;
        let reply: TransportReply = serde_json::from_slice(&bytes)?;
        let (id, r) = (&reply.id, &reply.result);
        match &r.error_message {
            None => println!("[{id}] {}: {} -> {}", r.command, r.previous_state, r.resulting_state),
            Some(msg) => println!("[{id}] {} failed in {}: {msg}", r.command, r.previous_state),
        }
    }

    println!("final: {:?}", router.dispatcher().status());
    Ok(())
}
