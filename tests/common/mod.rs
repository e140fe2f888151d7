#![allow(dead_code)]

use lifeline::{
    Command, ComponentState, Dispatcher, DispatcherConfig, HandlerRegistry,
    HandlerRegistryBuilder, Harness, MemorySink, Transition,
};

/// Registry where every command accepts the policy default.
pub fn accept_all() -> HandlerRegistryBuilder {
    Command::ALL
        .into_iter()
        .fold(HandlerRegistry::builder(), |b, cmd| b.on(cmd, |_| async { Ok(Transition::Default) }))
}

pub fn harness_with(handlers: HandlerRegistryBuilder) -> Harness {
    Harness::new(Dispatcher::builder().handlers(handlers).build().expect("dispatcher"))
}

pub fn harness_with_config(handlers: HandlerRegistryBuilder, config: DispatcherConfig) -> Harness {
    Harness::new(
        Dispatcher::builder().config(config).handlers(handlers).build().expect("dispatcher"),
    )
}

pub fn observed_harness(handlers: HandlerRegistryBuilder) -> (Harness, MemorySink) {
    let sink = MemorySink::new();
    let dispatcher = Dispatcher::builder()
        .handlers(handlers)
        .telemetry(sink.clone())
        .build()
        .expect("dispatcher");
    (Harness::new(dispatcher), sink)
}

/// The transition table, written out independently of the policy module.
pub fn expected_next(state: ComponentState, command: Command) -> Option<ComponentState> {
    use ComponentState::*;
    match (command, state) {
        (Command::Start, Unspecified | Stopped) => Some(Active),
        (Command::Stop, Active | Paused | Error) => Some(Stopped),
        (Command::Pause, Active) => Some(Paused),
        (Command::Resume, Paused) => Some(Active),
        (Command::Reload, Active | Paused) => Some(state),
        (Command::HealthCheck, _) => Some(state),
        (Command::Recover, Error) => Some(Active),
        _ => None,
    }
}
