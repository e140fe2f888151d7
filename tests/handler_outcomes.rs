mod common;

use common::{accept_all, harness_with, observed_harness};
use lifeline::{
    canonical, Command, ComponentState, FailureKind, HandlerError, HandlerRegistry,
    LifecycleEvent, Transition,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn failing_stop_from_active_lands_in_error() {
    let handlers = HandlerRegistry::builder()
        .on_start(|_| async { Ok(Transition::Default) })
        .on_stop(|_| async { Err::<Transition, _>(HandlerError::new("flush failed: broker gone")) })
        .on_recover(|_| async { Ok(Transition::Default) });
    let harness = harness_with(handlers);
    harness.dispatch_start(None).await;

    let res = harness.dispatch_stop(None).await;
    assert!(!res.success);
    assert_eq!(res.previous_state, ComponentState::Active);
    assert_eq!(res.resulting_state, ComponentState::Error);
    assert_eq!(res.error_kind, Some(FailureKind::HandlerFailure));
    assert_eq!(harness.state(), ComponentState::Error);
    assert_eq!(harness.last_error().as_deref(), Some("flush failed: broker gone"));

    // Still live: RECOVER brings it back and clears the error.
    let recovered = harness.dispatch_recover(None).await;
    assert!(recovered.success);
    assert_eq!(harness.state(), ComponentState::Active);
    assert_eq!(harness.last_error(), None);
}

#[tokio::test]
async fn failure_from_any_command_forces_error() {
    for command in [Command::Start, Command::Pause, Command::Reload, Command::HealthCheck] {
        let handlers = HandlerRegistry::builder()
            .on(command, |_| async { Err::<Transition, _>(HandlerError::new("nope")) });
        let harness = harness_with(handlers);
        let setup = if command == Command::Start {
            ComponentState::Stopped
        } else {
            ComponentState::Active
        };
        harness.set_state(setup).await;
        let res = harness.dispatch(command, None).await;
        assert_eq!(res.resulting_state, ComponentState::Error, "{command}");
        assert!(!res.success);
    }
}

#[tokio::test]
async fn health_check_never_moves_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handlers = HandlerRegistry::builder().on_health_check(move |_| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Transition::Default)
        }
    });
    let harness = harness_with(handlers);
    for state in ComponentState::ALL {
        harness.set_state(state).await;
        let res = harness.dispatch_health_check(Some(canonical::health_check_deep())).await;
        assert!(res.success);
        assert_eq!(res.resulting_state, state);
        assert_eq!(harness.state(), state);
    }
    assert_eq!(calls.load(Ordering::SeqCst), ComponentState::ALL.len());
}

#[tokio::test]
async fn health_check_success_keeps_last_error() {
    let handlers = accept_all();
    let harness = harness_with(handlers);
    harness.dispatch_resume(None).await;
    let before = harness.last_error();
    assert!(before.is_some());
    harness.dispatch_health_check(None).await;
    assert_eq!(harness.last_error(), before);
}

#[tokio::test]
async fn health_check_may_not_override_state() {
    let handlers = HandlerRegistry::builder()
        .on_health_check(|_| async { Ok(Transition::To(ComponentState::Error)) });
    let harness = harness_with(handlers);
    harness.set_state(ComponentState::Active).await;
    let res = harness.dispatch_health_check(None).await;
    assert!(!res.success);
    assert_eq!(res.error_kind, Some(FailureKind::ContractViolation));
    assert_eq!(harness.state(), ComponentState::Active);
}

#[tokio::test]
async fn invalid_override_codes_never_commit() {
    let handlers = HandlerRegistry::builder()
        .on_pause(|_| async { Ok(Transition::Code(17)) })
        .on_resume(|_| async { Ok(Transition::Code(ComponentState::Active.code())) });
    let harness = harness_with(handlers);
    harness.set_state(ComponentState::Active).await;

    let res = harness.dispatch_pause(None).await;
    assert_eq!(res.error_kind, Some(FailureKind::ContractViolation));
    assert_eq!(res.resulting_state, ComponentState::Active);
    assert_eq!(harness.state(), ComponentState::Active);

    harness.set_state(ComponentState::Paused).await;
    let res = harness.dispatch_resume(None).await;
    assert!(res.success);
    assert_eq!(harness.state(), ComponentState::Active);
}

#[tokio::test]
async fn any_enumerated_override_is_committed() {
    let handlers = HandlerRegistry::builder()
        .on_start(|ctx| async move {
            if ctx.args.flag(canonical::DRY_RUN) {
                Ok(Transition::To(ctx.state))
            } else {
                Ok(Transition::Default)
            }
        })
        .on_stop(|_| async { Ok(Transition::To(ComponentState::Unspecified)) });
    let harness = harness_with(handlers);

    let dry = harness.dispatch_start(Some(canonical::start_dry_run())).await;
    assert!(dry.success);
    assert_eq!(harness.state(), ComponentState::Unspecified);

    harness.dispatch_start(None).await;
    let res = harness.dispatch_stop(Some(canonical::stop_forced())).await;
    assert!(res.success, "{res:?}");
    assert_eq!(res.previous_state, ComponentState::Active);
    assert_eq!(res.resulting_state, ComponentState::Unspecified);
    assert_eq!(harness.state(), ComponentState::Unspecified);
    assert_eq!(harness.last_error(), None);
}

#[tokio::test]
async fn recovering_is_left_only_by_arrangement() {
    let handlers = HandlerRegistry::builder()
        .on_recover(|_| async { Ok(Transition::To(ComponentState::Recovering)) })
        .on_stop(|_| async { Ok(Transition::Default) })
        .on_health_check(|_| async { Ok(Transition::Default) });
    let (harness, sink) = observed_harness(handlers);
    harness.set_state(ComponentState::Error).await;

    assert!(harness.dispatch_recover(Some(canonical::recover_with_reset())).await.success);
    assert_eq!(harness.state(), ComponentState::Recovering);

    let stop = harness.dispatch_stop(None).await;
    assert!(!stop.success);
    assert_eq!(stop.error_kind, Some(FailureKind::IllegalTransition));
    assert_eq!(stop.error_message.as_deref(), Some("illegal transition: STOP from RECOVERING"));
    assert!(!harness.dispatch_start(None).await.success);
    assert!(harness.dispatch_health_check(None).await.success);
    assert_eq!(harness.state(), ComponentState::Recovering);

    harness.set_state(ComponentState::Active).await;
    assert!(harness.dispatch_stop(None).await.success);
    assert_eq!(harness.state(), ComponentState::Stopped);

    let events = sink.events();
    assert_eq!(
        events.first(),
        Some(&LifecycleEvent::Transitioned {
            command: Command::Recover,
            from: ComponentState::Error,
            to: ComponentState::Recovering,
        })
    );
    assert_eq!(
        events.get(1),
        Some(&LifecycleEvent::Rejected {
            command: Command::Stop,
            state: ComponentState::Recovering,
            kind: FailureKind::IllegalTransition,
        })
    );
}

#[tokio::test]
async fn handlers_receive_args_untouched() {
    let handlers = HandlerRegistry::builder().on_reload(|ctx| async move {
        let config = ctx.args.get(canonical::CONFIG).cloned();
        if config == Some(serde_json::json!({ "sample_rate_hz": 10 })) {
            Ok(Transition::Default)
        } else {
            Err(HandlerError::new(format!("unexpected args: {:?}", ctx.args)))
        }
    });
    let harness = harness_with(handlers);
    harness.set_state(ComponentState::Paused).await;
    let res = harness.dispatch_reload(Some(canonical::reload_with_config())).await;
    assert!(res.success, "{res:?}");
    assert_eq!(harness.state(), ComponentState::Paused);
}
