//! Contract Test: Control Actuators
//!
//! Constraints verified:
//! - The system intent is written before the request resolves, and a later
//!   poll reporting OFF corrects it
//! - A second request while one is in flight is a no-op
//! - A failed siren toggle leaves the displayed siren state unchanged
//! - Mock mode siren toggles succeed without touching the live transport

mod common;

use common::*;
use farmwatch_core::model::{DeviceState, Settings, SirenAction, SirenToggleResponse};
use farmwatch_core::{
    ActuatorOutcome, ModeRouter, SirenActuator, StatusReconciler, SystemActuator,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn system_toggle_is_optimistic_then_reconciled() {
    let (_backing, _settings, intent) = memory_stores(live_settings("http://x")).await;
    intent.set(false).await.unwrap();

    let transport = ScriptedTransport::gated();
    let actuator = SystemActuator::new(Arc::new(transport.clone()), intent.clone(), quiet());
    let reconciler = StatusReconciler::new(Arc::new(transport.clone()), intent.clone(), quiet());

    let pending = tokio::spawn({
        let actuator = actuator.clone();
        async move { actuator.toggle().await }
    });

    // Wait until the request reached the transport
    while transport.set_system_calls() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(actuator.is_in_flight());
    assert!(intent.enabled(), "intent is written before the request resolves");
    assert!(reconciler.view().display_enabled);

    transport.release();
    let outcome = pending.await.unwrap();
    assert!(outcome.is_applied());
    assert!(!actuator.is_in_flight());

    transport.set_status(Ok(status_with(DeviceState::Off)));
    let view = reconciler.poll_once().await;
    assert!(!intent.enabled());
    assert!(!view.display_enabled);
}

#[tokio::test]
async fn second_request_while_in_flight_is_busy() {
    let (_backing, _settings, intent) = memory_stores(live_settings("http://x")).await;
    let transport = ScriptedTransport::gated();
    let actuator = SystemActuator::new(Arc::new(transport.clone()), intent, quiet());

    let first = tokio::spawn({
        let actuator = actuator.clone();
        async move { actuator.request(false).await }
    });
    while transport.set_system_calls() == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(actuator.request(true).await, ActuatorOutcome::Busy);
    assert_eq!(transport.set_system_calls(), 1, "busy request is not sent");

    transport.release();
    assert!(first.await.unwrap().is_applied());
}

#[tokio::test]
async fn failed_system_request_keeps_optimistic_write() {
    let (_backing, _settings, intent) = memory_stores(live_settings("http://x")).await;
    let transport = ScriptedTransport::new();
    transport.set_system_result(Err("timeout".to_string()));
    let actuator = SystemActuator::new(Arc::new(transport), intent.clone(), quiet());

    let outcome = actuator.request(false).await;

    assert!(matches!(outcome, ActuatorOutcome::Failed(_)));
    assert!(!intent.enabled());
    assert!(!actuator.is_in_flight());
}

#[tokio::test]
async fn failed_siren_toggle_leaves_state_unchanged() {
    let transport = ScriptedTransport::new();
    transport.set_siren_reply(Ok(SirenToggleResponse {
        success: false,
        siren_state: None,
        message: None,
    }));
    let actuator = SirenActuator::new(Arc::new(transport.clone()), quiet());

    let outcome = actuator.toggle().await;

    assert_eq!(
        outcome,
        ActuatorOutcome::Failed("Failed to toggle siren: Unknown error".to_string())
    );
    assert!(!actuator.is_on());

    transport.set_siren_reply(Err("connection reset".to_string()));
    assert!(matches!(actuator.toggle().await, ActuatorOutcome::Failed(_)));
    assert!(!actuator.is_on());
    assert_eq!(transport.siren_calls(), 2);
}

#[tokio::test]
async fn successful_siren_toggle_flips_display() {
    let transport = ScriptedTransport::new();
    transport.set_siren_reply(Ok(SirenToggleResponse::mock_success(SirenAction::On)));
    let actuator = SirenActuator::new(Arc::new(transport), quiet());

    assert!(actuator.toggle().await.is_applied());
    assert!(actuator.is_on());
}

#[tokio::test]
async fn mock_siren_toggle_skips_live_transport() {
    let (_backing, settings, _intent) = memory_stores(Settings::default()).await;
    let live = ScriptedTransport::new();
    let router = ModeRouter::new(settings, Arc::new(live.clone()));
    let actuator = SirenActuator::new(Arc::new(router), quiet());

    match actuator.toggle().await {
        ActuatorOutcome::Applied(reply) => {
            assert!(reply.success);
            assert_eq!(reply.siren_state, Some(DeviceState::On));
            assert_eq!(reply.message.as_deref(), Some("Siren turned ON"));
        }
        other => panic!("expected Applied, got {other:?}"),
    }
    assert!(actuator.is_on());
    assert_eq!(live.total_calls(), 0);
}
