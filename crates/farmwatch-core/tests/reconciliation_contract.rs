//! Contract Test: Status Reconciliation
//!
//! Constraints verified:
//! - A status that disagrees with the cached intent corrects it
//! - A failed poll never mutates the intent
//! - Mock mode makes zero calls to the live transport and yields the
//!   fixed synthetic status on every poll

mod common;

use common::*;
use farmwatch_core::model::{DeviceState, Settings, SystemStatus};
use farmwatch_core::{EngineEvent, EventSink, ModeRouter, StatusReconciler};
use std::sync::Arc;

#[tokio::test]
async fn disagreeing_status_corrects_intent() {
    let (_backing, _settings, intent) = memory_stores(live_settings("http://x")).await;
    let transport = ScriptedTransport::new();
    transport.set_status(Ok(status_with(DeviceState::Off)));

    let (events, mut rx) = EventSink::channel(16);
    let reconciler = StatusReconciler::new(Arc::new(transport.clone()), intent.clone(), events);

    assert!(intent.enabled(), "intent defaults to enabled");
    let view = reconciler.poll_once().await;

    assert!(!intent.enabled());
    assert!(!view.local_intent);
    assert!(!view.display_enabled);
    assert_eq!(rx.recv().await, Some(EngineEvent::IntentReconciled { enabled: false }));
}

#[tokio::test]
async fn failed_poll_leaves_intent_untouched() {
    let (_backing, _settings, intent) = memory_stores(live_settings("http://x")).await;
    intent.set(false).await.unwrap();

    let transport = ScriptedTransport::new();
    transport.set_status(Err("connection refused".to_string()));
    let reconciler = StatusReconciler::new(Arc::new(transport), intent.clone(), quiet());

    let view = reconciler.poll_once().await;

    assert!(!intent.enabled());
    assert_eq!(view.remote.status, DeviceState::Unknown);
    assert_eq!(view.remote.siren_state, DeviceState::Unknown);
    assert!(!view.display_enabled);
}

#[tokio::test]
async fn agreeing_status_does_not_rewrite_intent() {
    let (_backing, _settings, intent) = memory_stores(live_settings("http://x")).await;
    let transport = ScriptedTransport::new();
    transport.set_status(Ok(status_with(DeviceState::On)));

    let (events, mut rx) = EventSink::channel(16);
    let reconciler = StatusReconciler::new(Arc::new(transport), intent.clone(), events);
    let view = reconciler.poll_once().await;

    assert!(view.display_enabled);
    match rx.recv().await {
        Some(EngineEvent::StatusPolled { display_enabled, .. }) => assert!(display_enabled),
        other => panic!("expected StatusPolled, got {other:?}"),
    }
}

#[tokio::test]
async fn mock_mode_makes_no_network_calls() {
    let (_backing, settings, intent) = memory_stores(Settings::default()).await;
    assert!(settings.get().mock);

    let live = ScriptedTransport::new();
    let router = ModeRouter::new(settings, Arc::new(live.clone()));
    let reconciler = StatusReconciler::new(Arc::new(router), intent, quiet());

    for _ in 0..3 {
        let view = reconciler.poll_once().await;
        assert_eq!(view.remote, SystemStatus::mock_active());
        assert_eq!(view.remote.message.as_deref(), Some("System is active."));
        assert!(view.display_enabled);
    }

    assert_eq!(live.total_calls(), 0);
}
