//! Contract Test: Feed Session
//!
//! Constraints verified:
//! - The session connects exactly when the resolved URL changes
//! - Settings changes that keep the URL do not reconnect
//! - An empty resolution holds no connection
//! - A failed connection is reported once and not retried
//! - `remount` forces a fresh connection to the same URL

mod common;

use common::*;
use farmwatch_core::model::{Settings, SettingsPatch};
use farmwatch_core::{EngineEvent, EventSink, FeedSession};
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn reconnects_only_when_resolved_url_changes() {
    let (_backing, settings, _intent) = memory_stores(live_settings("http://10.0.0.2:8000")).await;
    let connector = RecordingConnector::new();
    let session = FeedSession::start(&settings, Arc::new(connector.clone()), quiet());
    settle().await;

    assert_eq!(connector.opened(), vec!["http://10.0.0.2:8000/camera/live_feed"]);
    assert_eq!(session.current_url(), "http://10.0.0.2:8000/camera/live_feed");

    // Irrelevant to the URL while live with an API base URL
    settings
        .update(SettingsPatch::default().stream_url("rtsp://ignored").bg_url("http://bg"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(connector.opened().len(), 1);

    settings
        .update(SettingsPatch::default().api_base_url("http://10.0.0.3:8000"))
        .await
        .unwrap();
    settle().await;

    assert_eq!(
        connector.opened(),
        vec![
            "http://10.0.0.2:8000/camera/live_feed",
            "http://10.0.0.3:8000/camera/live_feed",
        ]
    );

    session.stop().await;
}

#[tokio::test]
async fn empty_resolution_holds_no_connection() {
    let defaults = Settings {
        stream_url: String::new(),
        ..Settings::default()
    };
    let (_backing, settings, _intent) = memory_stores(defaults).await;
    let connector = RecordingConnector::new();
    let (events, mut rx) = EventSink::channel(16);

    let session = FeedSession::start(&settings, Arc::new(connector.clone()), events);
    settle().await;

    assert!(connector.opened().is_empty());
    assert_eq!(session.current_url(), "");
    assert_eq!(rx.recv().await, Some(EngineEvent::FeedNotConfigured));

    settings
        .update(SettingsPatch::default().stream_url("http://192.168.43.77/stream"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(connector.opened(), vec!["http://192.168.43.77/stream"]);

    session.stop().await;
}

#[tokio::test]
async fn failed_connection_is_not_retried() {
    let (_backing, settings, _intent) = memory_stores(live_settings("http://10.0.0.2:8000")).await;
    let connector = RecordingConnector::new();
    connector.fail_with("connection refused");
    let (events, mut rx) = EventSink::channel(16);

    let session = FeedSession::start(&settings, Arc::new(connector.clone()), events);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(connector.opened().len(), 1);
    let url = "http://10.0.0.2:8000/camera/live_feed".to_string();
    assert_eq!(rx.recv().await, Some(EngineEvent::FeedResolved { url: url.clone() }));
    match rx.recv().await {
        Some(EngineEvent::FeedFailed { url: failed, error }) => {
            assert_eq!(failed, url);
            assert!(error.contains("connection refused"));
        }
        other => panic!("expected FeedFailed, got {other:?}"),
    }
    assert_eq!(
        settings.get(),
        live_settings("http://10.0.0.2:8000"),
        "failure does not touch settings"
    );

    session.stop().await;
}

#[tokio::test]
async fn remount_forces_fresh_connection() {
    let (_backing, settings, _intent) = memory_stores(live_settings("http://10.0.0.2:8000")).await;
    let connector = RecordingConnector::new();
    let session = FeedSession::start(&settings, Arc::new(connector.clone()), quiet());
    settle().await;

    session.remount();
    settle().await;

    assert_eq!(connector.opened().len(), 2);
    assert_eq!(connector.opened()[0], connector.opened()[1]);

    session.stop().await;
}
