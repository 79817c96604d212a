//! Live feed resolution and session management
//!
//! [`resolve`] picks the feed URL from the current settings. A
//! [`FeedSession`] follows the settings and keeps exactly one connection open
//! to the resolved URL, replacing it whenever the URL changes.

use std::sync::Arc;
use tokio::sync::{Notify, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::events::{EngineEvent, EventSink};
use crate::model::Settings;
use crate::stores::SettingsStore;
use crate::traits::{FeedConnector, FeedProgress};

/// Path of the device's live feed endpoint
pub const LIVE_FEED_PATH: &str = "/camera/live_feed";

/// Effective feed URL for `settings`
///
/// In mock mode, or when no API base URL is set, the direct stream URL is
/// used (possibly empty). Otherwise the device's live feed endpoint is used.
/// An empty result means no feed is configured.
pub fn resolve(settings: &Settings) -> String {
    if settings.mock || settings.api_base_url.is_empty() {
        settings.stream_url.clone()
    } else {
        format!(
            "{}{}",
            settings.api_base_url.trim_end_matches('/'),
            LIVE_FEED_PATH
        )
    }
}

/// Stream of resolved feed URLs, starting with the current one
///
/// Yields on every settings commit; consecutive duplicates are not removed.
pub fn resolved_urls(settings: &SettingsStore) -> impl Stream<Item = String> + Send + 'static {
    WatchStream::new(settings.subscribe()).map(|settings| resolve(&settings))
}

/// Keeps one feed connection open to the resolved URL
///
/// Dropping the session tears the connection down.
#[derive(Debug)]
pub struct FeedSession {
    remount: Arc<Notify>,
    url_rx: watch::Receiver<String>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FeedSession {
    /// Start following `settings`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        settings: &SettingsStore,
        connector: Arc<dyn FeedConnector>,
        events: EventSink,
    ) -> Self {
        let remount = Arc::new(Notify::new());
        let (url_tx, url_rx) = watch::channel(String::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_session(
            resolved_urls(settings),
            connector,
            events,
            remount.clone(),
            url_tx,
            shutdown_rx,
        ));

        Self {
            remount,
            url_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// URL the session is currently bound to (empty when not configured)
    pub fn current_url(&self) -> String {
        self.url_rx.borrow().clone()
    }

    /// Observe the URL the session binds to
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.url_rx.clone()
    }

    /// Drop the current connection and open a fresh one to the same URL
    pub fn remount(&self) {
        self.remount.notify_one();
    }

    /// Tear the connection down and wait for the session to exit
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn run_session(
    urls: impl Stream<Item = String> + Send + 'static,
    connector: Arc<dyn FeedConnector>,
    events: EventSink,
    remount: Arc<Notify>,
    url_tx: watch::Sender<String>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    tokio::pin!(urls);
    let mut bound: Option<String> = None;
    let mut connection: Option<JoinHandle<()>> = None;

    loop {
        let (url, forced) = tokio::select! {
            _ = &mut shutdown_rx => break,
            next = urls.next() => match next {
                Some(url) => (url, false),
                None => break,
            },
            _ = remount.notified() => match &bound {
                Some(url) => (url.clone(), true),
                None => continue,
            },
        };

        if !forced && bound.as_deref() == Some(url.as_str()) {
            continue;
        }

        if let Some(old) = connection.take() {
            debug!("Tearing down feed connection");
            old.abort();
        }
        bound = Some(url.clone());
        url_tx.send_replace(url.clone());

        if url.is_empty() {
            info!("No live feed configured");
            events.emit(EngineEvent::FeedNotConfigured);
            continue;
        }

        info!("Connecting live feed via {}: {}", connector.connector_name(), url);
        events.emit(EngineEvent::FeedResolved { url: url.clone() });
        connection = Some(tokio::spawn(connect(connector.clone(), url, events.clone())));
    }

    if let Some(conn) = connection.take() {
        conn.abort();
    }
    debug!("Feed session stopped");
}

async fn connect(connector: Arc<dyn FeedConnector>, url: String, events: EventSink) {
    let progress_events = events.clone();
    let progress_url = url.clone();
    let on_progress = move |progress: FeedProgress| match progress {
        FeedProgress::Connected { .. } => {
            progress_events.emit(EngineEvent::FeedConnected {
                url: progress_url.clone(),
            });
        }
    };

    match connector.run(&url, &on_progress).await {
        Ok(bytes) => info!("Live feed {} ended after {} bytes", url, bytes),
        Err(e) => {
            warn!("Live feed {} failed: {}", url, e);
            events.emit(EngineEvent::FeedFailed {
                url,
                error: e.to_string(),
            });
        }
    }
}
