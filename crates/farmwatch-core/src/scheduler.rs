//! Repeating timers owned by a view
//!
//! [`spawn_poll`] runs a tick immediately and then once per period until the
//! returned [`PollHandle`] is cancelled or dropped. Ticks of one timer never
//! overlap: the next period starts counting only after the previous tick
//! finished. A tick still running at teardown is abandoned.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Cancellation handle for a repeating timer
///
/// Dropping the handle stops the timer at its next await point.
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Timer name (for logging)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the timer loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop the timer and wait for its loop to exit
    pub async fn cancel(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!("Poll timer '{}' panicked", self.name);
                }
            }
        }
        debug!("Poll timer '{}' cancelled", self.name);
    }
}

/// Start a repeating timer
///
/// Must be called from within a tokio runtime.
pub fn spawn_poll<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Poll timer '{}' started ({:?})", name, period);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = tick() => {}
            }
        }

        debug!("Poll timer '{}' stopped", name);
    });

    PollHandle {
        name,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}
