// # Feed Connector Trait
//
// Defines the interface for holding a live video feed connection open.
//
// The core never decodes video. A connector only opens the resolved URL and
// keeps reading until the stream ends, fails, or the owning task is aborted.
// `crate::feed::FeedSession` owns the connector and decides when to connect.

use async_trait::async_trait;

/// Progress reported by a running feed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedProgress {
    /// The device accepted the request and started streaming
    Connected {
        /// Content type announced by the device, if any
        content_type: Option<String>,
    },
}

/// Trait for live feed connectors
///
/// # Cancellation
///
/// `run` must be cancellation-safe: the session drops the future to tear the
/// connection down when the resolved URL changes.
///
/// # Retries
///
/// Connectors must not retry. A failed connection is reported once and stays
/// down until the session connects again.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    /// Open `url` and read until the stream ends
    ///
    /// `on_progress` is invoked once the stream is established.
    ///
    /// # Returns
    ///
    /// - `Ok(u64)`: The stream ended cleanly after this many bytes
    /// - `Err(Error)`: The feed could not be opened or broke mid-stream
    async fn run(
        &self,
        url: &str,
        on_progress: &(dyn Fn(FeedProgress) + Send + Sync),
    ) -> Result<u64, crate::Error>;

    /// Get the connector name (for logging/debugging)
    fn connector_name(&self) -> &'static str;
}
