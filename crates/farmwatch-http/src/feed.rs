use async_trait::async_trait;
use farmwatch_core::traits::{FeedConnector, FeedProgress};
use farmwatch_core::{Error, Result};
use std::time::Duration;

/// Live feed connector over plain HTTP
///
/// Only the connection is time-limited; an established stream may run
/// indefinitely.
#[derive(Debug, Clone)]
pub struct HttpFeedConnector {
    client: reqwest::Client,
}

impl HttpFeedConnector {
    pub fn new() -> Self {
        Self::with_connect_timeout(crate::DEFAULT_TIMEOUT)
    }

    pub fn with_connect_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpFeedConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedConnector for HttpFeedConnector {
    async fn run(
        &self,
        url: &str,
        on_progress: &(dyn Fn(FeedProgress) + Send + Sync),
    ) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::feed(format!("Failed to open {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::feed(format!("HTTP error {} from {}", status, url)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        tracing::debug!("Feed {} established ({:?})", url, content_type);
        on_progress(FeedProgress::Connected { content_type });

        let mut total: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::feed(format!("Feed {} broke after {} bytes: {}", url, total, e)))?
        {
            total += chunk.len() as u64;
        }

        Ok(total)
    }

    fn connector_name(&self) -> &'static str {
        "http"
    }
}
