//! HTTP download probe.
//!
//! Fetches the configured URL and records how long the whole transfer took.
//! The duration histogram is observed on every exit path: the timer starts
//! before the request and stops after it, so a failed or timed-out transfer
//! still contributes its elapsed time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, error};

use super::Probe;
use crate::metrics::Metrics;

/// Upper bound for one full transfer, matching the widest histogram bucket.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(100);

/// HTTP GET probe against a single URL.
pub struct DownloadProbe {
    url: String,
    client: reqwest::Client,
    metrics: Arc<Metrics>,
}

impl DownloadProbe {
    /// Create a download probe for the given URL.
    pub fn new(url: impl Into<String>, metrics: Arc<Metrics>) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TRANSFER_TIMEOUT)
            .build()
            .map_err(|e| crate::MonitorError::config_error(format!("http client: {}", e)))?;
        Ok(Self { url: url.into(), client, metrics })
    }

    /// Fetch the URL including the full body, returning the byte count.
    ///
    /// Error statuses count as failures; the original agent ignored them,
    /// but a 404 page is not a download measurement.
    async fn fetch(&self) -> anyhow::Result<usize> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("unexpected HTTP status")?;
        let body = response.bytes().await.context("body retrieval failed")?;
        Ok(body.len())
    }
}

#[async_trait::async_trait]
impl Probe for DownloadProbe {
    fn name(&self) -> &'static str {
        "download"
    }

    async fn run(&self) {
        self.metrics.download_requests.inc();
        let timer = self.metrics.download_duration.start_timer();
        let outcome = self.fetch().await;
        timer.observe_duration();

        match outcome {
            Ok(bytes) => {
                debug!(url = %self.url, bytes, "download completed");
                self.metrics.download_size.set(bytes as f64);
            }
            Err(err) => {
                error!(url = %self.url, error = %err, "cannot download the test file");
                self.metrics.download_failures.inc();
            }
        }
    }

    fn record_fault(&self) {
        self.metrics.download_failures.inc();
    }
}
