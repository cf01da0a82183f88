//! HTTP upload probe.
//!
//! POSTs the fixed scratch payload as a multipart body and records how long
//! the transfer took. On success the size gauge reports the stored payload
//! length, not anything read from the response. The payload is created once
//! during bootstrap and shared read-only between runs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, error};

use super::Probe;
use crate::metrics::Metrics;

/// Upper bound for one full transfer, matching the widest histogram bucket.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(100);

/// HTTP POST probe sending a fixed payload to a single URL.
pub struct UploadProbe {
    url: String,
    payload: Bytes,
    client: reqwest::Client,
    metrics: Arc<Metrics>,
}

impl UploadProbe {
    /// Create an upload probe for the given URL and prepared payload.
    pub fn new(
        url: impl Into<String>,
        payload: Bytes,
        metrics: Arc<Metrics>,
    ) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TRANSFER_TIMEOUT)
            .build()
            .map_err(|e| crate::MonitorError::config_error(format!("http client: {}", e)))?;
        Ok(Self { url: url.into(), payload, client, metrics })
    }

    /// POST the payload as a multipart form, the way the original agent
    /// uploaded its scratch file.
    async fn push(&self) -> anyhow::Result<()> {
        let part = reqwest::multipart::Part::stream(self.payload.clone())
            .file_name("scratch.bin");
        let form = reqwest::multipart::Form::new().part("file", part);

        self.client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("unexpected HTTP status")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Probe for UploadProbe {
    fn name(&self) -> &'static str {
        "upload"
    }

    async fn run(&self) {
        self.metrics.upload_requests.inc();
        let timer = self.metrics.upload_duration.start_timer();
        let outcome = self.push().await;
        timer.observe_duration();

        match outcome {
            Ok(()) => {
                debug!(url = %self.url, bytes = self.payload.len(), "upload completed");
                self.metrics.upload_size.set(self.payload.len() as f64);
            }
            Err(err) => {
                error!(url = %self.url, error = %err, "cannot upload the scratch payload");
                self.metrics.upload_failures.inc();
            }
        }
    }

    fn record_fault(&self) {
        self.metrics.upload_failures.inc();
    }
}
