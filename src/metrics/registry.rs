//! Process-wide metric instrument set.
//!
//! Every instrument the probes mutate is created once here and registered
//! against an owned [`Registry`]. Probes receive the whole [`Metrics`]
//! struct behind an `Arc` and update their own instruments; the exporter
//! reads snapshots through [`Metrics::encode`]. Instruments are never
//! removed and values never reset between scrapes.

use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder};

use super::summary::Summary;
use crate::error::Result;

/// Histogram bucket boundaries for transfer durations, in seconds.
pub const DURATION_BUCKETS: &[f64] = &[1.0, 2.0, 5.0, 7.0, 10.0, 15.0, 20.0, 50.0, 100.0];

/// Collection of all linkmon instruments.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // ========== Ping ==========
    pub ping_requests: Counter,
    pub ping_failures: Counter,
    pub ping_packet_loss: Counter,
    pub ping_jitter: Gauge,
    pub ping_latency: Summary,
    pub link_up: Gauge,

    // ========== Download ==========
    pub download_requests: Counter,
    pub download_failures: Counter,
    pub download_duration: Histogram,
    pub download_size: Gauge,

    // ========== Upload ==========
    pub upload_requests: Counter,
    pub upload_failures: Counter,
    pub upload_duration: Histogram,
    pub upload_size: Gauge,
}

impl Metrics {
    /// Create all instruments and register them with a fresh registry.
    ///
    /// The registry is owned, so tests get isolated metric state by simply
    /// constructing a new `Metrics` per case.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        // ========== Ping ==========
        let ping_requests = Counter::new(
            "linkmon_ping_requests_total",
            "Total ping probe runs",
        )?;
        let ping_failures = Counter::new(
            "linkmon_ping_failures_total",
            "Total ping probe runs that failed",
        )?;
        let ping_packet_loss = Counter::new(
            "linkmon_ping_packet_loss_total",
            "Packets lost while measuring latency",
        )?;
        let ping_jitter = Gauge::new(
            "linkmon_ping_jitter_seconds",
            "ICMP jitter (max rtt minus min rtt) of the last run",
        )?;
        let ping_latency = Summary::new(
            "linkmon_ping_latency_seconds",
            "Average ICMP round-trip time per run",
        )?;
        let link_up = Gauge::new(
            "linkmon_link_up",
            "Whether the last ping probe reached its destination (0 or 1)",
        )?;

        // ========== Download ==========
        let download_requests = Counter::new(
            "linkmon_download_total",
            "Number of times the download job ran",
        )?;
        let download_failures = Counter::new(
            "linkmon_download_failures_total",
            "Number of times the download job failed",
        )?;
        let download_duration = Histogram::with_opts(
            HistogramOpts::new(
                "linkmon_download_duration_seconds",
                "Time spent downloading the test file",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
        )?;
        let download_size = Gauge::new(
            "linkmon_download_size_bytes",
            "Bytes retrieved by the last successful download",
        )?;

        // ========== Upload ==========
        let upload_requests = Counter::new(
            "linkmon_upload_total",
            "Number of times the upload job ran",
        )?;
        let upload_failures = Counter::new(
            "linkmon_upload_failures_total",
            "Number of times the upload job failed",
        )?;
        let upload_duration = Histogram::with_opts(
            HistogramOpts::new(
                "linkmon_upload_duration_seconds",
                "Time spent uploading the scratch payload",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
        )?;
        let upload_size = Gauge::new(
            "linkmon_upload_size_bytes",
            "Bytes sent by the last successful upload",
        )?;

        registry.register(Box::new(ping_requests.clone()))?;
        registry.register(Box::new(ping_failures.clone()))?;
        registry.register(Box::new(ping_packet_loss.clone()))?;
        registry.register(Box::new(ping_jitter.clone()))?;
        registry.register(Box::new(ping_latency.clone()))?;
        registry.register(Box::new(link_up.clone()))?;
        registry.register(Box::new(download_requests.clone()))?;
        registry.register(Box::new(download_failures.clone()))?;
        registry.register(Box::new(download_duration.clone()))?;
        registry.register(Box::new(download_size.clone()))?;
        registry.register(Box::new(upload_requests.clone()))?;
        registry.register(Box::new(upload_failures.clone()))?;
        registry.register(Box::new(upload_duration.clone()))?;
        registry.register(Box::new(upload_size.clone()))?;

        Ok(Self {
            registry,
            ping_requests,
            ping_failures,
            ping_packet_loss,
            ping_jitter,
            ping_latency,
            link_up,
            download_requests,
            download_failures,
            download_duration,
            download_size,
            upload_requests,
            upload_failures,
            upload_duration,
            upload_size,
        })
    }

    /// The registry backing all instruments.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the current state of every instrument in the Prometheus text
    /// exposition format. Reading never blocks probe updates.
    pub fn encode(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| {
            crate::error::MonitorError::web_server_error(format!(
                "metrics are not valid UTF-8: {}",
                e
            ))
        })
    }
}
