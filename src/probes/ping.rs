//! ICMP round-trip probe.
//!
//! Sends a short echo sequence to the configured destination and records
//! average latency, jitter, packet loss and link state. Raw round-trip
//! times are measured in milliseconds; every exported value is converted to
//! seconds (divide by 1000). Jitter is non-negative by contract.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, error};

use super::Probe;
use crate::metrics::Metrics;

/// Echo requests per run. Policy constant, not configurable per call.
const ECHO_COUNT: u16 = 2;

/// Pause between echo requests within one run.
const ECHO_INTERVAL: Duration = Duration::from_millis(500);

/// How long to wait for a single echo reply.
const ECHO_TIMEOUT: Duration = Duration::from_secs(2);

/// Echo payload, standard 56 data bytes.
const ECHO_PAYLOAD: [u8; 56] = [0; 56];

const MS_PER_SEC: f64 = 1000.0;

/// Round-trip statistics for one completed echo sequence, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct PingStats {
    pub avg_rtt_ms: f64,
    pub min_rtt_ms: f64,
    pub max_rtt_ms: f64,
    pub packets_lost: u64,
}

impl PingStats {
    /// Aggregate a non-empty set of round-trip times.
    fn from_rtts(rtts: &[f64], packets_lost: u64) -> Self {
        let sum: f64 = rtts.iter().sum();
        let min = rtts.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = rtts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            avg_rtt_ms: sum / rtts.len() as f64,
            min_rtt_ms: min,
            max_rtt_ms: max,
            packets_lost,
        }
    }
}

/// ICMP echo probe against a single destination host.
pub struct PingProbe {
    dest: String,
    metrics: Arc<Metrics>,
}

impl PingProbe {
    /// Create a ping probe for the given host or IP address.
    pub fn new(dest: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self { dest: dest.into(), metrics }
    }

    /// Resolve the destination to an IP address, consulting DNS only when
    /// it is not already an IP literal.
    async fn resolve(&self) -> anyhow::Result<IpAddr> {
        if let Ok(ip) = self.dest.parse::<IpAddr>() {
            return Ok(ip);
        }
        let mut addrs = tokio::net::lookup_host((self.dest.as_str(), 0))
            .await
            .with_context(|| format!("cannot resolve {}", self.dest))?;
        addrs
            .next()
            .map(|addr| addr.ip())
            .with_context(|| format!("no address found for {}", self.dest))
    }

    /// Send the echo sequence and aggregate round-trip statistics.
    ///
    /// Fails only when nothing useful was measured: resolution failed, the
    /// ICMP socket could not be opened (usually a permission problem), or
    /// every echo in the sequence was lost.
    async fn echo_sequence(&self) -> anyhow::Result<PingStats> {
        let ip = self.resolve().await?;

        let config = match ip {
            IpAddr::V4(_) => surge_ping::Config::default(),
            IpAddr::V6(_) => surge_ping::Config::builder().kind(surge_ping::ICMP::V6).build(),
        };
        let client = surge_ping::Client::new(&config)
            .context("cannot open ICMP socket (missing CAP_NET_RAW?)")?;
        let mut pinger = client
            .pinger(ip, surge_ping::PingIdentifier(rand::random()))
            .await;
        pinger.timeout(ECHO_TIMEOUT);

        let mut rtts = Vec::with_capacity(ECHO_COUNT as usize);
        let mut lost = 0u64;
        for seq in 0..ECHO_COUNT {
            if seq > 0 {
                tokio::time::sleep(ECHO_INTERVAL).await;
            }
            match pinger.ping(surge_ping::PingSequence(seq), &ECHO_PAYLOAD).await {
                Ok((_, rtt)) => rtts.push(rtt.as_secs_f64() * MS_PER_SEC),
                Err(err) => {
                    debug!(dest = %self.dest, seq, %err, "echo request lost");
                    lost += 1;
                }
            }
        }

        if rtts.is_empty() {
            anyhow::bail!("all {} echo requests to {} were lost", ECHO_COUNT, ip);
        }
        Ok(PingStats::from_rtts(&rtts, lost))
    }

    /// Record a completed echo sequence into the registry.
    fn record_stats(&self, stats: &PingStats) {
        debug!(
            dest = %self.dest,
            avg_rtt_ms = stats.avg_rtt_ms,
            min_rtt_ms = stats.min_rtt_ms,
            max_rtt_ms = stats.max_rtt_ms,
            packets_lost = stats.packets_lost,
            "ping completed"
        );
        self.metrics.ping_latency.observe(stats.avg_rtt_ms / MS_PER_SEC);
        self.metrics
            .ping_packet_loss
            .inc_by(stats.packets_lost as f64);
        self.metrics
            .ping_jitter
            .set((stats.max_rtt_ms - stats.min_rtt_ms).abs() / MS_PER_SEC);
        self.metrics.link_up.set(1.0);
    }
}

#[async_trait::async_trait]
impl Probe for PingProbe {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn run(&self) {
        self.metrics.ping_requests.inc();
        match self.echo_sequence().await {
            Ok(stats) => self.record_stats(&stats),
            Err(err) => {
                error!(dest = %self.dest, error = %err, "could not process ICMP echo requests");
                self.record_fault();
            }
        }
    }

    fn record_fault(&self) {
        self.metrics.ping_failures.inc();
        self.metrics.link_up.set(0.0);
    }
}
