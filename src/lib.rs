//! # linkmon - Internet Connection Probe Agent
//!
//! A long-running agent that periodically exercises three network paths -
//! ICMP round-trip, HTTP download, HTTP upload - and exposes the resulting
//! measurements as a pull-based Prometheus metrics feed.
//!
//! ## Features
//!
//! - **ICMP probe**: round-trip latency, jitter, packet loss, link up/down
//! - **HTTP download/upload probes**: transfer duration histograms and sizes
//! - **Independent scheduling**: one timer per job with bounded concurrency,
//!   so a hung probe never starves the others
//! - **Prometheus exporter**: `/metrics` endpoint over the shared registry
//! - **Library + Binary**: use as a crate or standalone application
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use linkmon::{Metrics, PingProbe, JobSpec, Scheduler};
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = Arc::new(Metrics::new()?);
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let mut scheduler = Scheduler::new(shutdown_rx);
//!     scheduler.schedule(
//!         JobSpec::new("ping", Duration::from_secs(60), 5),
//!         Arc::new(PingProbe::new("1.1.1.1", metrics.clone())),
//!     );
//!     scheduler.join().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod payload;
pub mod probes;
pub mod scheduler;
pub mod web;

// Re-export public API
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use metrics::Metrics;
pub use probes::{DownloadProbe, PingProbe, Probe, UploadProbe};
pub use scheduler::{JobSpec, Scheduler};
pub use web::start_web_server;

/// The default exporter bind address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Size of the fixed upload payload in bytes (50 MiB)
pub const UPLOAD_PAYLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Concurrency ceiling applied to jobs that don't set their own
pub const DEFAULT_MAX_INSTANCES: usize = 5;
