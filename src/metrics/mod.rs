//! Metric registry and instrument definitions.
//!
//! This module provides the process-wide set of named instruments the
//! probes mutate and the exporter reads: counters, gauges, histograms and
//! a summary, all created once at startup with fixed identities.

pub mod registry;
pub mod summary;

// Re-export commonly used items
pub use registry::{Metrics, DURATION_BUCKETS};
pub use summary::Summary;
