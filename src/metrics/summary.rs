//! Label-free Prometheus summary instrument.
//!
//! The `prometheus` crate ships counters, gauges and histograms but no
//! summary type. Ping latency is exported as a summary (cumulative count and
//! sum of observations, no quantiles, no buckets), so this module implements
//! one as a custom [`Collector`] on top of the same lock-free atomics the
//! crate's own instruments use.

use std::sync::Arc;

use prometheus::core::{Atomic, AtomicF64, AtomicU64, Collector, Desc};
use prometheus::proto;

/// A summary metric: running count and sum of observations.
///
/// Observations are atomic per field; a concurrent scrape may see a count
/// without the matching sum update, which Prometheus tolerates for
/// cumulative metrics. Values never reset for the process lifetime.
#[derive(Clone)]
pub struct Summary {
    core: Arc<SummaryCore>,
}

struct SummaryCore {
    desc: Desc,
    count: AtomicU64,
    sum: AtomicF64,
}

impl Summary {
    /// Create a summary with the given name and help text.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> prometheus::Result<Self> {
        let desc = Desc::new(name.into(), help.into(), Vec::new(), Default::default())?;
        Ok(Self {
            core: Arc::new(SummaryCore {
                desc,
                count: AtomicU64::new(0),
                sum: AtomicF64::new(0.0),
            }),
        })
    }

    /// Record one observation.
    pub fn observe(&self, value: f64) {
        self.core.count.inc_by(1);
        self.core.sum.inc_by(value);
    }

    /// Number of observations recorded so far.
    pub fn get_sample_count(&self) -> u64 {
        self.core.count.get()
    }

    /// Sum of all observations recorded so far.
    pub fn get_sample_sum(&self) -> f64 {
        self.core.sum.get()
    }
}

impl Collector for Summary {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let mut summary = proto::Summary::default();
        summary.set_sample_count(self.core.count.get());
        summary.set_sample_sum(self.core.sum.get());

        let mut metric = proto::Metric::default();
        metric.set_summary(summary);

        let mut family = proto::MetricFamily::default();
        family.set_name(self.core.desc.fq_name.clone());
        family.set_help(self.core.desc.help.clone());
        family.set_field_type(proto::MetricType::SUMMARY);
        family.mut_metric().push(metric);

        vec![family]
    }
}
