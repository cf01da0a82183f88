//! Network probe routines.
//!
//! A probe performs one network operation, times it and updates the metric
//! registry. Probes know nothing about scheduling: [`Probe::run`] is
//! infallible from the caller's perspective, because every recognized
//! failure is translated into a failure-counter increment and an error log
//! inside the probe itself.

pub mod download;
pub mod ping;
pub mod upload;

// Re-export commonly used items
pub use download::DownloadProbe;
pub use ping::PingProbe;
pub use upload::UploadProbe;

/// One schedulable unit of measurement work.
#[async_trait::async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Stable job name, used for logging and job identity.
    fn name(&self) -> &'static str;

    /// Execute one measurement and record it. Never fails; network errors
    /// end up in the probe's failure counter.
    async fn run(&self);

    /// Record a run that aborted outside the probe's own error handling
    /// (e.g. a panic caught at the scheduler's per-run boundary).
    fn record_fault(&self);
}
